use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::context::ToolContext;
use crate::error::{Result, ToolError};

/// Exact-case placeholder replaced with the human-readable project name.
const NAME_TOKEN: &str = "NewProject";
/// Lowercase placeholder replaced with the sanitized bundle identifier.
const ID_TOKEN: &str = "newproject";

/// The default template used when the caller names none.
pub const DEFAULT_TEMPLATE: &str = "basic";

#[derive(Clone, Debug)]
pub struct CreateOptions {
    pub name: String,
    pub template: Option<String>,
    pub dest_parent: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResult {
    pub name: String,
    pub template: String,
    pub path: String,
}

/// Scaffolds a new project by copying a template tree and stamping the
/// project name into its metadata file.
///
/// Preconditions, checked in order: the destination must not exist, and
/// the named template must. Creating the same project twice fails the
/// second call without touching the existing directory.
pub fn create_project(ctx: &ToolContext, opts: CreateOptions) -> Result<CreateResult> {
    let template = opts
        .template
        .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());
    let dest_parent = match opts.dest_parent {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let destination = dest_parent.join(&opts.name);
    if destination.exists() {
        return Err(ToolError::Custom(format!(
            "Destination already exists: {}",
            destination.display()
        )));
    }

    let template_dir = ctx.templates_root().join(&template);
    if !template_dir.is_dir() {
        return Err(ToolError::Custom(format!(
            "Template '{template}' not found under {}",
            ctx.templates_root().display()
        )));
    }

    debug!(template = %template_dir.display(), dest = %destination.display(), "copying template");
    copy_dir_recursive(&template_dir, &destination)?;

    if let Some(pdxinfo) = find_pdxinfo(&destination) {
        let content = std::fs::read_to_string(&pdxinfo)?;
        let stamped = apply_placeholders(&content, &opts.name);
        std::fs::write(&pdxinfo, stamped)?;
    }

    Ok(CreateResult {
        name: opts.name,
        template,
        path: destination.to_string_lossy().to_string(),
    })
}

/// Lowercases the project name and strips every character outside
/// `[a-z0-9]`, producing the bundle-identifier fragment.
pub fn sanitize_identifier(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Two-pass substitution: the human-readable name first, the machine
/// identifier second. The tokens are distinct so neither pass corrupts
/// the other.
fn apply_placeholders(pdxinfo: &str, project_name: &str) -> String {
    pdxinfo
        .replace(NAME_TOKEN, project_name)
        .replace(ID_TOKEN, &sanitize_identifier(project_name))
}

/// The metadata file lives next to the entry script inside the source
/// directory; older templates kept it at the project root.
fn find_pdxinfo(project_dir: &Path) -> Option<PathBuf> {
    ["source/pdxinfo", "Source/pdxinfo", "src/pdxinfo", "pdxinfo"]
        .iter()
        .map(|rel| project_dir.join(rel))
        .find(|candidate| candidate.is_file())
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        if from.is_dir() {
            copy_dir_recursive(&from, &to)?;
        } else {
            std::fs::copy(&from, &to)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{OsFamily, Platform};

    fn fixture_ctx(repo_root: &Path) -> ToolContext {
        ToolContext::with_roots(
            Platform {
                os: OsFamily::Linux,
                arch: "x86_64",
                distro: None,
            },
            repo_root.join("sdk"),
            repo_root.to_path_buf(),
        )
    }

    fn write_basic_template(repo_root: &Path) {
        let source = repo_root.join("templates").join("basic").join("source");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(
            source.join("main.lua"),
            "-- Description: Minimal game loop\nimport \"CoreLibs/graphics\"\n",
        )
        .unwrap();
        std::fs::write(
            source.join("pdxinfo"),
            "name=NewProject\nauthor=Your Name\ndescription=A new Playdate game\n\
             bundleID=com.example.newproject\nversion=1.0\nbuildNumber=1\nimagePath=\n",
        )
        .unwrap();
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("Zed!!"), "zed");
        assert_eq!(sanitize_identifier("Space Cadet 2"), "spacecadet2");
        assert_eq!(sanitize_identifier("!!!"), "");
    }

    #[test]
    fn test_two_pass_substitution() {
        let template = "name=NewProject\nbundleID=com.example.newproject\n";
        let stamped = apply_placeholders(template, "Foo");
        assert!(stamped.contains("name=Foo\n"));
        assert!(stamped.contains("bundleID=com.example.foo\n"));
        assert!(!stamped.contains(NAME_TOKEN));
        assert!(!stamped.contains(ID_TOKEN));
    }

    #[test]
    fn test_create_stamps_metadata() {
        let root = tempfile::tempdir().unwrap();
        write_basic_template(root.path());
        let ctx = fixture_ctx(root.path());

        let result = create_project(
            &ctx,
            CreateOptions {
                name: "Zed!!".to_string(),
                template: None,
                dest_parent: Some(root.path().join("projects")),
            },
        )
        .unwrap();

        let pdxinfo =
            std::fs::read_to_string(Path::new(&result.path).join("source").join("pdxinfo"))
                .unwrap();
        assert!(pdxinfo.contains("name=Zed!!\n"));
        assert!(pdxinfo.contains("bundleID=com.example.zed\n"));
    }

    #[test]
    fn test_create_rejects_collision() {
        let root = tempfile::tempdir().unwrap();
        write_basic_template(root.path());
        let ctx = fixture_ctx(root.path());
        let parent = root.path().join("projects");

        let opts = || CreateOptions {
            name: "Pong".to_string(),
            template: None,
            dest_parent: Some(parent.clone()),
        };
        create_project(&ctx, opts()).unwrap();

        // Second call fails and leaves the first project untouched
        let marker = parent.join("Pong").join("marker");
        std::fs::write(&marker, "untouched").unwrap();
        let err = create_project(&ctx, opts()).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(std::fs::read_to_string(&marker).unwrap(), "untouched");
    }

    #[test]
    fn test_create_unknown_template() {
        let root = tempfile::tempdir().unwrap();
        write_basic_template(root.path());
        let ctx = fixture_ctx(root.path());

        let err = create_project(
            &ctx,
            CreateOptions {
                name: "Pong".to_string(),
                template: Some("crank-hero".to_string()),
                dest_parent: Some(root.path().join("projects")),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
