use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::context::{default_bundle_path, ToolContext};
use crate::diagnostics::{self, Diagnostic};
use crate::process;

/// Conventional source-directory names, tried in order.
pub const SOURCE_DIR_CANDIDATES: [&str; 3] = ["source", "Source", "src"];

/// Inputs of one build invocation. Everything is optional; defaults
/// follow the project-directory conventions.
#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    pub project_dir: Option<PathBuf>,
    pub source_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// Outcome of one build invocation. Always a complete value: precondition
/// failures become a single synthetic diagnostic, never an error the
/// caller has to catch.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    pub success: bool,
    pub output_path: String,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    /// Raw compiler output, kept off the wire. The CLI falls back to it
    /// when a failed build yields no parseable diagnostics.
    #[serde(skip)]
    pub raw_output: String,
}

impl BuildResult {
    fn precondition_failure(message: impl Into<String>) -> Self {
        BuildResult {
            success: false,
            output_path: String::new(),
            errors: vec![Diagnostic::synthetic(message)],
            warnings: Vec::new(),
            raw_output: String::new(),
        }
    }
}

/// Finds the first conventional source directory under the project.
pub fn find_source_dir(project_dir: &Path) -> Option<PathBuf> {
    SOURCE_DIR_CANDIDATES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|candidate| candidate.is_dir())
}

/// Compiles a project with the vendor compiler and parses its output.
///
/// Success is defined solely by the compiler's exit code; parsed
/// diagnostics are an independent signal and both are surfaced as-is.
pub async fn build(ctx: &ToolContext, opts: BuildOptions) -> BuildResult {
    let project_dir = match opts.project_dir {
        Some(dir) => dir,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                return BuildResult::precondition_failure(format!(
                    "Cannot resolve current directory: {e}"
                ))
            }
        },
    };

    let source_dir = match opts.source_dir {
        Some(dir) => dir,
        None => match find_source_dir(&project_dir) {
            Some(dir) => dir,
            None => {
                return BuildResult::precondition_failure(format!(
                    "No source directory found in {} (expected one of: {})",
                    project_dir.display(),
                    SOURCE_DIR_CANDIDATES.join(", ")
                ));
            }
        },
    };

    let compiler = ctx.compiler_bin();
    if !compiler.exists() {
        return BuildResult::precondition_failure(format!(
            "Playdate compiler not found at {} — run `pdkit setup` or set PLAYDATE_SDK_PATH",
            compiler.display()
        ));
    }

    let output_path = opts
        .output
        .unwrap_or_else(|| default_bundle_path(&project_dir));

    debug!(
        compiler = %compiler.display(),
        source = %source_dir.display(),
        output = %output_path.display(),
        "invoking pdc"
    );

    let result = process::run(
        &compiler,
        [source_dir.as_os_str(), output_path.as_os_str()],
        Some(&project_dir),
        None,
    )
    .await;

    let raw_output = result.combined_output();
    let parsed = diagnostics::parse_output(&raw_output);
    let success = result.success();

    BuildResult {
        success,
        output_path: if success {
            output_path.to_string_lossy().to_string()
        } else {
            String::new()
        },
        errors: parsed.errors,
        warnings: parsed.warnings,
        raw_output,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{OsFamily, Platform};

    fn test_platform() -> Platform {
        Platform {
            os: OsFamily::Linux,
            arch: "x86_64",
            distro: None,
        }
    }

    #[tokio::test]
    async fn test_missing_source_dir_is_synthetic_failure() {
        let project = tempfile::tempdir().unwrap();
        let sdk = tempfile::tempdir().unwrap();
        let ctx = ToolContext::with_roots(
            test_platform(),
            sdk.path().to_path_buf(),
            sdk.path().to_path_buf(),
        );

        let result = build(
            &ctx,
            BuildOptions {
                project_dir: Some(project.path().to_path_buf()),
                ..Default::default()
            },
        )
        .await;

        assert!(!result.success);
        assert!(result.output_path.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].file, "");
        assert_eq!(result.errors[0].line, 0);
        assert!(result.errors[0].message.contains("No source directory"));
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_missing_compiler_is_synthetic_failure() {
        let project = tempfile::tempdir().unwrap();
        std::fs::create_dir(project.path().join("source")).unwrap();
        let sdk = tempfile::tempdir().unwrap();
        let ctx = ToolContext::with_roots(
            test_platform(),
            sdk.path().join("PlaydateSDK"),
            sdk.path().to_path_buf(),
        );

        let result = build(
            &ctx,
            BuildOptions {
                project_dir: Some(project.path().to_path_buf()),
                ..Default::default()
            },
        )
        .await;

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("compiler not found"));
    }

    #[test]
    fn test_source_dir_candidates_in_order() {
        let project = tempfile::tempdir().unwrap();
        std::fs::create_dir(project.path().join("src")).unwrap();
        assert_eq!(
            find_source_dir(project.path()).unwrap(),
            project.path().join("src")
        );

        // `source` takes precedence once it exists
        std::fs::create_dir(project.path().join("source")).unwrap();
        assert_eq!(
            find_source_dir(project.path()).unwrap(),
            project.path().join("source")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_with_stub_compiler() {
        use std::os::unix::fs::PermissionsExt;

        let project = tempfile::tempdir().unwrap();
        std::fs::create_dir(project.path().join("source")).unwrap();

        // Stub pdc: prints one warning-shaped line and succeeds
        let sdk = tempfile::tempdir().unwrap();
        let bin = sdk.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let pdc = bin.join("pdc");
        std::fs::write(
            &pdc,
            "#!/bin/sh\necho \"main.lua:5: warning: unused variable\"\nexit 0\n",
        )
        .unwrap();
        std::fs::set_permissions(&pdc, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ctx = ToolContext::with_roots(
            test_platform(),
            sdk.path().to_path_buf(),
            sdk.path().to_path_buf(),
        );

        let result = build(
            &ctx,
            BuildOptions {
                project_dir: Some(project.path().to_path_buf()),
                ..Default::default()
            },
        )
        .await;

        assert!(result.success);
        assert!(result.output_path.ends_with("output.pdx"));
        assert!(result.errors.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].file, "main.lua");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_quiet_build_has_no_diagnostics() {
        use std::os::unix::fs::PermissionsExt;

        let project = tempfile::tempdir().unwrap();
        std::fs::create_dir(project.path().join("source")).unwrap();

        let sdk = tempfile::tempdir().unwrap();
        let bin = sdk.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let pdc = bin.join("pdc");
        std::fs::write(&pdc, "#!/bin/sh\necho 'Compiling 1 file'\nexit 0\n").unwrap();
        std::fs::set_permissions(&pdc, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ctx = ToolContext::with_roots(
            test_platform(),
            sdk.path().to_path_buf(),
            sdk.path().to_path_buf(),
        );

        let result = build(
            &ctx,
            BuildOptions {
                project_dir: Some(project.path().to_path_buf()),
                ..Default::default()
            },
        )
        .await;

        assert!(result.success);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_build_keeps_parsed_errors() {
        use std::os::unix::fs::PermissionsExt;

        let project = tempfile::tempdir().unwrap();
        std::fs::create_dir(project.path().join("Source")).unwrap();

        let sdk = tempfile::tempdir().unwrap();
        let bin = sdk.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let pdc = bin.join("pdc");
        std::fs::write(
            &pdc,
            "#!/bin/sh\necho \"source/main.lua:2: unexpected symbol near '='\" 1>&2\nexit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&pdc, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ctx = ToolContext::with_roots(
            test_platform(),
            sdk.path().to_path_buf(),
            sdk.path().to_path_buf(),
        );

        let result = build(
            &ctx,
            BuildOptions {
                project_dir: Some(project.path().to_path_buf()),
                ..Default::default()
            },
        )
        .await;

        assert!(!result.success);
        assert!(result.output_path.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].file, "source/main.lua");
        assert_eq!(result.errors[0].line, 2);
    }
}
