use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::context::ToolContext;
use crate::error::Result;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInfo {
    pub name: String,
    pub description: String,
    pub path: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleInfo {
    pub name: String,
    pub path: String,
    pub built: bool,
}

/// Enumerates the project templates shipped with the repository.
///
/// A template's description comes from the marker comment at the top of
/// its entry script; absence yields an empty string, never an error.
pub fn list_templates(ctx: &ToolContext) -> Result<Vec<TemplateInfo>> {
    let mut templates = Vec::new();
    for dir in subdirectories(&ctx.templates_root())? {
        let description = entry_script(&dir)
            .and_then(|script| std::fs::read_to_string(script).ok())
            .map(|text| description_from_source(&text))
            .unwrap_or_default();
        templates.push(TemplateInfo {
            name: dir_name(&dir),
            description,
            path: dir.to_string_lossy().to_string(),
        });
    }
    Ok(templates)
}

/// Enumerates the example projects, reporting whether each has a
/// previously compiled bundle next to its source.
pub fn list_examples(ctx: &ToolContext) -> Result<Vec<ExampleInfo>> {
    let mut examples = Vec::new();
    for dir in subdirectories(&ctx.demos_root())? {
        examples.push(ExampleInfo {
            name: dir_name(&dir),
            built: dir.join("output.pdx").is_dir(),
            path: dir.to_string_lossy().to_string(),
        });
    }
    Ok(examples)
}

/// Immediate subdirectories, sorted by name so listings are stable.
/// A missing root degrades to an empty listing.
fn subdirectories(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(root)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn entry_script(template_dir: &Path) -> Option<PathBuf> {
    ["source/main.lua", "Source/main.lua", "src/main.lua", "main.lua"]
        .iter()
        .map(|rel| template_dir.join(rel))
        .find(|candidate| candidate.is_file())
}

/// Scans the leading comment block of an entry script for the
/// `-- Description:` marker.
fn description_from_source(text: &str) -> String {
    for line in text.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with("--") {
            break; // only the leading comment block counts
        }
        let comment = trimmed.trim_start_matches('-').trim();
        let lower = comment.to_lowercase();
        if let Some(rest) = lower.strip_prefix("description:") {
            let offset = comment.len() - rest.len();
            return comment[offset..].trim().to_string();
        }
    }
    String::new()
}
