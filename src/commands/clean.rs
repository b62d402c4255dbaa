use std::path::PathBuf;

use serde::Serialize;

use crate::context::default_bundle_path;
use crate::error::Result;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanResult {
    pub removed: Vec<String>,
}

/// Removes the compiled bundle from a project directory. Nothing to
/// remove is a success, not an error.
pub fn clean(project_dir: Option<PathBuf>) -> Result<CleanResult> {
    let project_dir = match project_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let mut removed = Vec::new();
    let bundle = default_bundle_path(&project_dir);
    if bundle.is_dir() {
        std::fs::remove_dir_all(&bundle)?;
        removed.push(bundle.to_string_lossy().to_string());
    }

    Ok(CleanResult { removed })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_removes_bundle() {
        let project = tempfile::tempdir().unwrap();
        let bundle = project.path().join("output.pdx");
        std::fs::create_dir_all(bundle.join("images")).unwrap();

        let result = clean(Some(project.path().to_path_buf())).unwrap();
        assert_eq!(result.removed.len(), 1);
        assert!(!bundle.exists());
    }

    #[test]
    fn test_clean_with_nothing_to_remove() {
        let project = tempfile::tempdir().unwrap();
        let result = clean(Some(project.path().to_path_buf())).unwrap();
        assert!(result.removed.is_empty());
    }
}
