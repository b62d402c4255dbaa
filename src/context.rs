use std::path::{Path, PathBuf};

use crate::platform::Platform;

/// Environment override for the pdkit repository root (templates + demos).
pub const HOME_ENV: &str = "PDKIT_HOME";

/// Everything an operation needs to know about the host, resolved once at
/// process start and passed explicitly to every handler.
#[derive(Clone, Debug)]
pub struct ToolContext {
    pub platform: Platform,
    pub sdk_root: PathBuf,
    pub repo_root: PathBuf,
}

impl ToolContext {
    /// Builds the context from the host environment.
    pub fn from_env() -> Self {
        let platform = Platform::detect();
        let sdk_root = platform.sdk_root();
        let repo_root = resolve_repo_root();
        ToolContext {
            platform,
            sdk_root,
            repo_root,
        }
    }

    /// Builds a context with explicit roots. Used by tests and by callers
    /// that already resolved their paths.
    pub fn with_roots(platform: Platform, sdk_root: PathBuf, repo_root: PathBuf) -> Self {
        ToolContext {
            platform,
            sdk_root,
            repo_root,
        }
    }

    pub fn compiler_bin(&self) -> PathBuf {
        self.platform.compiler_path(&self.sdk_root)
    }

    pub fn simulator_bin(&self) -> PathBuf {
        self.platform.simulator_path(&self.sdk_root)
    }

    pub fn device_util_bin(&self) -> PathBuf {
        self.platform.device_util_path(&self.sdk_root)
    }

    pub fn templates_root(&self) -> PathBuf {
        self.repo_root.join("templates")
    }

    pub fn demos_root(&self) -> PathBuf {
        self.repo_root.join("demos")
    }
}

fn resolve_repo_root() -> PathBuf {
    if let Ok(path) = std::env::var(HOME_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(crate::util::expand_tilde(&path));
        }
    }
    // Templates and demos ship with the repository checkout, not with
    // the SDK, so fall back to the build-time manifest directory.
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// The bundle path a project builds into unless the caller says otherwise.
pub fn default_bundle_path(project_dir: &Path) -> PathBuf {
    project_dir.join("output.pdx")
}
