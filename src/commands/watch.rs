use std::collections::hash_map::DefaultHasher;
use std::ffi::OsString;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::commands::build::{self, BuildOptions, BuildResult};
use crate::context::ToolContext;
use crate::error::{Result, ToolError};
use crate::platform::OsFamily;
use crate::process::{self, ExecStatus};

/// Poll cadence used when no native notifier is available.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A blocking "tell me when something changed" strategy. Two
/// implementations exist (native-notification-backed and poll-backed)
/// and the rebuild loop is identical regardless of which is selected.
#[async_trait]
pub trait WatchBackend: Send {
    /// Human-readable backend name for status output.
    fn describe(&self) -> String;

    /// Resolves once, after the next observed change under the watched
    /// directory.
    async fn wait_for_change(&mut self) -> Result<()>;
}

/// Shells out to a one-shot native notifier (`fswatch -1`,
/// `inotifywait`) and waits for it to exit.
pub struct NativeWatcher {
    program: &'static str,
    args: Vec<OsString>,
}

impl NativeWatcher {
    fn fswatch(dir: &Path) -> Self {
        NativeWatcher {
            program: "fswatch",
            args: vec![
                OsString::from("-1"),
                OsString::from("-r"),
                dir.as_os_str().to_os_string(),
            ],
        }
    }

    fn inotifywait(dir: &Path) -> Self {
        NativeWatcher {
            program: "inotifywait",
            args: vec![
                OsString::from("-r"),
                OsString::from("-qq"),
                OsString::from("-e"),
                OsString::from("modify,create,delete,move"),
                dir.as_os_str().to_os_string(),
            ],
        }
    }
}

#[async_trait]
impl WatchBackend for NativeWatcher {
    fn describe(&self) -> String {
        self.program.to_string()
    }

    async fn wait_for_change(&mut self) -> Result<()> {
        let result = process::run(self.program, &self.args, None, None).await;
        if result.status == ExecStatus::FailedToStart {
            return Err(ToolError::Custom(format!(
                "{} is no longer available: {}",
                self.program,
                result.stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Fixed-interval fallback: fingerprints the directory tree (path, mtime,
/// size) and resolves when the fingerprint moves.
pub struct PollWatcher {
    dir: PathBuf,
    interval: Duration,
    last: u64,
}

impl PollWatcher {
    pub fn new(dir: PathBuf, interval: Duration) -> Self {
        let last = fingerprint(&dir);
        PollWatcher {
            dir,
            interval,
            last,
        }
    }
}

#[async_trait]
impl WatchBackend for PollWatcher {
    fn describe(&self) -> String {
        format!("poll ({:?})", self.interval)
    }

    async fn wait_for_change(&mut self) -> Result<()> {
        loop {
            tokio::time::sleep(self.interval).await;
            let current = fingerprint(&self.dir);
            if current != self.last {
                self.last = current;
                return Ok(());
            }
        }
    }
}

/// Content hash of a directory tree: every file's path, mtime and size.
fn fingerprint(dir: &Path) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_dir(dir, &mut hasher);
    hasher.finish()
}

fn hash_dir(dir: &Path, hasher: &mut DefaultHasher) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
    paths.sort();
    for path in paths {
        path.hash(hasher);
        if path.is_dir() {
            hash_dir(&path, hasher);
        } else if let Ok(meta) = std::fs::metadata(&path) {
            meta.len().hash(hasher);
            if let Ok(modified) = meta.modified() {
                modified.hash(hasher);
            }
        }
    }
}

/// Picks the watch backend for this host: a native notifier when one is
/// installed, the poll fallback otherwise (always on Windows/unknown,
/// which ship no notifier binary).
pub async fn select_backend(
    ctx: &ToolContext,
    dir: &Path,
    force_poll: bool,
    interval: Duration,
) -> Box<dyn WatchBackend> {
    if force_poll {
        return Box::new(PollWatcher::new(dir.to_path_buf(), interval));
    }
    match ctx.platform.os {
        OsFamily::MacOs => {
            if binary_responds("fswatch").await {
                return Box::new(NativeWatcher::fswatch(dir));
            }
        }
        OsFamily::Linux | OsFamily::Wsl => {
            if binary_responds("inotifywait").await {
                return Box::new(NativeWatcher::inotifywait(dir));
            }
        }
        // No notifier binary ships for these hosts
        OsFamily::Windows | OsFamily::Unknown => {}
    }
    Box::new(PollWatcher::new(dir.to_path_buf(), interval))
}

/// Whether a watcher binary can be started at all. Its exit code does
/// not matter; only a spawn failure means "not installed".
pub async fn binary_responds(name: &str) -> bool {
    let result = process::run(name, ["--help"], None, Some(Duration::from_secs(10))).await;
    result.status != ExecStatus::FailedToStart
}

#[derive(Clone, Debug, Default)]
pub struct WatchOptions {
    pub project_dir: Option<PathBuf>,
    pub force_poll: bool,
    pub poll_interval: Option<Duration>,
}

/// Builds once, then rebuilds after every observed change until the
/// process is terminated. Rapid successive changes are not coalesced;
/// each detected change triggers one synchronous rebuild.
pub async fn watch(
    ctx: &ToolContext,
    opts: WatchOptions,
    mut on_build: impl FnMut(&BuildResult) + Send,
) -> Result<()> {
    let project_dir = match opts.project_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let source_dir = build::find_source_dir(&project_dir).ok_or_else(|| {
        ToolError::Custom(format!(
            "No source directory found in {}",
            project_dir.display()
        ))
    })?;

    let interval = opts.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL);
    let mut backend = select_backend(ctx, &source_dir, opts.force_poll, interval).await;
    info!(backend = %backend.describe(), dir = %source_dir.display(), "watching for changes");

    let build_opts = || BuildOptions {
        project_dir: Some(project_dir.clone()),
        source_dir: Some(source_dir.clone()),
        output: None,
    };

    let result = build::build(ctx, build_opts()).await;
    on_build(&result);

    loop {
        backend.wait_for_change().await?;
        debug!("change detected, rebuilding");
        let result = build::build(ctx, build_opts()).await;
        on_build(&result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_tracks_content_changes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.lua"), "print(1)").unwrap();
        let before = fingerprint(dir.path());

        std::fs::write(dir.path().join("main.lua"), "print(1234)").unwrap();
        let after = fingerprint(dir.path());
        assert_ne!(before, after);

        // New files change the fingerprint too
        std::fs::write(dir.path().join("extra.lua"), "").unwrap();
        assert_ne!(after, fingerprint(dir.path()));
    }

    #[test]
    fn test_fingerprint_stable_without_changes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.lua"), "print(1)").unwrap();
        assert_eq!(fingerprint(dir.path()), fingerprint(dir.path()));
    }

    #[tokio::test]
    async fn test_poll_watcher_sees_change() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.lua"), "a").unwrap();

        let mut watcher =
            PollWatcher::new(dir.path().to_path_buf(), Duration::from_millis(25));

        let path = dir.path().join("main.lua");
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(80)).await;
            std::fs::write(path, "changed").unwrap();
        });

        tokio::time::timeout(Duration::from_secs(5), watcher.wait_for_change())
            .await
            .expect("poll watcher never resolved")
            .unwrap();
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_watcher_binary_not_available() {
        assert!(!binary_responds("definitely-not-a-watcher-3b1c").await);
    }
}
