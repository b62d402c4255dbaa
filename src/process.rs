use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

use tokio::process::Command;

/// How a wrapped invocation ended. A deadline expiry is its own outcome,
/// distinct from a nonzero exit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecStatus {
    Exited(i32),
    TimedOut,
    FailedToStart,
}

/// Captured output of one external-program invocation. The wrapper always
/// resolves: start failures and timeouts are reported through `status`,
/// never as an error the caller must catch.
#[derive(Clone, Debug)]
pub struct ExecResult {
    pub status: ExecStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.status == ExecStatus::Exited(0)
    }

    /// Exit code as an integer; non-exit outcomes map to -1.
    pub fn exit_code(&self) -> i32 {
        match self.status {
            ExecStatus::Exited(code) => code,
            ExecStatus::TimedOut | ExecStatus::FailedToStart => -1,
        }
    }

    /// Stdout followed by stderr, as fed to the diagnostic parser.
    pub fn combined_output(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        out
    }
}

/// Runs an external program and collects its output and exit status.
///
/// One invocation is one attempt: no retries. With `deadline == None` the
/// call waits as long as the child runs; callers that need bounded latency
/// pass a deadline and receive `ExecStatus::TimedOut` (the child is killed
/// when the wait future is dropped).
pub async fn run<P, I, A>(
    program: P,
    args: I,
    cwd: Option<&Path>,
    deadline: Option<Duration>,
) -> ExecResult
where
    P: AsRef<OsStr>,
    I: IntoIterator<Item = A>,
    A: AsRef<OsStr>,
{
    let mut cmd = Command::new(&program);
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    #[cfg(target_os = "windows")]
    cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            return ExecResult {
                status: ExecStatus::FailedToStart,
                stdout: String::new(),
                stderr: format!(
                    "Failed to start {}: {e}",
                    program.as_ref().to_string_lossy()
                ),
            };
        }
    };

    let output = match deadline {
        Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(result) => result,
            Err(_) => {
                return ExecResult {
                    status: ExecStatus::TimedOut,
                    stdout: String::new(),
                    stderr: format!(
                        "{} did not finish within {limit:?}",
                        program.as_ref().to_string_lossy()
                    ),
                };
            }
        },
        None => child.wait_with_output().await,
    };

    match output {
        Ok(output) => ExecResult {
            status: ExecStatus::Exited(output.status.code().unwrap_or(-1)),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        },
        Err(e) => ExecResult {
            status: ExecStatus::FailedToStart,
            stdout: String::new(),
            stderr: format!("Failed to wait on {}: {e}", program.as_ref().to_string_lossy()),
        },
    }
}

/// Probes whether a tool responds to `--version`. Best-effort: any failure
/// means "not available".
pub async fn tool_version(program: &Path) -> Option<String> {
    let result = run(program, ["--version"], None, Some(Duration::from_secs(10))).await;
    if result.success() {
        let version = result.stdout.trim().to_string();
        if version.is_empty() {
            Some(result.stderr.trim().to_string())
        } else {
            Some(version)
        }
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_captures_stdout() {
        let result = run("echo", ["hello"], None, None).await;
        assert_eq!(result.status, ExecStatus::Exited(0));
        assert!(result.success());
        assert!(result.stdout.contains("hello"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_nonzero_exit() {
        let result = run("false", Vec::<&str>::new(), None, None).await;
        assert_eq!(result.status, ExecStatus::Exited(1));
        assert!(!result.success());
        assert_eq!(result.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let result = run(
            "definitely-not-a-real-binary-7f3a",
            Vec::<&str>::new(),
            None,
            None,
        )
        .await;
        assert_eq!(result.status, ExecStatus::FailedToStart);
        assert!(!result.stderr.is_empty());
        assert_eq!(result.exit_code(), -1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_deadline_expires() {
        let result = run(
            "sleep",
            ["5"],
            None,
            Some(Duration::from_millis(100)),
        )
        .await;
        assert_eq!(result.status, ExecStatus::TimedOut);
        assert!(!result.success());
    }

    #[test]
    fn test_combined_output_joins_streams() {
        let result = ExecResult {
            status: ExecStatus::Exited(1),
            stdout: "main.lua:3: warning: unused".to_string(),
            stderr: "main.lua:9: bad argument".to_string(),
        };
        let combined = result.combined_output();
        assert!(combined.contains("unused"));
        assert!(combined.contains("bad argument"));
        assert!(combined.lines().count() >= 2);
    }
}
