use std::path::PathBuf;
use std::process::Stdio;

use serde::Serialize;
use tracing::debug;

use crate::context::{default_bundle_path, ToolContext};
use crate::error::{Result, ToolError};
use crate::platform::OsFamily;
use crate::process;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchResult {
    pub bundle: String,
    pub simulator: String,
}

/// Opens a compiled bundle in the Playdate Simulator.
///
/// Launch success is judged from the platform launcher alone; there is
/// no confirmation that the simulator finished starting.
pub async fn run_bundle(ctx: &ToolContext, bundle: Option<PathBuf>) -> Result<LaunchResult> {
    let bundle = match bundle {
        Some(path) => path,
        None => default_bundle_path(&std::env::current_dir()?),
    };
    if !bundle.exists() {
        return Err(ToolError::Custom(format!(
            "Bundle not found: {} — run `pdkit build` first",
            bundle.display()
        )));
    }

    let simulator = ctx.simulator_bin();
    if !simulator.exists() {
        return Err(ToolError::Custom(format!(
            "Playdate Simulator not found at {} — run `pdkit setup` or set PLAYDATE_SDK_PATH",
            simulator.display()
        )));
    }

    debug!(bundle = %bundle.display(), simulator = %simulator.display(), "launching simulator");

    match ctx.platform.os {
        OsFamily::MacOs => {
            // `open` hands the bundle to the app and returns immediately
            let result = process::run(
                "open",
                [
                    std::ffi::OsStr::new("-a"),
                    simulator.as_os_str(),
                    bundle.as_os_str(),
                ],
                None,
                None,
            )
            .await;
            if !result.success() {
                return Err(ToolError::Custom(format!(
                    "Simulator launch failed: {}",
                    result.stderr.trim()
                )));
            }
        }
        OsFamily::Windows => {
            let result = process::run(
                "cmd",
                [
                    std::ffi::OsStr::new("/C"),
                    std::ffi::OsStr::new("start"),
                    std::ffi::OsStr::new(""),
                    simulator.as_os_str(),
                    bundle.as_os_str(),
                ],
                None,
                None,
            )
            .await;
            if !result.success() {
                return Err(ToolError::Custom(format!(
                    "Simulator launch failed: {}",
                    result.stderr.trim()
                )));
            }
        }
        OsFamily::Linux | OsFamily::Wsl | OsFamily::Unknown => {
            // No `open` equivalent here; spawn the simulator detached
            // and report from the spawn result only.
            tokio::process::Command::new(&simulator)
                .arg(&bundle)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .map_err(|e| {
                    ToolError::Custom(format!("Failed to start the simulator: {e}"))
                })?;
        }
    }

    Ok(LaunchResult {
        bundle: bundle.to_string_lossy().to_string(),
        simulator: simulator.to_string_lossy().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;

    #[tokio::test]
    async fn test_missing_bundle_short_circuits() {
        let root = tempfile::tempdir().unwrap();
        let ctx = ToolContext::with_roots(
            Platform {
                os: OsFamily::Linux,
                arch: "x86_64",
                distro: None,
            },
            root.path().to_path_buf(),
            root.path().to_path_buf(),
        );

        let err = run_bundle(&ctx, Some(root.path().join("missing.pdx")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Bundle not found"));
    }

    #[tokio::test]
    async fn test_missing_simulator_short_circuits() {
        let root = tempfile::tempdir().unwrap();
        let bundle = root.path().join("output.pdx");
        std::fs::create_dir(&bundle).unwrap();

        let ctx = ToolContext::with_roots(
            Platform {
                os: OsFamily::Linux,
                arch: "x86_64",
                distro: None,
            },
            root.path().join("no-sdk"),
            root.path().to_path_buf(),
        );

        let err = run_bundle(&ctx, Some(bundle)).await.unwrap_err();
        assert!(err.to_string().contains("Simulator not found"));
    }
}
