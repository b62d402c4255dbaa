use serde::Serialize;

use crate::commands::watch;
use crate::context::ToolContext;
use crate::platform::{OsFamily, Platform};
use crate::process;

/// Results from scanning the host for the SDK and its companion tools.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorReport {
    pub platform: Platform,
    pub sdk_root: String,
    pub sdk_installed: bool,
    pub compiler_installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler_version: Option<String>,
    pub simulator_installed: bool,
    pub device_util_installed: bool,
    pub watch_backend: String,
}

/// Scans the host environment: SDK presence, vendor binaries, and which
/// watch backend a `pdkit watch` would use.
pub async fn doctor(ctx: &ToolContext) -> DoctorReport {
    let compiler = ctx.compiler_bin();
    let compiler_installed = compiler.exists();
    let compiler_version = if compiler_installed {
        process::tool_version(&compiler).await
    } else {
        None
    };

    DoctorReport {
        platform: ctx.platform.clone(),
        sdk_root: ctx.sdk_root.to_string_lossy().to_string(),
        sdk_installed: ctx.sdk_root.is_dir(),
        compiler_installed,
        compiler_version,
        simulator_installed: ctx.simulator_bin().exists(),
        device_util_installed: ctx.device_util_bin().exists(),
        watch_backend: watch_backend_name(ctx).await,
    }
}

async fn watch_backend_name(ctx: &ToolContext) -> String {
    match ctx.platform.os {
        OsFamily::MacOs => {
            if watch::binary_responds("fswatch").await {
                return "fswatch".to_string();
            }
        }
        OsFamily::Linux | OsFamily::Wsl => {
            if watch::binary_responds("inotifywait").await {
                return "inotifywait".to_string();
            }
        }
        OsFamily::Windows | OsFamily::Unknown => {}
    }
    "poll".to_string()
}
