use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::context::{default_bundle_path, ToolContext};
use crate::error::{Result, ToolError};
use crate::process;

/// Device queries get a deadline. A wedged USB stack should produce an
/// answer, not a hung command.
const DEVICE_DEADLINE: Duration = Duration::from_secs(30);

/// Connectivity snapshot of an attached console. Queried fresh on every
/// call; nothing is persisted.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Queries the device utility for an attached console.
///
/// Never fails: a missing utility or a nonzero exit becomes
/// `connected=false` with the error text populated.
pub async fn device_info(ctx: &ToolContext) -> DeviceStatus {
    let pdutil = ctx.device_util_bin();
    if !pdutil.exists() {
        return DeviceStatus {
            connected: false,
            error: Some(format!(
                "Device utility not found at {} — run `pdkit setup` or set PLAYDATE_SDK_PATH",
                pdutil.display()
            )),
            ..Default::default()
        };
    }

    let result = process::run(&pdutil, ["info"], None, Some(DEVICE_DEADLINE)).await;
    if !result.success() {
        let detail = result.stderr.trim();
        return DeviceStatus {
            connected: false,
            error: Some(if detail.is_empty() {
                "No Playdate detected — check the USB connection and unlock the device".to_string()
            } else {
                detail.to_string()
            }),
            ..Default::default()
        };
    }

    let (serial, firmware) = parse_device_info(&result.combined_output());
    DeviceStatus {
        connected: true,
        serial,
        firmware,
        error: None,
    }
}

/// Installs a compiled bundle onto an attached console.
///
/// Probes connectivity first; any failure short-circuits before the
/// install command is issued.
pub async fn deploy(ctx: &ToolContext, bundle: Option<PathBuf>) -> Result<String> {
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

    let pdutil = ctx.device_util_bin();
    if !pdutil.exists() {
        return Err(ToolError::Custom(format!(
            "Device utility not found at {}",
            pdutil.display()
        )));
    }

    let status = device_info(ctx).await;
    if !status.connected {
        return Err(ToolError::Custom(status.error.unwrap_or_else(|| {
            "No Playdate detected — check the USB connection and unlock the device".to_string()
        })));
    }

    debug!(bundle = %bundle.display(), "installing bundle on device");
    let result = process::run(
        &pdutil,
        [std::ffi::OsStr::new("install"), bundle.as_os_str()],
        None,
        Some(DEVICE_DEADLINE),
    )
    .await;

    if result.success() {
        Ok(format!(
            "Installed {} on Playdate{}",
            bundle.display(),
            status
                .serial
                .map(|s| format!(" ({s})"))
                .unwrap_or_default()
        ))
    } else {
        Err(ToolError::Custom(format!(
            "Install failed: {}",
            result.combined_output().trim()
        )))
    }
}

/// Best-effort extraction of serial number and firmware version from the
/// utility's text output. Misses degrade to `None`, never to an error.
fn parse_device_info(text: &str) -> (Option<String>, Option<String>) {
    let mut serial = None;
    let mut firmware = None;

    for line in text.lines() {
        let lower = line.to_lowercase();
        if serial.is_none() && lower.contains("serial") {
            serial = value_of(line);
        }
        if firmware.is_none() && (lower.contains("firmware") || lower.contains("version")) {
            firmware = value_of(line);
        }
    }

    (serial, firmware)
}

/// The value after the first `:` or `=`, or the last whitespace-separated
/// token when no separator is present.
fn value_of(line: &str) -> Option<String> {
    let value = match line.split_once([':', '=']) {
        Some((_, rest)) => rest.trim(),
        None => line.split_whitespace().last().unwrap_or(""),
    };
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
