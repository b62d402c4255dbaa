use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::Colorize;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::commands::{doctor, watch};
use crate::context::ToolContext;
use crate::error::{Result, ToolError};
use crate::platform::OsFamily;
use crate::process::{self, ExecStatus};

/// Override for the SDK archive URL, for mirrors and pinned versions.
const SDK_URL_ENV: &str = "PDKIT_SDK_URL";

const SDK_DOWNLOAD_URL: &str = "https://download.panic.com/playdate_sdk/PlaydateSDK-latest.zip";

/// The VS Code extension providing Playdate debugging support.
const IDE_EXTENSION: &str = "Orta.playdate";

#[derive(Clone, Debug, Default)]
pub struct SetupOptions {
    /// Skip interactive confirmation prompts.
    pub assume_yes: bool,
}

/// Runs the bootstrap sequence: environment scan, package-manager check,
/// watcher dependency, SDK download-and-extract, IDE extension.
///
/// Only the SDK step is critical; the others warn and continue.
pub async fn setup(ctx: &ToolContext, opts: SetupOptions) -> Result<()> {
    let total = 5;

    // Step 1: scan the environment
    step(1, total, "Scanning environment");
    let report = doctor::doctor(ctx).await;
    println!(
        "    {} {} ({})",
        "platform:".dimmed(),
        report.platform.os.label(),
        report.platform.arch
    );
    println!(
        "    {} {} {}",
        "sdk:".dimmed(),
        report.sdk_root,
        if report.sdk_installed {
            "(present)".green().to_string()
        } else {
            "(missing)".yellow().to_string()
        }
    );

    // Step 2: package manager (advisory)
    step(2, total, "Checking package manager");
    match package_manager(ctx) {
        Some(pm) => {
            if binary_available(pm).await {
                println!("    {pm} is available");
            } else {
                warn(&format!(
                    "{pm} not found — install it to let pdkit manage dependencies"
                ));
            }
        }
        None => warn("No supported package manager on this platform"),
    }

    // Step 3: file-watcher dependency (non-critical)
    step(3, total, "Installing file watcher");
    match install_watcher(ctx, &opts).await {
        Ok(Some(detail)) => println!("    {detail}"),
        Ok(None) => println!("    skipped"),
        Err(e) => warn(&format!(
            "Could not install a file watcher: {e}. `pdkit watch` will fall back to polling."
        )),
    }

    // Step 4: the SDK itself (critical)
    step(4, total, "Installing Playdate SDK");
    if ctx.sdk_root.is_dir() {
        println!("    already installed at {}", ctx.sdk_root.display());
    } else if confirm(
        &format!("Download the Playdate SDK to {}?", ctx.sdk_root.display()),
        opts.assume_yes,
    ) {
        install_sdk(ctx).await?;
        println!("    {}", "SDK installed".green());
    } else {
        return Err(ToolError::Custom(
            "SDK installation declined — cannot continue without it".into(),
        ));
    }

    // Step 5: IDE extension (non-critical)
    step(5, total, "Installing IDE extension");
    match install_ide_extension(&opts).await {
        Ok(true) => println!("    {IDE_EXTENSION} installed"),
        Ok(false) => println!("    skipped"),
        Err(e) => warn(&format!("Could not install {IDE_EXTENSION}: {e}")),
    }

    println!("\n{}", "Setup complete.".green().bold());
    Ok(())
}

fn step(index: usize, total: usize, description: &str) {
    println!("{} {description}", format!("[{index}/{total}]").cyan().bold());
}

fn warn(message: &str) {
    println!("    {} {message}", "warning:".yellow());
}

/// Asks a yes/no question on stdin. Empty input means yes.
fn confirm(prompt: &str, assume_yes: bool) -> bool {
    if assume_yes {
        return true;
    }
    print!("{prompt} [Y/n] ");
    let _ = std::io::stdout().flush();

    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes")
}

/// The package manager conventionally present on this platform.
fn package_manager(ctx: &ToolContext) -> Option<&'static str> {
    match ctx.platform.os {
        OsFamily::MacOs => Some("brew"),
        OsFamily::Linux | OsFamily::Wsl => {
            Some(ctx.platform.distro.map_or("apt-get", |d| d.package_manager()))
        }
        OsFamily::Windows => Some("winget"),
        OsFamily::Unknown => None,
    }
}

async fn binary_available(name: &str) -> bool {
    let result = process::run(name, ["--version"], None, Some(Duration::from_secs(15))).await;
    result.status != ExecStatus::FailedToStart
}

/// Installs the native file-watcher package when one is missing.
/// Returns a human-readable detail, or None when the step does not apply.
async fn install_watcher(ctx: &ToolContext, opts: &SetupOptions) -> Result<Option<String>> {
    let (watcher, install_cmd): (&str, Vec<&str>) = match ctx.platform.os {
        OsFamily::MacOs => ("fswatch", vec!["brew", "install", "fswatch"]),
        OsFamily::Linux | OsFamily::Wsl => (
            "inotifywait",
            match ctx.platform.distro.map(|d| d.package_manager()) {
                Some("dnf") => vec!["sudo", "dnf", "install", "-y", "inotify-tools"],
                Some("pacman") => vec!["sudo", "pacman", "-S", "--noconfirm", "inotify-tools"],
                _ => vec!["sudo", "apt-get", "install", "-y", "inotify-tools"],
            },
        ),
        // Windows and unknown hosts use the polling backend
        OsFamily::Windows | OsFamily::Unknown => return Ok(None),
    };

    if watch::binary_responds(watcher).await {
        return Ok(Some(format!("{watcher} already installed")));
    }
    if !confirm(&format!("Install {watcher}?"), opts.assume_yes) {
        return Ok(None);
    }

    let result = process::run(install_cmd[0], &install_cmd[1..], None, None).await;
    if result.success() {
        Ok(Some(format!("{watcher} installed")))
    } else {
        Err(ToolError::Custom(result.stderr.trim().to_string()))
    }
}

/// Downloads the SDK archive and extracts it into the SDK root.
async fn install_sdk(ctx: &ToolContext) -> Result<()> {
    let url = std::env::var(SDK_URL_ENV).unwrap_or_else(|_| SDK_DOWNLOAD_URL.to_string());

    let response = reqwest::get(&url).await?;
    if !response.status().is_success() {
        return Err(ToolError::Custom(format!(
            "Failed to download the SDK: HTTP {} from {url}",
            response.status()
        )));
    }

    let total_size = response.content_length().unwrap_or(0);
    let mut stream = response.bytes_stream();

    let temp_dir = std::env::temp_dir().join("pdkit-setup");
    tokio::fs::create_dir_all(&temp_dir).await?;
    let archive_path = temp_dir.join("PlaydateSDK.zip");

    let mut file = tokio::fs::File::create(&archive_path).await?;
    let mut downloaded: u64 = 0;
    let mut last_report: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        if total_size > 0 {
            let percent = downloaded * 100 / total_size;
            if percent >= last_report + 10 {
                last_report = percent;
                println!(
                    "    downloading... {:.1} MB / {:.1} MB",
                    downloaded as f64 / 1_000_000.0,
                    total_size as f64 / 1_000_000.0,
                );
            }
        }
    }
    file.flush().await?;
    drop(file);

    println!("    extracting...");

    // Extraction is sync but fast, so we spawn_blocking
    let sdk_root = ctx.sdk_root.clone();
    let archive = archive_path.clone();
    tokio::task::spawn_blocking(move || extract_sdk_archive(&archive, &sdk_root))
        .await
        .map_err(|e| ToolError::Custom(e.to_string()))??;

    // Clean up temp files
    let _ = tokio::fs::remove_dir_all(&temp_dir).await;

    Ok(())
}

/// Extracts the archive into the SDK root, dropping the archive's
/// top-level directory so `bin/` lands directly under the root.
fn extract_sdk_archive(archive_path: &Path, sdk_root: &Path) -> Result<()> {
    std::fs::create_dir_all(sdk_root)?;
    let file = std::fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(name) = entry.enclosed_name() else {
            continue;
        };
        let Some(stripped) = strip_top_level(&name) else {
            continue;
        };
        let out_path = sdk_root.join(stripped);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out_file = std::fs::File::create(&out_path)?;
        std::io::copy(&mut entry, &mut out_file)?;

        // Restore the executable bit on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode))?;
            }
        }
    }

    debug!(root = %sdk_root.display(), "archive extracted");
    Ok(())
}

fn strip_top_level(path: &Path) -> Option<PathBuf> {
    let mut components = path.components();
    components.next()?;
    let rest: PathBuf = components.collect();
    if rest.as_os_str().is_empty() {
        None
    } else {
        Some(rest)
    }
}

/// Installs the Playdate VS Code extension when `code` is on PATH.
async fn install_ide_extension(opts: &SetupOptions) -> Result<bool> {
    if !binary_available("code").await {
        return Ok(false);
    }
    if !confirm(
        &format!("Install the {IDE_EXTENSION} VS Code extension?"),
        opts.assume_yes,
    ) {
        return Ok(false);
    }

    let result = process::run(
        "code",
        ["--install-extension", IDE_EXTENSION],
        None,
        Some(Duration::from_secs(120)),
    )
    .await;
    if result.success() {
        Ok(true)
    } else {
        Err(ToolError::Custom(result.combined_output().trim().to_string()))
    }
}
