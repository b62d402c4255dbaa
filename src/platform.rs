use std::path::PathBuf;

use serde::Serialize;

use crate::util::exe_name;

/// Environment override for the SDK installation root.
pub const SDK_PATH_ENV: &str = "PLAYDATE_SDK_PATH";

/// Host operating-system family. A closed set: every consumer matches
/// exhaustively instead of falling through to a silent default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OsFamily {
    MacOs,
    Linux,
    Wsl,
    Windows,
    Unknown,
}

impl OsFamily {
    pub fn label(&self) -> &'static str {
        match self {
            OsFamily::MacOs => "macOS",
            OsFamily::Linux => "Linux",
            OsFamily::Wsl => "WSL",
            OsFamily::Windows => "Windows",
            OsFamily::Unknown => "unknown",
        }
    }
}

/// Linux distribution family, used to pick the package manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DistroFamily {
    Debian,
    RedHat,
    Arch,
    Unknown,
}

impl DistroFamily {
    /// The package-manager binary conventionally available on this family.
    pub fn package_manager(&self) -> &'static str {
        match self {
            DistroFamily::Debian => "apt-get",
            DistroFamily::RedHat => "dnf",
            DistroFamily::Arch => "pacman",
            DistroFamily::Unknown => "apt-get",
        }
    }
}

/// Immutable description of the host, detected once at process start and
/// passed around inside the tool context.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    pub os: OsFamily,
    pub arch: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distro: Option<DistroFamily>,
}

impl Platform {
    /// Detects the host platform. Never fails; unrecognized hosts map to
    /// `OsFamily::Unknown` and get the generic defaults.
    pub fn detect() -> Self {
        let os = match std::env::consts::OS {
            "macos" => OsFamily::MacOs,
            "windows" => OsFamily::Windows,
            "linux" => {
                if running_under_wsl() {
                    OsFamily::Wsl
                } else {
                    OsFamily::Linux
                }
            }
            _ => OsFamily::Unknown,
        };

        let distro = match os {
            OsFamily::Linux | OsFamily::Wsl => Some(detect_distro()),
            OsFamily::MacOs | OsFamily::Windows | OsFamily::Unknown => None,
        };

        Platform {
            os,
            arch: std::env::consts::ARCH,
            distro,
        }
    }

    /// Default SDK installation root for this platform. The
    /// `PLAYDATE_SDK_PATH` environment variable always wins.
    pub fn sdk_root(&self) -> PathBuf {
        if let Ok(path) = std::env::var(SDK_PATH_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(crate::util::expand_tilde(&path));
            }
        }

        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        match self.os {
            OsFamily::MacOs => home.join("Developer").join("PlaydateSDK"),
            OsFamily::Linux => home.join("PlaydateSDK"),
            // WSL shells see the Windows-side SDK install by convention
            OsFamily::Wsl => home.join("Documents").join("PlaydateSDK"),
            OsFamily::Windows => home.join("Documents").join("PlaydateSDK"),
            OsFamily::Unknown => home.join("PlaydateSDK"),
        }
    }

    /// Path of the simulator executable inside the given SDK root.
    pub fn simulator_path(&self, sdk_root: &std::path::Path) -> PathBuf {
        let bin = sdk_root.join("bin");
        match self.os {
            OsFamily::MacOs => bin.join("Playdate Simulator.app"),
            OsFamily::Linux | OsFamily::Wsl | OsFamily::Unknown => bin.join("PlaydateSimulator"),
            OsFamily::Windows => bin.join("PlaydateSimulator.exe"),
        }
    }

    /// Path of the vendor compiler inside the given SDK root.
    pub fn compiler_path(&self, sdk_root: &std::path::Path) -> PathBuf {
        sdk_root.join("bin").join(exe_name("pdc"))
    }

    /// Path of the device utility inside the given SDK root.
    pub fn device_util_path(&self, sdk_root: &std::path::Path) -> PathBuf {
        sdk_root.join("bin").join(exe_name("pdutil"))
    }
}

fn running_under_wsl() -> bool {
    match std::fs::read_to_string("/proc/version") {
        Ok(content) => is_wsl_kernel(&content),
        Err(_) => false,
    }
}

/// WSL kernels identify themselves in /proc/version.
fn is_wsl_kernel(proc_version: &str) -> bool {
    let lower = proc_version.to_lowercase();
    lower.contains("microsoft") || lower.contains("wsl")
}

fn detect_distro() -> DistroFamily {
    match std::fs::read_to_string("/etc/os-release") {
        Ok(content) => distro_from_os_release(&content),
        Err(_) => DistroFamily::Unknown,
    }
}

/// Maps the ID / ID_LIKE fields of /etc/os-release to a distro family.
fn distro_from_os_release(content: &str) -> DistroFamily {
    let mut ids = String::new();
    for line in content.lines() {
        if let Some(value) = line
            .strip_prefix("ID=")
            .or_else(|| line.strip_prefix("ID_LIKE="))
        {
            ids.push(' ');
            ids.push_str(value.trim_matches('"'));
        }
    }
    let ids = ids.to_lowercase();

    if ids.contains("debian") || ids.contains("ubuntu") {
        DistroFamily::Debian
    } else if ids.contains("fedora") || ids.contains("rhel") || ids.contains("centos") {
        DistroFamily::RedHat
    } else if ids.contains("arch") {
        DistroFamily::Arch
    } else {
        DistroFamily::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wsl_kernel_detection() {
        assert!(is_wsl_kernel(
            "Linux version 5.15.90.1-microsoft-standard-WSL2 (gcc ...)"
        ));
        assert!(!is_wsl_kernel("Linux version 6.1.0-18-amd64 (debian ...)"));
    }

    #[test]
    fn test_distro_from_os_release() {
        let ubuntu = "NAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\n";
        assert_eq!(distro_from_os_release(ubuntu), DistroFamily::Debian);

        let fedora = "NAME=\"Fedora Linux\"\nID=fedora\n";
        assert_eq!(distro_from_os_release(fedora), DistroFamily::RedHat);

        let arch = "NAME=\"Arch Linux\"\nID=arch\n";
        assert_eq!(distro_from_os_release(arch), DistroFamily::Arch);

        let mystery = "NAME=\"SomethingElse\"\nID=sel4\n";
        assert_eq!(distro_from_os_release(mystery), DistroFamily::Unknown);
    }

    #[cfg(unix)]
    #[test]
    fn test_sdk_root_env_override() {
        let platform = Platform {
            os: OsFamily::Linux,
            arch: "x86_64",
            distro: Some(DistroFamily::Debian),
        };
        std::env::set_var(SDK_PATH_ENV, "/opt/playdate-sdk");
        assert_eq!(platform.sdk_root(), PathBuf::from("/opt/playdate-sdk"));
        std::env::remove_var(SDK_PATH_ENV);

        let default = platform.sdk_root();
        assert!(default.ends_with("PlaydateSDK"));
    }

    #[cfg(unix)]
    #[test]
    fn test_vendor_binary_paths() {
        let platform = Platform {
            os: OsFamily::Linux,
            arch: "x86_64",
            distro: None,
        };
        let sdk = PathBuf::from("/sdk");
        assert_eq!(platform.compiler_path(&sdk), PathBuf::from("/sdk/bin/pdc"));
        assert_eq!(
            platform.device_util_path(&sdk),
            PathBuf::from("/sdk/bin/pdutil")
        );
        assert_eq!(
            platform.simulator_path(&sdk),
            PathBuf::from("/sdk/bin/PlaydateSimulator")
        );
    }
}
