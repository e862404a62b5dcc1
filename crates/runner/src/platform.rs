//! Platform detection and bundled executable resolution
//!
//! Bundled runtimes live under `{bundle_dir}/{os}/{arch}/{executable}[.exe]`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use pagetest_common::{Error, Result, RunnerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsFamily {
    Linux,
    MacOs,
    Windows,
}

impl OsFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::Linux => "linux",
            OsFamily::MacOs => "macos",
            OsFamily::Windows => "windows",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpuWidth {
    Bits32,
    Bits64,
}

impl CpuWidth {
    pub fn as_str(&self) -> &'static str {
        match self {
            CpuWidth::Bits32 => "x86",
            CpuWidth::Bits64 => "x64",
        }
    }
}

/// OS family and CPU width used to pick a bundled executable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub os: OsFamily,
    pub width: CpuWidth,
}

impl Platform {
    /// Platform of the running process
    pub fn detect() -> Result<Self> {
        let bits = if cfg!(target_pointer_width = "64") { 64 } else { 32 };
        Self::from_parts(std::env::consts::OS, bits)
    }

    /// Build a platform from an OS name (as in `std::env::consts::OS`) and a pointer width
    pub fn from_parts(os: &str, bits: u32) -> Result<Self> {
        let unsupported = || Error::UnsupportedPlatform {
            os: os.to_string(),
            arch: format!("{bits}-bit"),
        };

        let os = match os {
            "linux" => OsFamily::Linux,
            "macos" => OsFamily::MacOs,
            "windows" => OsFamily::Windows,
            _ => return Err(unsupported()),
        };
        let width = match bits {
            32 => CpuWidth::Bits32,
            64 => CpuWidth::Bits64,
            _ => return Err(unsupported()),
        };

        Ok(Self { os, width })
    }

    /// Executable file name with the platform extension
    pub fn executable_file_name(&self, executable: &str) -> String {
        match self.os {
            OsFamily::Windows => format!("{executable}.exe"),
            _ => executable.to_string(),
        }
    }

    /// Path of `executable` inside a bundle directory for this platform
    pub fn executable_path(&self, bundle_dir: &Path, executable: &str) -> PathBuf {
        bundle_dir
            .join(self.os.as_str())
            .join(self.width.as_str())
            .join(self.executable_file_name(executable))
    }
}

/// Resolve the bundled executable, failing if it is not there
pub fn resolve_executable(bundle_dir: &Path, executable: &str, platform: Platform) -> Result<PathBuf> {
    let path = platform.executable_path(bundle_dir, executable);
    debug!("Resolved headless executable for {:?}: {}", platform, path.display());

    if !path.is_file() {
        return Err(RunnerError::ResourceNotFound(path).into());
    }
    Ok(path)
}

/// Restore execute permission on a file.
///
/// Extracting packaged resources drops the mode bits.
pub fn ensure_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let metadata = std::fs::metadata(path).map_err(|e| Error::filesystem(path, e))?;
        let mut permissions = metadata.permissions();
        let mode = permissions.mode();
        if mode & 0o111 != 0o111 {
            permissions.set_mode(mode | 0o111);
            std::fs::set_permissions(path, permissions).map_err(|e| Error::filesystem(path, e))?;
            debug!("Restored execute permission on {}", path.display());
        }
    }

    #[cfg(not(unix))]
    {
        if !path.exists() {
            return Err(RunnerError::ResourceNotFound(path.to_path_buf()).into());
        }
    }

    Ok(())
}
