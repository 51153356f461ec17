//! Distro detection for picking distro-specific runner helpers.
//!
//! The `ID=` field of `/etc/os-release` names the distro; helper scripts
//! under `<shell_dir>/distro/<id>/` override the generic ones.

use std::fs;
use std::path::Path;
use tracing::debug;

/// Standard location of the os-release file.
pub const OS_RELEASE: &str = "/etc/os-release";

/// Extracts the lower-cased `ID` value from os-release content.
pub fn parse_os_release(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| line.strip_prefix("ID="))
        .map(|value| value.trim().trim_matches(['"', '\'']).to_lowercase())
        .filter(|id| !id.is_empty())
}

/// Reads the distro id from `path`, `None` if unreadable or absent.
pub fn detect_distro_from(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => parse_os_release(&content),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no os-release information");
            None
        }
    }
}

/// Detects the running distro from `/etc/os-release`.
pub fn detect_distro() -> Option<String> {
    detect_distro_from(Path::new(OS_RELEASE))
}
