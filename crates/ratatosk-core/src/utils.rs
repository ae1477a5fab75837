//! Shared utility functions for Ratatosk crates

use crate::error::{Error, Result};
use std::path::PathBuf;

const SIZE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Format a byte count with decimal (base 1000) units and two decimals.
///
/// Values below 1000 stay in bytes: `999` renders as `"999.00 B"`,
/// `1500` as `"1.50 KB"`.
pub fn human_readable_size(size: u64) -> String {
    let mut value = size as f64;
    let mut index = 0;
    while value >= 1000.0 && index < SIZE_UNITS.len() - 1 {
        value /= 1000.0;
        index += 1;
    }
    format!("{:.2} {}", value, SIZE_UNITS[index])
}

/// Get the user's home directory.
///
/// Prefers the HOME environment variable over dirs::home_dir() so that
/// service accounts with overridden homes resolve consistently with the
/// shell that launched us.
pub fn get_home_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir().ok_or(Error::NoHomeDir)
}

/// Name of the machine we run on, used in report subjects
pub fn local_hostname() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}

/// Check if a command is available in PATH
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn size_boundary_is_1000_not_1024() {
        assert_eq!(human_readable_size(999), "999.00 B");
        assert_eq!(human_readable_size(1000), "1.00 KB");
        assert_eq!(human_readable_size(1500), "1.50 KB");
    }

    #[test]
    fn size_scales_through_units() {
        assert_eq!(human_readable_size(0), "0.00 B");
        assert_eq!(human_readable_size(2_500_000), "2.50 MB");
        assert_eq!(human_readable_size(3_000_000_000), "3.00 GB");
        assert_eq!(human_readable_size(1_200_000_000_000_000), "1.20 PB");
        // Beyond the last unit we saturate at PB instead of panicking
        assert_eq!(human_readable_size(2_000_000_000_000_000_000), "2000.00 PB");
    }

    #[test]
    #[serial]
    fn home_dir_prefers_env() {
        if std::env::var("HOME").is_ok() {
            let home = get_home_dir().unwrap();
            assert!(!home.as_os_str().is_empty());
        }
    }
}
