//! # Utility Functions Module
//!
//! This module provides small helpers shared by the tool wrappers: argument
//! vector building and human-readable formatting of sizes and durations.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// A value usable as a single command-line argument.
///
/// Paths go through as raw `OsStr`, so names that are not valid UTF-8
/// reach the tool unchanged.
pub trait ToolArg {
    fn to_arg(&self) -> OsString;
}

impl<T: ToolArg + ?Sized> ToolArg for &T {
    fn to_arg(&self) -> OsString {
        (**self).to_arg()
    }
}

impl ToolArg for str {
    fn to_arg(&self) -> OsString {
        OsString::from(self)
    }
}

impl ToolArg for String {
    fn to_arg(&self) -> OsString {
        OsString::from(self)
    }
}

impl ToolArg for OsStr {
    fn to_arg(&self) -> OsString {
        self.to_os_string()
    }
}

impl ToolArg for OsString {
    fn to_arg(&self) -> OsString {
        self.clone()
    }
}

impl ToolArg for Path {
    fn to_arg(&self) -> OsString {
        self.as_os_str().to_os_string()
    }
}

impl ToolArg for PathBuf {
    fn to_arg(&self) -> OsString {
        self.as_os_str().to_os_string()
    }
}

macro_rules! numeric_tool_arg {
    ($($ty:ty),*) => {
        $(impl ToolArg for $ty {
            fn to_arg(&self) -> OsString {
                OsString::from(self.to_string())
            }
        })*
    };
}

numeric_tool_arg!(i32, i64, u32, u64, usize, f32, f64);

/// Builds a `Vec<OsString>` of tool arguments from strings, numbers and paths.
///
/// # Example
/// ```rust
/// use media_library_tools::args;
///
/// let seconds: u64 = 7;
/// let args = args!["-ss", 12.5, "-t", seconds, "-c", "copy"];
/// assert_eq!(args, vec!["-ss", "12.5", "-t", "7", "-c", "copy"]);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        vec![$($crate::utils::ToolArg::to_arg(&$item)),*]
    };
}

/// Get human-readable file size
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Bytes to GiB, rounded to two decimals
pub fn bytes_to_gb(bytes: u64) -> f64 {
    round_to(bytes as f64 / (1024.0 * 1024.0 * 1024.0), 2)
}

/// Bits per second to megabits per second, rounded to two decimals
pub fn bps_to_mbps(bps: u64) -> f64 {
    round_to(bps as f64 / 1_000_000.0, 2)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `H:MM:SS` for whole seconds
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_macro_mixed_types() {
        let frames = 1;
        let path = Path::new("/media/a b.mkv");
        let result = args!["-i", path, "-frames:v", frames];
        assert_eq!(result, vec!["-i", "/media/a b.mkv", "-frames:v", "1"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_args_macro_keeps_non_utf8_paths() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"/media/caf\xe9.mkv");
        let path = PathBuf::from(raw);
        let result = args!["-i", path];
        assert_eq!(result[1].as_os_str(), raw);
        assert_eq!(result[1].as_encoded_bytes(), b"/media/caf\xe9.mkv");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn test_unit_conversions() {
        assert_eq!(bytes_to_gb(1_610_612_736), 1.5);
        assert_eq!(bps_to_mbps(8_123_456), 8.12);
        assert_eq!(format_duration(3723.9), "1:02:03");
        assert_eq!(format_duration(-1.0), "0:00:00");
    }
}
