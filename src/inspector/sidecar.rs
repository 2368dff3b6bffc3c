//! `video_info.json` stored beside the samples of each file.

use crate::error::Result;
use crate::utils::{bps_to_mbps, bytes_to_gb, round_to};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

pub const SIDECAR_FILE_NAME: &str = "video_info.json";

/// Sizes, bitrates and ratio recorded by the last inspection of a file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfoRecord {
    pub input_bitrate: Option<u64>,
    pub input_bitrate_mbps: Option<f64>,
    pub input_size: u64,
    pub input_size_gb: f64,
    pub compare_bitrate: Option<u64>,
    pub compare_bitrate_mbps: Option<f64>,
    pub compare_size: Option<u64>,
    pub compare_size_gb: Option<f64>,
    pub transcode_bitrate_ratio: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl VideoInfoRecord {
    pub fn new(
        input_bitrate: Option<u64>,
        input_size: u64,
        compare_bitrate: Option<u64>,
        compare_size: Option<u64>,
        ratio: Option<f64>,
        duration: Option<f64>,
    ) -> Self {
        Self {
            input_bitrate,
            input_bitrate_mbps: input_bitrate.map(bps_to_mbps),
            input_size,
            input_size_gb: bytes_to_gb(input_size),
            compare_bitrate,
            compare_bitrate_mbps: compare_bitrate.map(bps_to_mbps),
            compare_size,
            compare_size_gb: compare_size.map(bytes_to_gb),
            transcode_bitrate_ratio: ratio.map(|r| round_to(r, 2)),
            duration,
        }
    }

    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(SIDECAR_FILE_NAME)
    }

    /// Stored record, `None` when absent or unreadable
    pub async fn read(dir: &Path) -> Option<Self> {
        let path = Self::path_in(dir);
        let content = fs::read_to_string(&path).await.ok()?;
        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Ignoring unreadable {}: {}", path.display(), e);
                None
            }
        }
    }

    pub async fn write(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).await?;
        let path = Self::path_in(dir);
        fs::write(&path, serde_json::to_string_pretty(self)?).await?;
        debug!("Video info written to {}", path.display());
        Ok(())
    }

    /// True when both files still have the sizes recorded last time
    pub fn matches_sizes(&self, input_size: u64, compare_size: Option<u64>) -> bool {
        self.input_size == input_size && self.compare_size == compare_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let sample_dir = dir.path().join("Movie (2020)");

        let record = VideoInfoRecord::new(
            Some(4_000_000),
            2_147_483_648,
            Some(10_000_000),
            Some(5_368_709_120),
            Some(40.0),
            Some(7200.0),
        );
        record.write(&sample_dir).await.unwrap();

        let loaded = VideoInfoRecord::read(&sample_dir).await.unwrap();
        assert_eq!(loaded, record);
        assert_eq!(loaded.input_size_gb, 2.0);
        assert_eq!(loaded.compare_bitrate_mbps, Some(10.0));
        assert!(loaded.matches_sizes(2_147_483_648, Some(5_368_709_120)));
        assert!(!loaded.matches_sizes(2_147_483_648, Some(1)));
    }

    #[tokio::test]
    async fn test_legacy_record_without_duration() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SIDECAR_FILE_NAME),
            r#"{"input_bitrate": 1, "input_bitrate_mbps": 0.0, "input_size": 10,
                "input_size_gb": 0.0, "compare_bitrate": null, "compare_bitrate_mbps": null,
                "compare_size": null, "compare_size_gb": null, "transcode_bitrate_ratio": null}"#,
        )
        .unwrap();

        let record = VideoInfoRecord::read(dir.path()).await.unwrap();
        assert_eq!(record.duration, None);
        assert!(record.matches_sizes(10, None));
    }

    #[tokio::test]
    async fn test_garbage_is_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SIDECAR_FILE_NAME), "{ nope").unwrap();
        assert!(VideoInfoRecord::read(dir.path()).await.is_none());
    }
}
