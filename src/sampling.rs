//! # Sampling Module
//!
//! Selezione dei timestamp e naming degli artefatti di campionamento.
//!
//! ## Convenzioni:
//! - `N` timestamp a `duration * i / (N + 1)`, mai inizio o fine del file
//! - Timecode `HH_MM_SS_mmm` con millisecondi troncati
//! - Nome file `<scr|vid>-<ratio>-<timecode>-<mode>.<png|mp4>`
//! - Finestre di health check: la prima parte da 0, le altre distribuite
//!   uniformemente su `[0, duration - window]`

use std::fmt;
use std::path::{Path, PathBuf};

/// Evenly spaced sample points that never hit the first or last instant
pub fn sample_timestamps(duration: f64, count: usize) -> Vec<f64> {
    if count == 0 || !duration.is_finite() || duration <= 0.0 {
        return Vec::new();
    }
    let step = duration / (count as f64 + 1.0);
    (1..=count).map(|i| step * i as f64).collect()
}

/// `HH_MM_SS_mmm`, milliseconds truncated
pub fn format_timecode(seconds: f64) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).floor() as u64
    } else {
        0
    };
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    format!(
        "{:02}_{:02}_{:02}_{:03}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60,
        ms
    )
}

/// Start offsets of health-check windows of `window` seconds
pub fn health_check_windows(duration: f64, window: f64, samples: usize) -> Vec<f64> {
    if samples == 0 {
        return Vec::new();
    }
    let max_start = (duration - window).max(0.0);
    if samples == 1 {
        return vec![0.0];
    }
    (0..samples)
        .map(|i| max_start * i as f64 / (samples - 1) as f64)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Screenshot,
    Clip,
}

impl ArtifactKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Screenshot => "scr",
            ArtifactKind::Clip => "vid",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Screenshot => "png",
            ArtifactKind::Clip => "mp4",
        }
    }
}

/// Which file of a pair an artifact was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactMode {
    /// The reference file from the comparison folder
    Original,
    /// The inspected file when a comparison folder is given
    Transcoded,
    /// The inspected file in single-folder mode
    Screen,
}

impl fmt::Display for ArtifactMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArtifactMode::Original => "original",
            ArtifactMode::Transcoded => "transcoded",
            ArtifactMode::Screen => "screen",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleArtifact {
    pub kind: ArtifactKind,
    pub ratio_tag: String,
    pub timestamp: f64,
    pub mode: ArtifactMode,
}

impl SampleArtifact {
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}-{}-{}.{}",
            self.kind.prefix(),
            self.ratio_tag,
            format_timecode(self.timestamp),
            self.mode,
            self.kind.extension()
        )
    }

    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}
