//! # Bitrate Comparison Module
//!
//! Questo modulo decide se un transcode è abbastanza sospetto da meritare
//! dei campioni visivi.
//!
//! ## Regola:
//! - `ratio = transcoded / original * 100`
//! - `ignore_thresholds` → sempre campionare
//! - ratio sconosciuto → campionare
//! - ratio fuori da `[lower, upper]` → campionare
//! - ratio dentro `[lower, upper]` (estremi inclusi) → saltare,
//!   salvo `force_video_samples` o `force_all` (decisione `Forced`)

use crate::error::{MediaToolError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_LOWER_THRESHOLD: f64 = 60.0;
pub const DEFAULT_UPPER_THRESHOLD: f64 = 105.0;

/// Percentage bounds and override flags for the sample decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub lower: f64,
    pub upper: f64,
    pub ignore_thresholds: bool,
    pub force_video_samples: bool,
    pub force_all: bool,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            lower: DEFAULT_LOWER_THRESHOLD,
            upper: DEFAULT_UPPER_THRESHOLD,
            ignore_thresholds: false,
            force_video_samples: false,
            force_all: false,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<()> {
        if !self.lower.is_finite() || !self.upper.is_finite() || self.lower < 0.0 {
            return Err(MediaToolError::Validation(
                "Thresholds must be non-negative numbers".to_string(),
            ));
        }
        if self.lower > self.upper {
            return Err(MediaToolError::Validation(format!(
                "Lower threshold ({}) must not exceed upper threshold ({})",
                self.lower, self.upper
            )));
        }
        Ok(())
    }

    pub fn contains(&self, ratio: f64) -> bool {
        ratio >= self.lower && ratio <= self.upper
    }

    /// Decide for a ratio, `None` meaning it could not be computed
    pub fn decide(&self, ratio: Option<f64>) -> Decision {
        if self.ignore_thresholds {
            return Decision::Sample(SampleReason::ThresholdsIgnored);
        }

        let Some(ratio) = ratio else {
            return Decision::Sample(SampleReason::UnknownRatio);
        };

        if ratio < self.lower {
            Decision::Sample(SampleReason::BelowLower)
        } else if ratio > self.upper {
            Decision::Sample(SampleReason::AboveUpper)
        } else if self.force_all {
            Decision::Forced(ForceReason::ForceAll)
        } else if self.force_video_samples {
            Decision::Forced(ForceReason::ForceVideoSamples)
        } else {
            Decision::Skip
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleReason {
    ThresholdsIgnored,
    UnknownRatio,
    BelowLower,
    AboveUpper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForceReason {
    ForceAll,
    ForceVideoSamples,
}

/// Outcome of comparing a transcode against its original
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Sample(SampleReason),
    Skip,
    Forced(ForceReason),
}

impl Decision {
    pub fn should_sample(&self) -> bool {
        !matches!(self, Decision::Skip)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Decision::Sample(SampleReason::ThresholdsIgnored) => "sample (thresholds ignored)",
            Decision::Sample(SampleReason::UnknownRatio) => "sample (unknown ratio)",
            Decision::Sample(SampleReason::BelowLower) => "sample (below lower threshold)",
            Decision::Sample(SampleReason::AboveUpper) => "sample (above upper threshold)",
            Decision::Skip => "skip (within thresholds)",
            Decision::Forced(ForceReason::ForceAll) => "forced (--force-all)",
            Decision::Forced(ForceReason::ForceVideoSamples) => "forced (--force-video-samples)",
        };
        f.write_str(text)
    }
}

/// Transcoded bitrate as a percentage of the original's
pub fn bitrate_ratio(original: Option<u64>, transcoded: Option<u64>) -> Option<f64> {
    match (original, transcoded) {
        (Some(original), Some(transcoded)) if original > 0 => {
            Some(transcoded as f64 / original as f64 * 100.0)
        }
        _ => None,
    }
}

/// Integer ratio tag for artifact names, `unknown` without a ratio
pub fn ratio_tag(ratio: Option<f64>) -> String {
    match ratio {
        Some(ratio) if ratio.is_finite() => format!("{}", ratio.round() as i64),
        _ => "unknown".to_string(),
    }
}

/// Bitrates, sizes and the resulting decision for one file pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub original_bitrate: Option<u64>,
    pub transcoded_bitrate: Option<u64>,
    pub original_size: u64,
    pub transcoded_size: u64,
    pub ratio: Option<f64>,
    pub decision: Decision,
}

impl ComparisonResult {
    pub fn evaluate(
        thresholds: &Thresholds,
        original_bitrate: Option<u64>,
        original_size: u64,
        transcoded_bitrate: Option<u64>,
        transcoded_size: u64,
    ) -> Self {
        let ratio = bitrate_ratio(original_bitrate, transcoded_bitrate);
        Self {
            original_bitrate,
            transcoded_bitrate,
            original_size,
            transcoded_size,
            ratio,
            decision: thresholds.decide(ratio),
        }
    }

    pub fn ratio_tag(&self) -> String {
        ratio_tag(self.ratio)
    }
}
