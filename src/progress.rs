//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e i contatori di ogni esecuzione.
//!
//! ## Responsabilità:
//! - Progress bar visuale con `indicatif` per feedback real-time
//! - Barra percentuale per encode lunghi (HandBrakeCLI, ffmpeg)
//! - Esito per file (`Processed`, `Skipped`, `Failed`) e contatori cumulativi
//! - Riepilogo finale su una sola riga
//!
//! ## Modalità quiet:
//! Tutte le barre vengono create nascoste, così il codice chiamante non deve
//! distinguere i due casi.
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:02:15] [========================================] 150/150 (100%) ✅ movie.mkv
//! ```
//!
//! ## Esempio:
//! ```rust,ignore
//! let progress = ProgressManager::new(files.len() as u64, quiet);
//! let mut stats = RunStats::new();
//!
//! // Per ogni file:
//! stats.record(&file_name, &outcome);
//! progress.update(&file_name);
//!
//! // Alla fine:
//! progress.finish(&stats.format_summary());
//! ```

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fmt;
use std::time::Duration;

/// Manages the per-run progress bar
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager; hidden when `quiet`
    pub fn new(total_files: u64, quiet: bool) -> Self {
        if quiet {
            return Self::hidden(total_files);
        }

        let bar = ProgressBar::new(total_files);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        ) {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Bar over 0-100 percent, for a single long-running encode
    pub fn percent(prefix: &str, quiet: bool) -> Self {
        if quiet {
            return Self::hidden(100);
        }

        let bar = ProgressBar::new(100);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{prefix} [{elapsed_precise}] [{bar:40.green/white}] {pos:>3}% {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar.set_prefix(prefix.to_string());

        Self { bar }
    }

    fn hidden(len: u64) -> Self {
        Self {
            bar: ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::hidden()),
        }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Set a custom message without incrementing
    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    /// Set an absolute position, clamped to the bar length
    pub fn set_position(&self, position: u64) {
        let position = match self.bar.length() {
            Some(len) => position.min(len),
            None => position,
        };
        self.bar.set_position(position);
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Remove the bar from the terminal
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

/// Why a file was left alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Samples from an earlier run are still in place
    AlreadySampled,
    /// Bitrate ratio inside the thresholds
    WithinThresholds,
    /// No file with the same relative path in the comparison folder
    NoCounterpart,
    /// Output already exists
    OutputExists,
    /// Marker file says the work was done before
    AlreadyMarked,
    /// Listed source is missing on disk
    MissingSource,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::AlreadySampled => "already sampled",
            SkipReason::WithinThresholds => "bitrate ratio within thresholds",
            SkipReason::NoCounterpart => "no matching file in compare path",
            SkipReason::OutputExists => "output already exists",
            SkipReason::AlreadyMarked => "already processed",
            SkipReason::MissingSource => "source file not found",
        })
    }
}

/// Result of handling one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Processed,
    Skipped(SkipReason),
    Failed(String),
}

impl FileOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            FileOutcome::Processed => "processed",
            FileOutcome::Skipped(_) => "skipped",
            FileOutcome::Failed(_) => "failed",
        }
    }

    pub fn detail(&self) -> String {
        match self {
            FileOutcome::Processed => String::new(),
            FileOutcome::Skipped(reason) => reason.to_string(),
            FileOutcome::Failed(error) => error.clone(),
        }
    }
}

/// Counters accumulated over a run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub files_processed: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub screenshots_created: usize,
    pub clips_created: usize,
    /// First failures, as `(file, error)`
    pub failures: Vec<(String, String)>,
}

impl RunStats {
    const MAX_RECORDED_FAILURES: usize = 10;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, file: &str, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Processed => self.files_processed += 1,
            FileOutcome::Skipped(_) => self.files_skipped += 1,
            FileOutcome::Failed(error) => {
                self.files_failed += 1;
                if self.failures.len() < Self::MAX_RECORDED_FAILURES {
                    self.failures.push((file.to_string(), error.clone()));
                }
            }
        }
    }

    pub fn total(&self) -> usize {
        self.files_processed + self.files_skipped + self.files_failed
    }

    pub fn format_summary(&self) -> String {
        let mut summary = format!(
            "Processed: {} | Skipped: {} | Failed: {} | Total: {}",
            self.files_processed,
            self.files_skipped,
            self.files_failed,
            self.total()
        );
        if self.screenshots_created > 0 || self.clips_created > 0 {
            summary.push_str(&format!(
                " | Screenshots: {} | Clips: {}",
                self.screenshots_created, self.clips_created
            ));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_stats_counts_outcomes() {
        let mut stats = RunStats::new();
        stats.record("a.mkv", &FileOutcome::Processed);
        stats.record("b.mkv", &FileOutcome::Skipped(SkipReason::AlreadySampled));
        stats.record("c.mkv", &FileOutcome::Failed("ffmpeg timed out".to_string()));

        assert_eq!(stats.files_processed, 1);
        assert_eq!(stats.files_skipped, 1);
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.failures, vec![("c.mkv".to_string(), "ffmpeg timed out".to_string())]);
        assert_eq!(
            stats.format_summary(),
            "Processed: 1 | Skipped: 1 | Failed: 1 | Total: 3"
        );
    }

    #[test]
    fn test_failures_are_capped() {
        let mut stats = RunStats::new();
        for i in 0..15 {
            stats.record(&format!("{i}.mkv"), &FileOutcome::Failed("x".to_string()));
        }
        assert_eq!(stats.files_failed, 15);
        assert_eq!(stats.failures.len(), 10);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(FileOutcome::Processed.label(), "processed");
        let skipped = FileOutcome::Skipped(SkipReason::NoCounterpart);
        assert_eq!(skipped.label(), "skipped");
        assert_eq!(skipped.detail(), "no matching file in compare path");
    }

    #[test]
    fn test_hidden_bar_tracks_position() {
        let progress = ProgressManager::percent("encode", true);
        progress.set_position(42);
        assert_eq!(progress.position(), 42);
        progress.set_position(500);
        assert_eq!(progress.position(), 100);
    }
}
