//! # Health Fix
//!
//! Questo modulo ricodifica con ffmpeg i file che non hanno superato l'health
//! check: audio ricampionato in AAC, timestamp rigenerati, sottotitoli copiati.
//!
//! ## Ripresa:
//! Se esiste `<file>.to_be_deleted_health_fixed` il file è già stato
//! sistemato e viene saltato. Un `<file>.fix_health_check_temp.mkv` rimasto
//! da un'esecuzione interrotta viene rimosso prima di ripartire.
//!
//! ## Esito:
//! - Successo: sorgente -> marker, temp -> nome originale
//! - Errore: il temp viene eliminato, la sorgente resta intatta

use crate::args;
use crate::config::FixHealthConfig;
use crate::error::Result;
use crate::file_manager::FileManager;
use crate::platform::{Tool, ToolSet};
use crate::probe::Prober;
use crate::progress::{FileOutcome, ProgressManager, RunStats, SkipReason};
use crate::runner::{StreamSource, ToolInvocation, ToolRunner};
use crate::utils::format_duration;
use regex::Regex;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs;
use tracing::{debug, error, info, warn};

pub const FIXED_MARKER_SUFFIX: &str = ".to_be_deleted_health_fixed";
pub const TEMP_SUFFIX: &str = ".fix_health_check_temp.mkv";

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"time=(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").expect("time pattern is valid")
});

/// Encoded position in seconds from an ffmpeg status line
pub fn parse_ffmpeg_time(line: &str) -> Option<f64> {
    let caps = TIME_RE.captures(line)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Share of `duration` already encoded, capped at 100
fn encoded_percent(position: f64, duration: f64) -> u64 {
    (position / duration * 100.0).clamp(0.0, 100.0) as u64
}

#[derive(Debug)]
pub struct FixHealthSummary {
    pub stats: RunStats,
    pub failed_files: Vec<PathBuf>,
}

pub struct HealthFixer<'a, R> {
    config: &'a FixHealthConfig,
    runner: &'a R,
    tools: &'a ToolSet,
    quiet: bool,
}

impl<'a, R: ToolRunner> HealthFixer<'a, R> {
    pub fn new(config: &'a FixHealthConfig, runner: &'a R, tools: &'a ToolSet, quiet: bool) -> Self {
        Self {
            config,
            runner,
            tools,
            quiet,
        }
    }

    pub fn required_tools() -> &'static [Tool] {
        &[Tool::Ffmpeg, Tool::Ffprobe]
    }

    pub fn encode_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        args![
            "-i", input,
            "-c:v", self.config.video_codec,
            "-q:v", self.config.quality,
            "-c:a", "aac",
            "-b:a", self.config.audio_bitrate,
            "-af", "aresample=async=1000",
            "-max_muxing_queue_size", "9999",
            "-fflags", "+genpts",
            "-c:s", "copy",
            "-f", "matroska",
            output,
        ]
    }

    pub async fn run(&self) -> anyhow::Result<FixHealthSummary> {
        let files = FileManager::read_path_list(&self.config.file_list).await?;
        info!("🩹 Total files to process: {}", files.len());

        let mut stats = RunStats::new();
        let mut failed_files = Vec::new();
        let total = files.len();

        for (idx, file) in files.iter().enumerate() {
            let name = file.display().to_string();
            let outcome = match self.fix_file(file, idx, total).await {
                Ok(outcome) => outcome,
                Err(e) => FileOutcome::Failed(e.to_string()),
            };

            match &outcome {
                FileOutcome::Processed => info!("✅ [{}/{}] {} fixed", idx + 1, total, name),
                FileOutcome::Skipped(reason) => {
                    info!("⏭️ [{}/{}] {} skipped: {}", idx + 1, total, name, reason)
                }
                FileOutcome::Failed(message) => {
                    error!("❌ [{}/{}] {} failed: {}", idx + 1, total, name, message);
                    failed_files.push(file.clone());
                }
            }
            stats.record(&name, &outcome);
        }

        if failed_files.is_empty() {
            info!("All files processed successfully. {}", stats.format_summary());
        } else {
            warn!("{} files failed to process. {}", failed_files.len(), stats.format_summary());
        }
        Ok(FixHealthSummary {
            stats,
            failed_files,
        })
    }

    pub async fn fix_file(&self, input: &Path, idx: usize, total: usize) -> Result<FileOutcome> {
        let marker = FileManager::with_appended_suffix(input, FIXED_MARKER_SUFFIX);
        if marker.exists() {
            return Ok(FileOutcome::Skipped(SkipReason::AlreadyMarked));
        }
        if !input.is_file() {
            return Ok(FileOutcome::Skipped(SkipReason::MissingSource));
        }

        let temp = FileManager::with_appended_suffix(input, TEMP_SUFFIX);
        if temp.exists() {
            debug!("Removing stale temp file {}", temp.display());
            fs::remove_file(&temp).await?;
        }

        let duration = match Prober::new(self.runner, self.tools).duration(input).await {
            Ok(duration) if duration > 0.0 => Some(duration),
            Ok(_) => None,
            Err(e) => {
                warn!("Couldn't determine duration for {}: {}", input.display(), e);
                None
            }
        };

        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let progress = ProgressManager::percent(&format!("{}/{}", idx + 1, total), self.quiet);
        progress.set_message(&file_name);

        let invocation =
            ToolInvocation::new(self.tools, Tool::Ffmpeg, self.encode_args(input, &temp));
        let result = self
            .runner
            .run_streaming(&invocation, StreamSource::Stderr, |line| {
                if let Some(position) = parse_ffmpeg_time(line) {
                    if let Some(duration) = duration {
                        progress.set_position(encoded_percent(position, duration));
                    }
                    progress.set_message(&format!("{} - {}", file_name, format_duration(position)));
                }
            })
            .await;

        let output = match result {
            Ok(output) if output.success => output,
            Ok(output) => {
                progress.clear();
                self.remove_temp(&temp).await;
                return Ok(FileOutcome::Failed(format!(
                    "ffmpeg exited with code {}: {}",
                    output.code.unwrap_or(-1),
                    last_line(&output.stderr)
                )));
            }
            Err(e) => {
                progress.clear();
                self.remove_temp(&temp).await;
                return Err(e);
            }
        };

        if !temp.exists() {
            progress.clear();
            return Ok(FileOutcome::Failed("ffmpeg produced no output".to_string()));
        }
        fs::rename(input, &marker).await?;
        fs::rename(&temp, input).await?;

        progress.finish(&format!(
            "{} - fixed in {}",
            file_name,
            format_duration(output.elapsed.as_secs_f64())
        ));
        Ok(FileOutcome::Processed)
    }

    async fn remove_temp(&self, temp: &Path) {
        if temp.exists() {
            if let Err(e) = fs::remove_file(temp).await {
                warn!("Could not remove {}: {}", temp.display(), e);
            }
        }
    }
}

fn last_line(text: &str) -> &str {
    text.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("").trim()
}
