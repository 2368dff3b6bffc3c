//! # HDR to SDR Transcode
//!
//! Questo modulo converte in SDR i file elencati in `hdr-video-files.txt`
//! usando HandBrakeCLI e un preset JSON importato.
//!
//! ## Flusso per file:
//! 1. Output `<stem> SDR Handbrake.mkv`: se esiste già il file viene saltato
//! 2. Un eventuale `<stem> SDR Handbrake.temp.mkv` rimasto da un'esecuzione
//!    interrotta viene rimosso
//! 3. HandBrakeCLI scrive sul file temporaneo; stdout viene letto riga per
//!    riga per aggiornare la progress bar e copiato nel log
//! 4. In caso di successo: temp -> output, sorgente -> `<file>.to_be_deleted`
//!
//! ## Log:
//! `<cartella sorgente>/logs/<ts>_<file>_handbrake.log`, scritto da un task
//! tokio in background; un errore di scrittura diventa un `warn!`

use crate::args;
use crate::config::TranscodeConfig;
use crate::error::Result;
use crate::file_manager::FileManager;
use crate::platform::{Tool, ToolSet};
use crate::progress::{FileOutcome, ProgressManager, RunStats, SkipReason};
use crate::report::compact_timestamp;
use crate::runner::{StreamSource, ToolInvocation, ToolRunner};
use crate::utils::format_duration;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const OUTPUT_SUFFIX: &str = " SDR Handbrake";
pub const TO_BE_DELETED_SUFFIX: &str = ".to_be_deleted";

static TASK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Encoding: task (\d+) of (\d+), ([\d.]+) %").expect("task pattern is valid")
});
static RATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(([\d.]+) fps, avg ([\d.]+) fps, ETA (\d+h\d+m\d+s)\)")
        .expect("rate pattern is valid")
});
static ETA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)h(\d+)m(\d+)s$").expect("eta pattern is valid"));

/// One `Encoding:` status line from HandBrakeCLI
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeProgress {
    pub task: u32,
    pub total_tasks: u32,
    pub percent: f64,
    pub fps: Option<f64>,
    pub avg_fps: Option<f64>,
    /// Remaining time in seconds
    pub eta: Option<u64>,
}

impl EncodeProgress {
    pub fn status(&self) -> String {
        let mut status = format!(
            "Task {}/{} - {:.2}%",
            self.task, self.total_tasks, self.percent
        );
        if let (Some(fps), Some(avg)) = (self.fps, self.avg_fps) {
            status.push_str(&format!(" ({:.2} fps, avg {:.2} fps", fps, avg));
            if let Some(eta) = self.eta {
                status.push_str(&format!(", ETA: {}", format_duration(eta as f64)));
            }
            status.push(')');
        }
        status
    }
}

pub fn parse_encode_progress(line: &str) -> Option<EncodeProgress> {
    let caps = TASK_RE.captures(line)?;
    let mut progress = EncodeProgress {
        task: caps[1].parse().ok()?,
        total_tasks: caps[2].parse().ok()?,
        percent: caps[3].parse().ok()?,
        fps: None,
        avg_fps: None,
        eta: None,
    };

    if let Some(rate) = RATE_RE.captures(line) {
        progress.fps = rate[1].parse().ok();
        progress.avg_fps = rate[2].parse().ok();
        progress.eta = parse_eta(&rate[3]);
    }
    Some(progress)
}

/// `01h02m03s` -> 3723
pub fn parse_eta(value: &str) -> Option<u64> {
    let caps = ETA_RE.captures(value)?;
    let hours: u64 = caps[1].parse().ok()?;
    let minutes: u64 = caps[2].parse().ok()?;
    let seconds: u64 = caps[3].parse().ok()?;
    Some(hours * 3600 + minutes * 60 + seconds)
}

/// Overall percentage across all encode passes
fn overall_percent(progress: &EncodeProgress) -> u64 {
    let total = progress.total_tasks.max(1) as f64;
    let done = progress.task.saturating_sub(1) as f64;
    ((done + progress.percent / 100.0) / total * 100.0).floor() as u64
}

#[derive(Debug)]
pub struct TranscodeSummary {
    pub stats: RunStats,
    pub transcoded: Vec<PathBuf>,
}

pub struct HdrTranscoder<'a, R> {
    config: &'a TranscodeConfig,
    runner: &'a R,
    tools: &'a ToolSet,
    quiet: bool,
}

impl<'a, R: ToolRunner> HdrTranscoder<'a, R> {
    pub fn new(config: &'a TranscodeConfig, runner: &'a R, tools: &'a ToolSet, quiet: bool) -> Self {
        Self {
            config,
            runner,
            tools,
            quiet,
        }
    }

    pub fn required_tools() -> &'static [Tool] {
        &[Tool::HandBrake]
    }

    /// Final and temporary output paths for `input`
    pub fn output_paths(&self, input: &Path) -> (PathBuf, PathBuf) {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let folder = match &self.config.output {
            Some(output) => output.clone(),
            None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        (
            folder.join(format!("{}{}.mkv", stem, OUTPUT_SUFFIX)),
            folder.join(format!("{}{}.temp.mkv", stem, OUTPUT_SUFFIX)),
        )
    }

    pub async fn run(&self) -> anyhow::Result<TranscodeSummary> {
        let list = self.config.resolved_file_list()?;
        let files = FileManager::read_path_list(&list).await?;
        info!("🎬 Transcoding {} files listed in {}", files.len(), list.display());

        if let Some(output) = &self.config.output {
            fs::create_dir_all(output).await?;
        }

        let mut stats = RunStats::new();
        let mut transcoded = Vec::new();
        let total = files.len();

        for (idx, file) in files.iter().enumerate() {
            let name = file.display().to_string();
            let outcome = match self.transcode_file(file, idx, total).await {
                Ok(outcome) => outcome,
                Err(e) => FileOutcome::Failed(e.to_string()),
            };

            match &outcome {
                FileOutcome::Processed => {
                    info!("✅ [{}/{}] {} transcoded", idx + 1, total, name);
                    transcoded.push(self.output_paths(file).0);
                }
                FileOutcome::Skipped(reason) => {
                    info!("⏭️ [{}/{}] {} skipped: {}", idx + 1, total, name, reason)
                }
                FileOutcome::Failed(error) => {
                    warn!("❌ [{}/{}] {} failed: {}", idx + 1, total, name, error)
                }
            }
            stats.record(&name, &outcome);
        }

        info!("📊 {}", stats.format_summary());
        Ok(TranscodeSummary { stats, transcoded })
    }

    pub async fn transcode_file(&self, input: &Path, idx: usize, total: usize) -> Result<FileOutcome> {
        if !input.is_file() {
            return Ok(FileOutcome::Skipped(SkipReason::MissingSource));
        }

        let (output, temp) = self.output_paths(input);
        if output.exists() {
            return Ok(FileOutcome::Skipped(SkipReason::OutputExists));
        }
        if temp.exists() {
            debug!("Removing stale temp file {}", temp.display());
            fs::remove_file(&temp).await?;
        }

        let invocation = ToolInvocation::new(
            self.tools,
            Tool::HandBrake,
            args![
                "--preset-import-file", self.config.preset,
                "--preset", self.config.preset_name,
                "-i", input,
                "-o", temp,
            ],
        );

        let log_path = self.log_path(input);
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let log = EncodeLog::create(&log_path).await?;
        log.line(format!("Starting transcoding: {}", input.display()));
        log.line(format!("Command: {}", invocation.command_line()));

        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let progress = ProgressManager::percent(&format!("{}/{}", idx + 1, total), self.quiet);
        progress.set_message(&file_name);

        let result = self
            .runner
            .run_streaming(&invocation, StreamSource::Stdout, |line| {
                log.line(line);
                if let Some(encode) = parse_encode_progress(line) {
                    progress.set_position(overall_percent(&encode));
                    progress.set_message(&format!("{} - {}", file_name, encode.status()));
                }
            })
            .await;

        let output_result = match result {
            Ok(output_result) => output_result,
            Err(e) => {
                progress.clear();
                log.line(format!("Failed to transcode: {}", e));
                log.finish(&log_path).await;
                return Err(e);
            }
        };
        if !output_result.stderr.trim().is_empty() {
            log.line(output_result.stderr.trim_end());
        }

        if !output_result.success {
            progress.clear();
            log.line(format!("Failed to transcode: {}", input.display()));
            log.finish(&log_path).await;
            return Ok(FileOutcome::Failed(format!(
                "HandBrakeCLI exited with code {}",
                output_result.code.unwrap_or(-1)
            )));
        }
        if !temp.exists() {
            progress.clear();
            log.line(format!("No output produced: {}", temp.display()));
            log.finish(&log_path).await;
            return Ok(FileOutcome::Failed("HandBrakeCLI produced no output".to_string()));
        }

        fs::rename(&temp, &output).await?;
        fs::rename(input, FileManager::with_appended_suffix(input, TO_BE_DELETED_SUFFIX)).await?;
        log.line(format!("Transcoding completed: {}", output.display()));
        log.finish(&log_path).await;

        progress.finish(&format!(
            "{} - completed in {}",
            file_name,
            format_duration(output_result.elapsed.as_secs_f64())
        ));
        Ok(FileOutcome::Processed)
    }

    fn log_path(&self, input: &Path) -> PathBuf {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("logs")
            .join(format!("{}_{}_handbrake.log", compact_timestamp(), name))
    }
}

/// Per-file HandBrake log, written by a background task so the
/// progress callback never blocks on disk
struct EncodeLog {
    lines: mpsc::UnboundedSender<String>,
    writer: JoinHandle<std::io::Result<()>>,
}

impl EncodeLog {
    async fn create(path: &Path) -> Result<Self> {
        let file = fs::File::create(path).await?;
        let (lines, mut pending) = mpsc::unbounded_channel::<String>();
        let writer = tokio::spawn(async move {
            let mut out = BufWriter::new(file);
            while let Some(line) = pending.recv().await {
                out.write_all(line.as_bytes()).await?;
                out.write_all(b"\n").await?;
            }
            out.flush().await
        });
        Ok(Self { lines, writer })
    }

    fn line(&self, line: impl Into<String>) {
        // A closed channel means the writer already failed; `close` reports it
        let _ = self.lines.send(line.into());
    }

    /// Flush and close the log, returning the first write error
    async fn close(self) -> std::io::Result<()> {
        drop(self.lines);
        self.writer.await.map_err(std::io::Error::other)?
    }

    /// Close the log; write errors never fail the encode, they are only reported
    async fn finish(self, path: &Path) {
        if let Err(e) = self.close().await {
            warn!("⚠️  Could not write log {}: {}", path.display(), e);
        }
    }
}
