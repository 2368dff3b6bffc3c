//! # Playback Health Check
//!
//! Questo modulo decodifica i file video con ffmpeg per trovare corruzioni.
//!
//! ## Flusso:
//! 1. File ordinati per nome (case-insensitive)
//! 2. Durata via ffprobe; se non leggibile il file è `Failed`
//! 3. Per ogni campione: `ffmpeg -v error -ss START -t DUR -i FILE -f null -`
//! 4. Qualsiasi output su stderr indica un errore nel campione
//! 5. Una riga CSV per campione in
//!    `health_check_<ts>_samples<N>_duration<Ds|full>.csv`

use crate::args;
use crate::config::HealthCheckConfig;
use crate::error::Result;
use crate::file_manager::FileManager;
use crate::platform::{Tool, ToolSet};
use crate::probe::Prober;
use crate::progress::{FileOutcome, ProgressManager, RunStats};
use crate::report::{compact_timestamp, CsvReport};
use crate::runner::{ToolInvocation, ToolRunner};
use crate::sampling::health_check_windows;
use crate::utils::round_to;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckRow {
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "Full Path")]
    pub full_path: String,
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Sample")]
    pub sample: usize,
    #[serde(rename = "Start Time")]
    pub start_time: f64,
    #[serde(rename = "Error")]
    pub error: String,
    #[serde(rename = "Output")]
    pub output: String,
    #[serde(rename = "Check Duration (s)")]
    pub check_duration: f64,
}

impl HealthCheckRow {
    fn for_file(file: &Path) -> Self {
        Self {
            filename: file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            full_path: file.display().to_string(),
            path: file
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            sample: 0,
            start_time: 0.0,
            error: "no".to_string(),
            output: String::new(),
            check_duration: 0.0,
        }
    }

    pub fn has_error(&self) -> bool {
        self.error != "no"
    }
}

#[derive(Debug)]
pub struct HealthCheckSummary {
    pub stats: RunStats,
    /// Files with at least one sample reporting decode errors
    pub files_with_errors: Vec<PathBuf>,
    pub csv_path: PathBuf,
}

pub struct HealthChecker<'a, R> {
    config: &'a HealthCheckConfig,
    runner: &'a R,
    tools: &'a ToolSet,
    quiet: bool,
}

impl<'a, R: ToolRunner> HealthChecker<'a, R> {
    pub fn new(config: &'a HealthCheckConfig, runner: &'a R, tools: &'a ToolSet, quiet: bool) -> Self {
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

    pub fn report_name(&self, timestamp: &str) -> String {
        format!(
            "health_check_{}_samples{}_duration{}.csv",
            timestamp,
            self.config.samples,
            self.config.duration_label()
        )
    }

    /// Media files sorted by lowercase file name
    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = FileManager::find_media_files(&self.config.input, &self.config.extensions)?;
        files.sort_by_key(|path| {
            path.file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default()
        });
        Ok(files)
    }

    pub async fn run(&self) -> anyhow::Result<HealthCheckSummary> {
        let files = self.collect_files()?;
        info!(
            "🩺 Starting health check on {} video files in {}",
            files.len(),
            self.config.input.display()
        );

        let csv_path = self.config.output.join(self.report_name(&compact_timestamp()));
        let mut report = CsvReport::create(&csv_path, b',')?;
        let progress = ProgressManager::new(files.len() as u64, self.quiet);
        let mut stats = RunStats::new();
        let mut files_with_errors = Vec::new();

        for file in &files {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            progress.set_message(&name);

            let outcome = match self.check_file(file).await {
                Ok(rows) => {
                    if rows.iter().any(HealthCheckRow::has_error) {
                        warn!("⚠️ Decode errors found in {}", file.display());
                        files_with_errors.push(file.clone());
                    }
                    for row in &rows {
                        report.write_row(row)?;
                    }
                    FileOutcome::Processed
                }
                Err(e) => {
                    warn!("❌ Could not check {}: {}", file.display(), e);
                    let row = HealthCheckRow {
                        error: "yes".to_string(),
                        output: e.to_string(),
                        ..HealthCheckRow::for_file(file)
                    };
                    report.write_row(&row)?;
                    FileOutcome::Failed(e.to_string())
                }
            };

            stats.record(&name, &outcome);
            progress.update(&name);
        }

        progress.finish(&stats.format_summary());
        let csv_path = report.finish()?;
        info!(
            "✅ Health check completed: {} files with errors. Results saved to {}",
            files_with_errors.len(),
            csv_path.display()
        );

        Ok(HealthCheckSummary {
            stats,
            files_with_errors,
            csv_path,
        })
    }

    /// One row per sample window
    pub async fn check_file(&self, file: &Path) -> Result<Vec<HealthCheckRow>> {
        let duration = Prober::new(self.runner, self.tools).duration(file).await?;
        let window = self
            .config
            .duration
            .map(|d| d as f64)
            .unwrap_or(duration);

        let mut rows = Vec::with_capacity(self.config.samples);
        for (index, start) in health_check_windows(duration, window, self.config.samples)
            .into_iter()
            .enumerate()
        {
            let invocation = ToolInvocation::new(
                self.tools,
                Tool::Ffmpeg,
                args![
                    "-v", "error",
                    "-ss", start,
                    "-t", window,
                    "-i", file,
                    "-f", "null",
                    "-",
                ],
            );

            let started = Instant::now();
            let output = self.runner.run(&invocation).await?;
            let mut messages = output.stderr.trim().to_string();
            if messages.is_empty() && !output.success {
                messages = format!("ffmpeg exited with code {}", output.code.unwrap_or(-1));
            }

            rows.push(HealthCheckRow {
                sample: index + 1,
                start_time: round_to(start, 2),
                error: if messages.is_empty() { "no" } else { "yes" }.to_string(),
                output: messages,
                check_duration: round_to(started.elapsed().as_secs_f64(), 2),
                ..HealthCheckRow::for_file(file)
            });
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_manager::ExtensionFilter;
    use crate::runner::testing::{ok_stdout, ScriptedRunner};
    use crate::runner::ToolOutput;
    use tempfile::TempDir;

    fn runner() -> ScriptedRunner {
        ScriptedRunner::new(|invocation| {
            let target = invocation
                .args
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .find(|a| a.ends_with(".mkv") || a.ends_with(".mp4"))
                .unwrap_or_default();
            match invocation.tool {
                Tool::Ffprobe if target.ends_with("unreadable.mkv") => {
                    Ok(ok_stdout(Tool::Ffprobe, "N/A\n"))
                }
                Tool::Ffprobe => Ok(ok_stdout(Tool::Ffprobe, "100.0\n")),
                _ => Ok(ToolOutput {
                    tool: Some(Tool::Ffmpeg),
                    success: true,
                    code: Some(0),
                    stderr: if target.ends_with("Corrupt.mkv") {
                        "[h264 @ 0x1] error while decoding MB 10 5\n".to_string()
                    } else {
                        String::new()
                    },
                    ..Default::default()
                }),
            }
        })
    }

    fn setup(names: &[&str]) -> (TempDir, HealthCheckConfig) {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("library");
        std::fs::create_dir_all(input.join("sub")).unwrap();
        for name in names {
            std::fs::write(input.join(name), b"x").unwrap();
        }
        let config = HealthCheckConfig {
            input,
            output: dir.path().join("reports"),
            extensions: ExtensionFilter::parse_list("mkv,mp4"),
            ..Default::default()
        };
        (dir, config)
    }

    #[test]
    fn test_files_sorted_case_insensitively() {
        let (_dir, config) = setup(&["b.mkv", "sub/A.mkv", "c.mp4", "notes.txt"]);
        let runner = runner();
        let tools = ToolSet::default();
        let checker = HealthChecker::new(&config, &runner, &tools, true);

        let names: Vec<_> = checker
            .collect_files()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["A.mkv", "b.mkv", "c.mp4"]);
    }

    #[test]
    fn test_report_name() {
        let (_dir, mut config) = setup(&[]);
        let runner = runner();
        let tools = ToolSet::default();
        assert_eq!(
            HealthChecker::new(&config, &runner, &tools, true).report_name("20240101_120000"),
            "health_check_20240101_120000_samples1_durationfull.csv"
        );
        config.samples = 3;
        config.duration = Some(30);
        assert_eq!(
            HealthChecker::new(&config, &runner, &tools, true).report_name("20240101_120000"),
            "health_check_20240101_120000_samples3_duration30s.csv"
        );
    }

    #[tokio::test]
    async fn test_sample_windows_and_errors() {
        let (_dir, mut config) = setup(&["Corrupt.mkv"]);
        config.samples = 3;
        config.duration = Some(10);
        let runner = runner();
        let tools = ToolSet::default();
        let checker = HealthChecker::new(&config, &runner, &tools, true);

        let rows = checker.check_file(&config.input.join("Corrupt.mkv")).await.unwrap();
        let starts: Vec<f64> = rows.iter().map(|r| r.start_time).collect();
        assert_eq!(starts, vec![0.0, 45.0, 90.0]);
        assert!(rows.iter().all(HealthCheckRow::has_error));
        assert!(rows[0].output.contains("error while decoding"));

        let ffmpeg_args = &runner.calls()[1].args;
        assert_eq!(&ffmpeg_args[..4], &["-v", "error", "-ss", "0"]);
        assert_eq!(ffmpeg_args.last().unwrap(), "-");
    }

    #[tokio::test]
    async fn test_run_writes_one_row_per_sample() {
        let (_dir, mut config) = setup(&["Corrupt.mkv", "good.mkv", "unreadable.mkv"]);
        config.samples = 2;
        let runner = runner();
        let tools = ToolSet::default();

        let summary = HealthChecker::new(&config, &runner, &tools, true).run().await.unwrap();
        assert_eq!(summary.stats.files_processed, 2);
        assert_eq!(summary.stats.files_failed, 1);
        assert_eq!(summary.files_with_errors.len(), 1);

        let csv = std::fs::read_to_string(&summary.csv_path).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Filename,Full Path,Path,Sample,Start Time,Error,Output,Check Duration (s)")
        );
        // 2 samples for each readable file, 1 failure row
        assert_eq!(lines.count(), 5);
    }
}
