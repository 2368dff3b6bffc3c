//! # Quality Inspector
//!
//! Questo modulo estrae screenshot e clip di confronto dai file di una libreria.
//!
//! ## Modalità:
//! - **Singola cartella**: screenshot e clip con mode `screen` e ratio `unknown`
//! - **Confronto** (`--compare-path`): ogni file viene associato all'originale
//!   con lo stesso path relativo; se il bitrate ratio cade dentro le soglie il
//!   file viene saltato, altrimenti si generano campioni per entrambi
//!   (`original` e `transcoded`)
//!
//! ## Flusso per file:
//! 1. Calcolo della directory dei campioni `<sample>/<cartella>/<rel>/<stem>`
//! 2. Sidecar `video_info.json` riusato se le dimensioni coincidono, altrimenti probe
//! 3. Decisione sulle soglie: un file saltato conserva i campioni esistenti
//! 4. `--force`: rimozione degli artefatti esistenti, solo se si campiona di nuovo
//! 5. Screenshot e clip via ffmpeg con timeout
//! 6. Una riga CSV per file esaminato
//!
//! ## Esempio:
//! ```rust,ignore
//! let inspector = QualityInspector::new(&config, &ProcessRunner, &tools, quiet);
//! let summary = inspector.run().await?;
//! ```

pub mod sidecar;

use crate::args;
use crate::comparison::{ComparisonResult, Decision};
use crate::config::InspectConfig;
use crate::error::{MediaToolError, Result};
use crate::file_manager::FileManager;
use crate::platform::{Tool, ToolSet};
use crate::probe::Prober;
use crate::progress::{FileOutcome, ProgressManager, RunStats, SkipReason};
use crate::report::{file_timestamp, CsvReport};
use crate::runner::{ToolInvocation, ToolRunner};
use crate::sampling::{sample_timestamps, ArtifactKind, ArtifactMode, SampleArtifact};
use crate::utils::{bps_to_mbps, bytes_to_gb, round_to};
use serde::Serialize;
use sidecar::VideoInfoRecord;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SCREENSHOT_EXTENSIONS: &[&str] = &["png"];
const CLIP_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi"];

/// One row of the quality inspection CSV
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRow {
    #[serde(rename = "File")]
    pub file: String,
    #[serde(rename = "Relative Path")]
    pub relative_path: String,
    #[serde(rename = "Compare File")]
    pub compare_file: String,
    #[serde(rename = "Original Bitrate (Mbps)")]
    pub original_bitrate_mbps: Option<f64>,
    #[serde(rename = "Transcoded Bitrate (Mbps)")]
    pub transcoded_bitrate_mbps: Option<f64>,
    #[serde(rename = "Original Size (GB)")]
    pub original_size_gb: Option<f64>,
    #[serde(rename = "Transcoded Size (GB)")]
    pub transcoded_size_gb: Option<f64>,
    #[serde(rename = "Bitrate Ratio (%)")]
    pub ratio: Option<f64>,
    #[serde(rename = "Decision")]
    pub decision: String,
    #[serde(rename = "Screenshots")]
    pub screenshots: usize,
    #[serde(rename = "Video Samples")]
    pub clips: usize,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Detail")]
    pub detail: String,
}

/// What happened to one inspected file
#[derive(Debug, Clone)]
pub struct FileReport {
    pub outcome: FileOutcome,
    pub comparison: Option<ComparisonResult>,
    pub transcoded_size: Option<u64>,
    pub compare_file: Option<PathBuf>,
    pub screenshots: usize,
    pub clips: usize,
}

impl FileReport {
    fn new(outcome: FileOutcome) -> Self {
        Self {
            outcome,
            comparison: None,
            transcoded_size: None,
            compare_file: None,
            screenshots: 0,
            clips: 0,
        }
    }
}

#[derive(Debug)]
pub struct InspectionSummary {
    pub stats: RunStats,
    pub csv_path: PathBuf,
}

/// Bitrates, sizes and duration of the file (and its counterpart)
struct MediaFacts {
    input_bitrate: Option<u64>,
    input_size: u64,
    compare_bitrate: Option<u64>,
    compare_size: Option<u64>,
    ratio: Option<f64>,
    duration: Option<f64>,
}

pub struct QualityInspector<'a, R> {
    config: &'a InspectConfig,
    runner: &'a R,
    tools: &'a ToolSet,
    quiet: bool,
    root_sample_path: PathBuf,
}

impl<'a, R: ToolRunner> QualityInspector<'a, R> {
    pub fn new(config: &'a InspectConfig, runner: &'a R, tools: &'a ToolSet, quiet: bool) -> Self {
        let root_sample_path = config
            .sample_path
            .join(FileManager::folder_name(&config.input_path));
        Self {
            config,
            runner,
            tools,
            quiet,
            root_sample_path,
        }
    }

    pub fn required_tools() -> &'static [Tool] {
        &[Tool::Ffmpeg, Tool::Ffprobe]
    }

    pub async fn run(&self) -> anyhow::Result<InspectionSummary> {
        let start_time = std::time::Instant::now();
        info!("🔎 Scanning {}", self.config.input_path.display());

        let files = FileManager::find_media_files(&self.config.input_path, &self.config.extensions)?;
        info!(
            "Found {} video files in {} directories",
            files.len(),
            FileManager::count_directories(&self.config.input_path)
        );
        if let Some(compare) = &self.config.compare_path {
            info!(
                "Comparison mode against {} (thresholds {}-{}%)",
                compare.display(),
                self.config.thresholds.lower,
                self.config.thresholds.upper
            );
        }

        tokio::fs::create_dir_all(&self.root_sample_path).await?;
        let csv_path = self
            .config
            .csv_path
            .join(format!("{}-quality-inspection.csv", file_timestamp()));
        let mut report = CsvReport::create(&csv_path, b',')?;

        let progress = ProgressManager::new(files.len() as u64, self.quiet);
        let mut stats = RunStats::new();

        for file in &files {
            let name = file_display_name(file);
            progress.set_message(&name);

            let file_report = match self.inspect_file(file).await {
                Ok(report) => report,
                Err(e) => FileReport::new(FileOutcome::Failed(e.to_string())),
            };

            match &file_report.outcome {
                FileOutcome::Processed => debug!(
                    "Created {} screenshots and {} video samples for {}",
                    file_report.screenshots, file_report.clips, name
                ),
                FileOutcome::Skipped(reason) => debug!("Skipping {}: {}", name, reason),
                FileOutcome::Failed(error) => warn!("❌ Failed {}: {}", name, error),
            }

            stats.record(&name, &file_report.outcome);
            stats.screenshots_created += file_report.screenshots;
            stats.clips_created += file_report.clips;
            report.write_row(&self.row_for(file, &file_report))?;
            progress.update(&name);
        }

        progress.finish(&stats.format_summary());
        info!(
            "✅ Inspection complete in {:.1}s: {}",
            start_time.elapsed().as_secs_f64(),
            stats.format_summary()
        );
        let csv_path = report.finish()?;
        info!("📄 Report written to {}", csv_path.display());

        Ok(InspectionSummary { stats, csv_path })
    }

    /// Directory holding the samples of `file`
    pub fn sample_dir_for(&self, file: &Path) -> PathBuf {
        let relative = FileManager::relative_to(file, &self.config.input_path);
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match relative.parent() {
            Some(parent) => self.root_sample_path.join(parent).join(stem),
            None => self.root_sample_path.join(stem),
        }
    }

    pub async fn inspect_file(&self, file: &Path) -> Result<FileReport> {
        let relative = FileManager::relative_to(file, &self.config.input_path);
        let compare_file = match &self.config.compare_path {
            Some(compare_root) => {
                let counterpart = compare_root.join(&relative);
                if !counterpart.is_file() {
                    return Ok(FileReport::new(FileOutcome::Skipped(SkipReason::NoCounterpart)));
                }
                Some(counterpart)
            }
            None => None,
        };

        let sample_dir = self.sample_dir_for(file);
        let thresholds = &self.config.thresholds;

        let facts = self.media_facts(file, compare_file.as_deref(), &sample_dir).await?;
        let comparison = compare_file.as_ref().map(|_| ComparisonResult {
            original_bitrate: facts.compare_bitrate,
            transcoded_bitrate: facts.input_bitrate,
            original_size: facts.compare_size.unwrap_or(0),
            transcoded_size: facts.input_size,
            ratio: facts.ratio,
            decision: thresholds.decide(facts.ratio),
        });

        let mut file_report = FileReport::new(FileOutcome::Processed);
        file_report.comparison = comparison.clone();
        file_report.transcoded_size = Some(facts.input_size);
        file_report.compare_file = compare_file.clone();

        if let Some(comparison) = &comparison {
            debug!(
                "Bitrate ratio for {}: {} -> {}",
                file.display(),
                comparison
                    .ratio
                    .map(|r| format!("{:.2}%", r))
                    .unwrap_or_else(|| "unknown".to_string()),
                comparison.decision
            );
            if comparison.decision == Decision::Skip {
                file_report.outcome = FileOutcome::Skipped(SkipReason::WithinThresholds);
                return Ok(file_report);
            }
        }

        let duration = facts.duration.ok_or_else(|| {
            MediaToolError::Metadata(format!("could not determine duration for {}", file.display()))
        })?;

        // Old samples go only once new ones are about to be written
        if self.config.force || thresholds.force_all {
            let mut removed = 0;
            for extensions in [SCREENSHOT_EXTENSIONS, CLIP_EXTENSIONS] {
                removed += FileManager::remove_files_with_extensions(&sample_dir, extensions).await?;
            }
            if removed > 0 {
                debug!("Removed {} existing samples from {}", removed, sample_dir.display());
            }
        }

        let want_screenshots = self.config.screenshot_samples > 0
            && !FileManager::directory_has_files(&sample_dir, SCREENSHOT_EXTENSIONS);
        let want_clips = self.config.video_samples > 0
            && !FileManager::directory_has_files(&sample_dir, CLIP_EXTENSIONS);

        if !want_screenshots && !want_clips {
            file_report.outcome = FileOutcome::Skipped(SkipReason::AlreadySampled);
            return Ok(file_report);
        }

        tokio::fs::create_dir_all(&sample_dir).await?;

        let ratio_tag = match &comparison {
            Some(comparison) => comparison.ratio_tag(),
            None => "unknown".to_string(),
        };

        if want_screenshots {
            for timestamp in sample_timestamps(duration, self.config.screenshot_samples) {
                file_report.screenshots += self
                    .extract_pair(ArtifactKind::Screenshot, file, compare_file.as_deref(), &sample_dir, &ratio_tag, timestamp)
                    .await;
            }
        }

        if want_clips {
            for timestamp in sample_timestamps(duration, self.config.video_samples) {
                file_report.clips += self
                    .extract_pair(ArtifactKind::Clip, file, compare_file.as_deref(), &sample_dir, &ratio_tag, timestamp)
                    .await;
            }
        }

        if file_report.screenshots + file_report.clips == 0 {
            file_report.outcome = FileOutcome::Failed("no samples created".to_string());
        }
        Ok(file_report)
    }

    /// Sidecar values when the sizes still match, fresh probes otherwise
    async fn media_facts(
        &self,
        file: &Path,
        compare_file: Option<&Path>,
        sample_dir: &Path,
    ) -> Result<MediaFacts> {
        let input_size = tokio::fs::metadata(file).await?.len();
        let compare_size = match compare_file {
            Some(path) => Some(tokio::fs::metadata(path).await?.len()),
            None => None,
        };

        if !self.config.thresholds.force_all {
            if let Some(record) = VideoInfoRecord::read(sample_dir).await {
                if record.matches_sizes(input_size, compare_size) && record.duration.is_some() {
                    debug!("Reusing stored video info for {}", file.display());
                    return Ok(MediaFacts {
                        input_bitrate: record.input_bitrate,
                        input_size,
                        compare_bitrate: record.compare_bitrate,
                        compare_size,
                        ratio: record.transcode_bitrate_ratio,
                        duration: record.duration,
                    });
                }
            }
        }

        let prober = Prober::new(self.runner, self.tools).with_timeout(self.config.ffmpeg_timeout);
        let input_probe = prober.probe(file).await?;
        let input_bitrate = input_probe.video_bit_rate();

        let compare_bitrate = match compare_file {
            Some(path) => match prober.probe(path).await {
                Ok(probe) => probe.video_bit_rate(),
                Err(e) => {
                    warn!("Could not read bitrate of {}: {}", path.display(), e);
                    None
                }
            },
            None => None,
        };

        let ratio = crate::comparison::bitrate_ratio(compare_bitrate, input_bitrate);
        let duration = input_probe.duration();

        VideoInfoRecord::new(input_bitrate, input_size, compare_bitrate, compare_size, ratio, duration)
            .write(sample_dir)
            .await?;

        Ok(MediaFacts {
            input_bitrate,
            input_size,
            compare_bitrate,
            compare_size,
            ratio,
            duration,
        })
    }

    /// Extract one artifact from each file of the pair, returning how many were written
    async fn extract_pair(
        &self,
        kind: ArtifactKind,
        file: &Path,
        compare_file: Option<&Path>,
        sample_dir: &Path,
        ratio_tag: &str,
        timestamp: f64,
    ) -> usize {
        let mut sources = Vec::with_capacity(2);
        match compare_file {
            Some(original) => {
                sources.push((original, ArtifactMode::Original));
                sources.push((file, ArtifactMode::Transcoded));
            }
            None => sources.push((file, ArtifactMode::Screen)),
        }

        let mut created = 0;
        for (source, mode) in sources {
            let artifact = SampleArtifact {
                kind,
                ratio_tag: ratio_tag.to_string(),
                timestamp,
                mode,
            };
            let output = artifact.path_in(sample_dir);

            match self.extract(kind, source, &output, timestamp).await {
                Ok(()) => created += 1,
                Err(e) => warn!("Error creating {} for {}: {}", artifact.file_name(), file_display_name(file), e),
            }
        }
        created
    }

    async fn extract(&self, kind: ArtifactKind, source: &Path, output: &Path, timestamp: f64) -> Result<()> {
        let args = match kind {
            ArtifactKind::Screenshot => args![
                "-ss", timestamp,
                "-i", source,
                "-frames:v", 1,
                output,
            ],
            ArtifactKind::Clip => args![
                "-ss", timestamp,
                "-i", source,
                "-t", self.config.video_length,
                "-c", "copy",
                output,
            ],
        };

        let invocation = ToolInvocation::new(self.tools, Tool::Ffmpeg, args)
            .with_timeout(self.config.ffmpeg_timeout);
        self.runner.run(&invocation).await?.into_success()?;
        Ok(())
    }

    fn row_for(&self, file: &Path, file_report: &FileReport) -> ComparisonRow {
        let comparison = file_report.comparison.as_ref();
        ComparisonRow {
            file: file_display_name(file),
            relative_path: FileManager::relative_to(file, &self.config.input_path)
                .display()
                .to_string(),
            compare_file: file_report
                .compare_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            original_bitrate_mbps: comparison.and_then(|c| c.original_bitrate).map(bps_to_mbps),
            transcoded_bitrate_mbps: comparison.and_then(|c| c.transcoded_bitrate).map(bps_to_mbps),
            original_size_gb: comparison.map(|c| bytes_to_gb(c.original_size)),
            transcoded_size_gb: file_report.transcoded_size.map(bytes_to_gb),
            ratio: comparison.and_then(|c| c.ratio).map(|r| round_to(r, 2)),
            decision: comparison.map(|c| c.decision.to_string()).unwrap_or_default(),
            screenshots: file_report.screenshots,
            clips: file_report.clips,
            status: file_report.outcome.label().to_string(),
            detail: file_report.outcome.detail(),
        }
    }
}

fn file_display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::Thresholds;
    use crate::file_manager::ExtensionFilter;
    use crate::probe::fixtures::hdr_movie_json;
    use crate::runner::testing::{failed, ok_stdout, ScriptedRunner};
    use crate::runner::ToolOutput;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Library {
        _root: TempDir,
        transcoded: PathBuf,
        originals: PathBuf,
        samples: PathBuf,
        csv: PathBuf,
    }

    fn library(files: &[&str]) -> Library {
        let root = TempDir::new().unwrap();
        let transcoded = root.path().join("transcoded");
        let originals = root.path().join("originals");
        for base in [&transcoded, &originals] {
            for file in files {
                let path = base.join(file);
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(&path, b"video").unwrap();
            }
        }
        Library {
            samples: root.path().join("samples"),
            csv: root.path().join("csv"),
            transcoded,
            originals,
            _root: root,
        }
    }

    /// ffprobe answers with `original_bps` for files under `originals`,
    /// ffmpeg writes its output file and succeeds
    fn media_runner(original_bps: u64, transcoded_bps: u64) -> ScriptedRunner {
        ScriptedRunner::new(move |invocation| {
            let last = invocation.last_path().unwrap().to_path_buf();
            match invocation.tool {
                Tool::Ffprobe => {
                    let bps = if last.to_string_lossy().contains("originals") {
                        original_bps
                    } else {
                        transcoded_bps
                    };
                    Ok(ok_stdout(Tool::Ffprobe, &hdr_movie_json(Some(bps), bps)))
                }
                _ => {
                    std::fs::write(&last, b"sample").unwrap();
                    Ok(ToolOutput {
                        tool: Some(invocation.tool),
                        success: true,
                        code: Some(0),
                        ..Default::default()
                    })
                }
            }
        })
    }

    fn config(lib: &Library, compare: bool) -> InspectConfig {
        InspectConfig {
            input_path: lib.transcoded.clone(),
            compare_path: compare.then(|| lib.originals.clone()),
            sample_path: lib.samples.clone(),
            csv_path: lib.csv.clone(),
            ffmpeg_timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    fn sample_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_single_folder_mode_creates_screen_samples() {
        let lib = library(&["Season 1/Episode.mkv"]);
        let cfg = config(&lib, false);
        let runner = media_runner(0, 8_000_000);
        let tools = ToolSet::default();

        let summary = QualityInspector::new(&cfg, &runner, &tools, true).run().await.unwrap();
        assert_eq!(summary.stats.files_processed, 1);
        assert_eq!(summary.stats.screenshots_created, 5);
        assert_eq!(summary.stats.clips_created, 3);

        let sample_dir = lib.samples.join("transcoded").join("Season 1").join("Episode");
        let names = sample_names(&sample_dir);
        assert!(names.contains(&"scr-unknown-00_20_00_000-screen.png".to_string()));
        assert!(names.contains(&"vid-unknown-00_30_00_000-screen.mp4".to_string()));
        assert!(names.contains(&"video_info.json".to_string()));

        let csv = std::fs::read_to_string(&summary.csv_path).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_rerun_without_force_reports_skipped() {
        let lib = library(&["Movie.mkv"]);
        let cfg = config(&lib, false);
        let tools = ToolSet::default();

        let first = media_runner(0, 8_000_000);
        QualityInspector::new(&cfg, &first, &tools, true).run().await.unwrap();

        let second = media_runner(0, 8_000_000);
        let summary = QualityInspector::new(&cfg, &second, &tools, true).run().await.unwrap();
        assert_eq!(summary.stats.files_skipped, 1);
        assert_eq!(summary.stats.files_failed, 0);
        assert!(second.calls().is_empty());
    }

    #[tokio::test]
    async fn test_force_regenerates_samples() {
        let lib = library(&["Movie.mkv"]);
        let tools = ToolSet::default();
        let cfg = config(&lib, false);
        QualityInspector::new(&cfg, &media_runner(0, 1), &tools, true).run().await.unwrap();

        let forced = InspectConfig { force: true, ..config(&lib, false) };
        let runner = media_runner(0, 1);
        let summary = QualityInspector::new(&forced, &runner, &tools, true).run().await.unwrap();
        assert_eq!(summary.stats.files_processed, 1);
        assert_eq!(runner.calls_to(Tool::Ffmpeg), 8);
        // Sidecar still matches, so nothing is probed again
        assert_eq!(runner.calls_to(Tool::Ffprobe), 0);
    }

    /// Samples a pair at ratio 80% regardless of thresholds, returning its sample dir
    async fn sampled_pair(lib: &Library) -> PathBuf {
        let cfg = InspectConfig {
            thresholds: Thresholds {
                ignore_thresholds: true,
                ..Default::default()
            },
            ..config(lib, true)
        };
        let tools = ToolSet::default();
        QualityInspector::new(&cfg, &media_runner(10_000_000, 8_000_000), &tools, true)
            .run()
            .await
            .unwrap();
        lib.samples.join("transcoded").join("Movie")
    }

    #[tokio::test]
    async fn test_force_keeps_samples_of_file_within_thresholds() {
        let lib = library(&["Movie.mkv"]);
        let sample_dir = sampled_pair(&lib).await;
        let before = sample_names(&sample_dir);
        assert_eq!(before.len(), 17);

        let forced = InspectConfig { force: true, ..config(&lib, true) };
        let runner = media_runner(10_000_000, 8_000_000);
        let tools = ToolSet::default();
        let summary = QualityInspector::new(&forced, &runner, &tools, true).run().await.unwrap();

        assert_eq!(summary.stats.files_skipped, 1);
        assert_eq!(runner.calls_to(Tool::Ffmpeg), 0);
        assert_eq!(sample_names(&sample_dir), before);
    }

    #[tokio::test]
    async fn test_force_keeps_samples_when_metadata_fails() {
        let lib = library(&["Movie.mkv"]);
        let sample_dir = sampled_pair(&lib).await;
        let before = sample_names(&sample_dir);

        let forced = InspectConfig {
            thresholds: Thresholds {
                force_all: true,
                ..Default::default()
            },
            ..config(&lib, true)
        };
        let runner = ScriptedRunner::new(|invocation| {
            Ok(failed(invocation.tool, "Invalid data found when processing input"))
        });
        let tools = ToolSet::default();
        let summary = QualityInspector::new(&forced, &runner, &tools, true).run().await.unwrap();

        assert_eq!(summary.stats.files_failed, 1);
        assert_eq!(runner.calls_to(Tool::Ffmpeg), 0);
        assert_eq!(sample_names(&sample_dir), before);
    }

    #[tokio::test]
    async fn test_comparison_within_thresholds_is_skipped() {
        let lib = library(&["Movie.mkv"]);
        let cfg = config(&lib, true);
        let runner = media_runner(10_000_000, 8_000_000);
        let tools = ToolSet::default();

        let summary = QualityInspector::new(&cfg, &runner, &tools, true).run().await.unwrap();
        assert_eq!(summary.stats.files_skipped, 1);
        assert_eq!(runner.calls_to(Tool::Ffmpeg), 0);
    }

    #[tokio::test]
    async fn test_comparison_outside_thresholds_samples_both_files() {
        let lib = library(&["Movie.mkv"]);
        let cfg = config(&lib, true);
        let runner = media_runner(10_000_000, 4_000_000);
        let tools = ToolSet::default();

        let summary = QualityInspector::new(&cfg, &runner, &tools, true).run().await.unwrap();
        assert_eq!(summary.stats.files_processed, 1);
        assert_eq!(summary.stats.screenshots_created, 10);
        assert_eq!(summary.stats.clips_created, 6);

        let names = sample_names(&lib.samples.join("transcoded").join("Movie"));
        assert!(names.contains(&"scr-40-00_20_00_000-original.png".to_string()));
        assert!(names.contains(&"scr-40-00_20_00_000-transcoded.png".to_string()));

        let record = VideoInfoRecord::read(&lib.samples.join("transcoded").join("Movie"))
            .await
            .unwrap();
        assert_eq!(record.transcode_bitrate_ratio, Some(40.0));
    }

    #[tokio::test]
    async fn test_ignore_thresholds_samples_inside_range() {
        let lib = library(&["Movie.mkv"]);
        let cfg = InspectConfig {
            thresholds: Thresholds {
                ignore_thresholds: true,
                ..Default::default()
            },
            ..config(&lib, true)
        };
        let runner = media_runner(10_000_000, 8_000_000);
        let tools = ToolSet::default();

        let summary = QualityInspector::new(&cfg, &runner, &tools, true).run().await.unwrap();
        assert_eq!(summary.stats.files_processed, 1);
    }

    #[tokio::test]
    async fn test_missing_counterpart_is_skipped() {
        let lib = library(&["Movie.mkv"]);
        std::fs::write(lib.transcoded.join("Extra.mkv"), b"video").unwrap();
        let cfg = InspectConfig {
            thresholds: Thresholds {
                ignore_thresholds: true,
                ..Default::default()
            },
            ..config(&lib, true)
        };
        let runner = media_runner(10_000_000, 8_000_000);
        let tools = ToolSet::default();

        let inspector = QualityInspector::new(&cfg, &runner, &tools, true);
        let report = inspector.inspect_file(&lib.transcoded.join("Extra.mkv")).await.unwrap();
        assert_eq!(report.outcome, FileOutcome::Skipped(SkipReason::NoCounterpart));
    }

    #[tokio::test]
    async fn test_extension_filter_limits_files() {
        let lib = library(&["a.mkv", "b.mp4"]);
        let cfg = InspectConfig {
            extensions: ExtensionFilter::new([".mkv"]),
            ..config(&lib, false)
        };
        let runner = media_runner(0, 1);
        let tools = ToolSet::default();

        let summary = QualityInspector::new(&cfg, &runner, &tools, true).run().await.unwrap();
        assert_eq!(summary.stats.total(), 1);
        assert!(lib.samples.join("transcoded").join("a").exists());
        assert!(!lib.samples.join("transcoded").join("b").exists());
    }

    #[tokio::test]
    async fn test_all_extractions_failing_marks_file_failed() {
        let lib = library(&["Movie.mkv"]);
        let cfg = config(&lib, false);
        let runner = ScriptedRunner::new(|invocation| match invocation.tool {
            Tool::Ffprobe => Ok(ok_stdout(Tool::Ffprobe, &hdr_movie_json(None, 1_000))),
            tool => Ok(failed(tool, "Invalid data found when processing input")),
        });
        let tools = ToolSet::default();

        let summary = QualityInspector::new(&cfg, &runner, &tools, true).run().await.unwrap();
        assert_eq!(summary.stats.files_failed, 1);
    }
}
