//! # Media Inventory
//!
//! Questo modulo cataloga una libreria video in un CSV, una riga per file.
//!
//! ## Responsabilità:
//! - Probe di ogni file con ffprobe e costruzione di `InventoryRow`
//! - Sottotitoli esterni nella stessa cartella (`.srt`, `.sub`, `.idx`, `.ass`, `.ssa`)
//! - Codici lingua normalizzati a ISO 639-2 (`en` -> `eng`), vedi `languages`
//! - Output JSON grezzo di ffprobe, ridotto o completo (`--full-ffprobe`)
//! - File di statistiche e, opzionalmente, la lista dei file HDR
//!
//! ## Nomi dei file:
//! - `<YYYYmmdd-HHMMSS> - <cartella>.csv`
//! - `<YYYYmmdd-HHMMSS> - <cartella> - statistics.txt`
//! - `hdr-video-files.txt` (con `--hdr-list`)

pub mod languages;
pub mod statistics;

use crate::config::{InventoryConfig, HDR_LIST_FILE_NAME};
use crate::error::{MediaToolError, Result};
use crate::file_manager::FileManager;
use crate::platform::{Tool, ToolSet};
use crate::probe::{MediaFile, ProbeOutput, ProbeStream, Prober};
use crate::progress::ProgressManager;
use crate::report::{delimiter_label, file_timestamp, CsvReport};
use crate::runner::ToolRunner;
use crate::utils::{bps_to_mbps, bytes_to_gb, round_to};
use chrono::{DateTime, Local};
use languages::{dedup_languages, foreign_languages, normalize_language, subtitle_file_language};
use serde::Serialize;
use statistics::InventoryStatistics;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "sub", "idx", "ass", "ssa"];

/// One row of the inventory CSV
#[derive(Debug, Clone, Serialize)]
pub struct InventoryRow {
    #[serde(rename = "File")]
    pub file: String,
    #[serde(rename = "Extension")]
    pub extension: String,
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Filesize (in GB)")]
    pub size_gb: f64,
    #[serde(rename = "Container Format")]
    pub container: String,
    #[serde(rename = "Video Codec")]
    pub video_codec: String,
    #[serde(rename = "Profile")]
    pub profile: String,
    #[serde(rename = "Level")]
    pub level: String,
    #[serde(rename = "Overall Bitrate (in mbps)")]
    pub overall_bitrate_mbps: f64,
    #[serde(rename = "Video bitrate (in mbps)")]
    pub video_bitrate_mbps: f64,
    #[serde(rename = "BPPPF")]
    pub bits_per_pixel_per_frame: f64,
    #[serde(rename = "Width")]
    pub width: u32,
    #[serde(rename = "Height")]
    pub height: u32,
    #[serde(rename = "Color Space")]
    pub color_space: String,
    #[serde(rename = "HDR")]
    pub hdr: String,
    #[serde(rename = "Bits")]
    pub bits: String,
    #[serde(rename = "Duration")]
    pub duration: String,
    #[serde(rename = "Frame Rate")]
    pub frame_rate: f64,
    #[serde(rename = "Audio Languages")]
    pub audio_languages: String,
    #[serde(rename = "Audio Languages dedup")]
    pub audio_languages_dedup: String,
    #[serde(rename = "Non eng/nor languages")]
    pub foreign_languages: String,
    #[serde(rename = "Audio Languages details")]
    pub audio_details: String,
    #[serde(rename = "Default language")]
    pub default_language: String,
    #[serde(rename = "Audio Codecs")]
    pub audio_codecs: String,
    #[serde(rename = "Audio Channels")]
    pub audio_channels: String,
    #[serde(rename = "Audio Channel Layouts")]
    pub audio_channel_layouts: String,
    #[serde(rename = "Audio Sample Rates")]
    pub audio_sample_rates: String,
    #[serde(rename = "Audio Bitrates")]
    pub audio_bitrates: String,
    #[serde(rename = "Audio Stream Count")]
    pub audio_stream_count: usize,
    #[serde(rename = "Subtitle Languages")]
    pub all_subtitle_languages: String,
    #[serde(rename = "Subtitle languages in file")]
    pub subtitle_languages: String,
    #[serde(rename = "Subtitle formats in file")]
    pub subtitle_formats: String,
    #[serde(rename = "Subtitle stream count in file")]
    pub subtitle_stream_count: usize,
    #[serde(rename = "Subtitles in folder")]
    pub folder_subtitles: String,
    #[serde(rename = "Creation Date")]
    pub creation_date: String,
    #[serde(rename = "Modification Date")]
    pub modification_date: String,
    #[serde(rename = "Raw ffprobe output")]
    pub raw_ffprobe: String,
}

fn or_unknown(value: Option<&str>) -> String {
    value.unwrap_or("unknown").to_string()
}

impl InventoryRow {
    pub fn build(
        media: &MediaFile,
        probe: &ProbeOutput,
        modified: Option<DateTime<Local>>,
        folder_subtitles: &[String],
        raw_ffprobe: String,
    ) -> Self {
        let video = probe.video_stream();
        let audio: Vec<_> = probe.streams_of("audio").collect();
        let subtitles: Vec<_> = probe.streams_of("subtitle").collect();
        let format = probe.format.as_ref();

        let width = media.width.unwrap_or(0);
        let height = media.height.unwrap_or(0);
        let frame_rate = media.frame_rate.unwrap_or(0.0);
        let video_bitrate = media.bitrate.unwrap_or(0);
        let bpppf = if width > 0 && height > 0 && frame_rate > 0.0 {
            video_bitrate as f64 / (width as f64 * height as f64 * frame_rate)
        } else {
            0.0
        };

        let kbps = |s: &ProbeStream| {
            s.bit_rate
                .as_deref()
                .and_then(|b| b.parse::<f64>().ok())
                .unwrap_or(0.0)
                / 1000.0
        };
        let audio_details = audio
            .iter()
            .map(|s| {
                format!(
                    "{}: {}, {}ch ({}), {}Hz, {:.0}kbps",
                    s.language(),
                    s.codec_name.as_deref().unwrap_or("unknown"),
                    s.channels.unwrap_or(0),
                    s.channel_layout.as_deref().unwrap_or("unknown"),
                    s.sample_rate.as_deref().unwrap_or("unknown"),
                    kbps(*s)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        let deduped = dedup_languages(audio.iter().map(|s| s.language()));

        let all_subtitle_languages: BTreeSet<String> = subtitles
            .iter()
            .map(|s| normalize_language(s.language()))
            .chain(folder_subtitles.iter().filter_map(|name| subtitle_file_language(name)))
            .collect();

        Self {
            file: media
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            extension: if media.extension.is_empty() {
                String::new()
            } else {
                format!(".{}", media.extension)
            },
            path: media
                .path
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            size_gb: bytes_to_gb(media.size),
            container: or_unknown(media.container.as_deref()),
            video_codec: or_unknown(media.codec.as_deref()),
            profile: or_unknown(video.and_then(|v| v.profile.as_deref())),
            level: video
                .and_then(|v| v.level)
                .map(|l| l.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            overall_bitrate_mbps: probe.container_bit_rate().map(bps_to_mbps).unwrap_or(0.0),
            video_bitrate_mbps: bps_to_mbps(video_bitrate),
            bits_per_pixel_per_frame: round_to(bpppf, 6),
            width,
            height,
            color_space: or_unknown(video.and_then(|v| v.color_space.as_deref())),
            hdr: if media.hdr { "Yes" } else { "No" }.to_string(),
            bits: media
                .bit_depth
                .map(|b| b.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            duration: media
                .duration
                .map(|d| format!("{:.3}", d))
                .unwrap_or_else(|| "unknown".to_string()),
            frame_rate: round_to(frame_rate, 2),
            audio_languages: audio.iter().map(|s| s.language()).collect::<Vec<_>>().join(", "),
            audio_languages_dedup: deduped.join(", "),
            foreign_languages: foreign_languages(&deduped).join(", "),
            audio_details,
            default_language: audio
                .iter()
                .find(|s| s.is_default())
                .map(|s| s.language().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            audio_codecs: audio
                .iter()
                .map(|s| s.codec_name.as_deref().unwrap_or("unknown"))
                .collect::<Vec<_>>()
                .join(", "),
            audio_channels: audio
                .iter()
                .map(|s| s.channels.unwrap_or(0).to_string())
                .collect::<Vec<_>>()
                .join(", "),
            audio_channel_layouts: audio
                .iter()
                .map(|s| s.channel_layout.as_deref().unwrap_or("unknown"))
                .collect::<Vec<_>>()
                .join(", "),
            audio_sample_rates: audio
                .iter()
                .map(|s| s.sample_rate.as_deref().unwrap_or("unknown"))
                .collect::<Vec<_>>()
                .join(", "),
            audio_bitrates: audio
                .iter()
                .map(|s| format!("{:.0}", kbps(*s)))
                .collect::<Vec<_>>()
                .join(", "),
            audio_stream_count: audio.len(),
            all_subtitle_languages: all_subtitle_languages.into_iter().collect::<Vec<_>>().join(", "),
            subtitle_languages: subtitles.iter().map(|s| s.language()).collect::<Vec<_>>().join(", "),
            subtitle_formats: subtitles
                .iter()
                .map(|s| s.codec_name.as_deref().unwrap_or("unknown"))
                .collect::<Vec<_>>()
                .join(", "),
            subtitle_stream_count: subtitles.len(),
            folder_subtitles: folder_subtitles.join(", "),
            creation_date: or_unknown(
                format.and_then(|f| f.tags.get("creation_time")).map(String::as_str),
            ),
            modification_date: modified
                .map(|m| m.format("%Y-%m-%dT%H:%M:%S").to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            raw_ffprobe,
        }
    }
}

/// Subtitle files beside `file` whose name starts with its stem
pub fn folder_subtitles(file: &Path) -> Vec<String> {
    let (Some(dir), Some(stem)) = (file.parent(), file.file_stem()) else {
        return Vec::new();
    };
    let stem = stem.to_string_lossy();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut found: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(stem.as_ref()))
        .filter(|name| {
            Path::new(name)
                .extension()
                .map(|ext| {
                    let ext = ext.to_string_lossy().to_lowercase();
                    SUBTITLE_EXTENSIONS.contains(&ext.as_str())
                })
                .unwrap_or(false)
        })
        .collect();
    found.sort();
    found
}

/// Everything gathered for one file
struct InventoriedFile {
    row: InventoryRow,
    media: MediaFile,
    probe: ProbeOutput,
    subtitles: Vec<String>,
}

#[derive(Debug)]
pub struct InventorySummary {
    pub csv_path: PathBuf,
    pub stats_path: PathBuf,
    pub hdr_list_path: Option<PathBuf>,
    pub statistics: InventoryStatistics,
}

pub struct MediaInventory<'a, R> {
    config: &'a InventoryConfig,
    runner: &'a R,
    tools: &'a ToolSet,
    quiet: bool,
}

impl<'a, R: ToolRunner> MediaInventory<'a, R> {
    pub fn new(config: &'a InventoryConfig, runner: &'a R, tools: &'a ToolSet, quiet: bool) -> Self {
        Self {
            config,
            runner,
            tools,
            quiet,
        }
    }

    pub fn required_tools() -> &'static [Tool] {
        &[Tool::Ffprobe]
    }

    /// CSV and statistics file names for this run
    pub fn output_names(&self, timestamp: &str) -> (String, String) {
        let folder = FileManager::sanitize_for_filename(&FileManager::folder_name(
            &self.config.root_folder,
        ));
        let csv_extension = self
            .config
            .output_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_else(|| ".csv".to_string());
        (
            format!("{} - {}{}", timestamp, folder, csv_extension),
            format!("{} - {} - statistics.txt", timestamp, folder),
        )
    }

    pub async fn run(&self) -> anyhow::Result<InventorySummary> {
        let start_time = std::time::Instant::now();
        info!("📚 Starting media inventory of {}", self.config.root_folder.display());

        let files = FileManager::find_media_files(&self.config.root_folder, &self.config.extensions)?;
        info!("Found {} video files to process", files.len());

        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        let (csv_name, stats_name) = self.output_names(&file_timestamp());
        let mut report = CsvReport::create(&self.config.output_dir.join(csv_name), self.config.delimiter)?;

        let progress = ProgressManager::new(files.len() as u64, self.quiet);
        let mut statistics = InventoryStatistics::new();
        let mut hdr_files = Vec::new();

        for file in &files {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            progress.set_message(&name);

            match self.inventory_file(file).await {
                Ok(InventoriedFile { row, media, probe, subtitles }) => {
                    report.write_row(&row)?;
                    statistics.record_file(&media, &probe, &subtitles);
                    if media.hdr {
                        hdr_files.push(std::path::absolute(file).unwrap_or_else(|_| file.clone()));
                    }
                }
                Err(e) => {
                    warn!("❌ Error processing {}: {}", file.display(), e);
                    statistics.record_failure(file, &e.to_string());
                }
            }
            progress.update(&name);
        }
        progress.finish(&format!(
            "Processed: {} | Failed: {}",
            statistics.files_processed, statistics.files_failed
        ));

        let csv_path = report.finish()?;
        let stats_path = self.config.output_dir.join(stats_name);
        tokio::fs::write(
            &stats_path,
            statistics.render(&self.config.root_folder, start_time.elapsed()),
        )
        .await?;

        let hdr_list_path = if self.config.hdr_list {
            Some(self.write_hdr_list(&hdr_files).await?)
        } else {
            None
        };

        info!(
            "✅ CSV file saved as: {} (Delimiter used: {})",
            csv_path.display(),
            delimiter_label(self.config.delimiter)
        );
        info!("📊 Statistics file saved as: {}", stats_path.display());

        Ok(InventorySummary {
            csv_path,
            stats_path,
            hdr_list_path,
            statistics,
        })
    }

    async fn inventory_file(&self, file: &Path) -> Result<InventoriedFile> {
        let metadata = tokio::fs::metadata(file).await?;
        let prober = Prober::new(self.runner, self.tools);
        let raw = prober.probe_raw(file).await?;
        let probe = ProbeOutput::from_json(&raw)?;
        let media = MediaFile::from_probe(file, metadata.len(), &probe)?;

        let raw_ffprobe = if self.config.full_ffprobe {
            let value: serde_json::Value = serde_json::from_str(&raw)
                .map_err(|e| MediaToolError::Metadata(e.to_string()))?;
            self.to_json(&value)?
        } else {
            self.to_json(&probe.without_statistics_tags())?
        };

        let modified = metadata.modified().ok().map(DateTime::<Local>::from);
        let subtitles = folder_subtitles(file);
        let row = InventoryRow::build(&media, &probe, modified, &subtitles, raw_ffprobe);
        debug!("Inventoried {}", file.display());
        Ok(InventoriedFile {
            row,
            media,
            probe,
            subtitles,
        })
    }

    fn to_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.config.pretty_json {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }

    async fn write_hdr_list(&self, hdr_files: &[PathBuf]) -> Result<PathBuf> {
        let path = self.config.output_dir.join(HDR_LIST_FILE_NAME);
        let mut content = format!(
            "# HDR video files under {} ({})\n",
            self.config.root_folder.display(),
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        for file in hdr_files {
            content.push_str(&file.display().to_string());
            content.push('\n');
        }
        tokio::fs::write(&path, content).await?;
        info!("🌈 {} HDR files listed in {}", hdr_files.len(), path.display());
        Ok(path)
    }
}
