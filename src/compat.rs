//! # Playback Compatibility Check
//!
//! Questo modulo segnala i file che la maggior parte dei client non riesce a
//! riprodurre senza transcodifica: codec video diverso da h264/hevc, primo
//! audio diverso da aac/ac3/mp3, container insoliti o stream mancanti.

use crate::config::CompatConfig;
use crate::file_manager::FileManager;
use crate::platform::{Tool, ToolSet};
use crate::probe::{ProbeOutput, Prober};
use crate::runner::ToolRunner;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const STANDARD_VIDEO_CODECS: &[&str] = &["h264", "hevc"];
pub const STANDARD_AUDIO_CODECS: &[&str] = &["aac", "ac3", "mp3"];
pub const STANDARD_CONTAINERS: &[&str] = &["matroska,webm", "mov,mp4,m4a,3gp,3g2,mj2"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompatIssue {
    VideoCodec(String),
    AudioCodec(String),
    Container(String),
    NoVideoStream,
    NoAudioStream,
}

impl fmt::Display for CompatIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompatIssue::VideoCodec(codec) => write!(f, "Non-standard video codec: {}", codec),
            CompatIssue::AudioCodec(codec) => write!(f, "Non-standard audio codec: {}", codec),
            CompatIssue::Container(format) => write!(f, "Non-standard container format: {}", format),
            CompatIssue::NoVideoStream => f.write_str("No video stream found"),
            CompatIssue::NoAudioStream => f.write_str("No audio stream found"),
        }
    }
}

/// Issues found in one probe result; empty means the file plays everywhere
pub fn check_probe(probe: &ProbeOutput) -> Vec<CompatIssue> {
    let mut issues = Vec::new();

    match probe.video_stream() {
        Some(video) => {
            let codec = video.codec_name.as_deref().unwrap_or("unknown");
            if !STANDARD_VIDEO_CODECS.contains(&codec) {
                issues.push(CompatIssue::VideoCodec(codec.to_string()));
            }
        }
        None => issues.push(CompatIssue::NoVideoStream),
    }

    match probe.streams_of("audio").next() {
        Some(audio) => {
            let codec = audio.codec_name.as_deref().unwrap_or("unknown");
            if !STANDARD_AUDIO_CODECS.contains(&codec) {
                issues.push(CompatIssue::AudioCodec(codec.to_string()));
            }
        }
        None => issues.push(CompatIssue::NoAudioStream),
    }

    let container = probe
        .format
        .as_ref()
        .and_then(|f| f.format_name.as_deref())
        .unwrap_or("unknown");
    if !STANDARD_CONTAINERS.contains(&container) {
        issues.push(CompatIssue::Container(container.to_string()));
    }

    issues
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompatStatus {
    Compatible,
    Issues(Vec<CompatIssue>),
    Unreadable(String),
}

#[derive(Debug, Clone)]
pub struct CompatReport {
    pub path: PathBuf,
    pub status: CompatStatus,
}

impl fmt::Display for CompatReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.display();
        match &self.status {
            CompatStatus::Compatible => write!(f, "No issues found in {}", path),
            CompatStatus::Issues(issues) => {
                let joined: Vec<String> = issues.iter().map(ToString::to_string).collect();
                write!(f, "Issues found in {}: {}", path, joined.join(", "))
            }
            CompatStatus::Unreadable(error) => {
                write!(f, "Error: {} - Unable to analyze file ({})", path, error)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct CompatSummary {
    pub reports: Vec<CompatReport>,
    pub compatible: usize,
    pub with_issues: usize,
    pub unreadable: usize,
}

impl CompatSummary {
    pub fn format_summary(&self) -> String {
        format!(
            "Compatible: {} | With issues: {} | Unreadable: {} | Total: {}",
            self.compatible,
            self.with_issues,
            self.unreadable,
            self.reports.len()
        )
    }
}

pub struct CompatChecker<'a, R> {
    config: &'a CompatConfig,
    runner: &'a R,
    tools: &'a ToolSet,
}

impl<'a, R: ToolRunner> CompatChecker<'a, R> {
    pub fn new(config: &'a CompatConfig, runner: &'a R, tools: &'a ToolSet) -> Self {
        Self {
            config,
            runner,
            tools,
        }
    }

    pub fn required_tools() -> &'static [Tool] {
        &[Tool::Ffprobe]
    }

    /// Check every media file, printing one line per file to stdout
    pub async fn run(&self) -> anyhow::Result<CompatSummary> {
        let files = FileManager::find_media_files(&self.config.input, &self.config.extensions)?;
        info!("🔍 Checking {} files in {}", files.len(), self.config.input.display());

        let mut summary = CompatSummary::default();
        for file in &files {
            let report = self.check_file(file).await;
            println!("{}", report);
            match &report.status {
                CompatStatus::Compatible => summary.compatible += 1,
                CompatStatus::Issues(_) => summary.with_issues += 1,
                CompatStatus::Unreadable(_) => summary.unreadable += 1,
            }
            summary.reports.push(report);
        }

        info!("📊 {}", summary.format_summary());
        Ok(summary)
    }

    pub async fn check_file(&self, file: &Path) -> CompatReport {
        let status = match Prober::new(self.runner, self.tools).probe(file).await {
            Ok(probe) => {
                let issues = check_probe(&probe);
                if issues.is_empty() {
                    CompatStatus::Compatible
                } else {
                    CompatStatus::Issues(issues)
                }
            }
            Err(e) => {
                warn!("Unable to analyze {}: {}", file.display(), e);
                CompatStatus::Unreadable(e.to_string())
            }
        };
        CompatReport {
            path: file.to_path_buf(),
            status,
        }
    }
}
