//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione di ogni utility.
//!
//! ## Responsabilità:
//! - Una struct di configurazione per subcommand, con `Default` e `validate()`
//! - `ToolkitSettings`: file JSON opzionale con i path dei tool esterni
//! - Valori di default allineati ai flag della CLI
//!
//! ## Validazione:
//! - I path di input devono esistere prima di toccare qualsiasi file
//! - `lower_threshold <= upper_threshold`
//! - Numero di campioni, durate e timeout devono essere positivi
//! - Delimitatore CSV: un singolo carattere ASCII
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = InspectConfig {
//!     input_path: PathBuf::from("/media/transcoded"),
//!     compare_path: Some(PathBuf::from("/media/originals")),
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::comparison::Thresholds;
use crate::file_manager::ExtensionFilter;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_INSPECT_EXTENSIONS: &[&str] = &[
    ".mkv", ".mp4", ".avi", ".mov", ".wmv", ".flv", ".webm", ".m4v", ".mpeg", ".mpg", ".m2ts", ".ts",
];
pub const DEFAULT_INVENTORY_EXTENSIONS: &str = "mkv,mp4,avi,mov";
pub const DEFAULT_HEALTH_CHECK_EXTENSIONS: &str = "mp4,mkv,avi,mov,flv,wmv";
pub const HDR_LIST_FILE_NAME: &str = "hdr-video-files.txt";
pub const DEFAULT_PRESET_NAME: &str = "4k mkv HDR to SDR";

fn require_dir(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        return Err(anyhow!("{} does not exist: {}", what, path.display()));
    }
    if !path.is_dir() {
        return Err(anyhow!("{} is not a directory: {}", what, path.display()));
    }
    Ok(())
}

fn require_file(path: &Path, what: &str) -> Result<()> {
    if !path.is_file() {
        return Err(anyhow!("{} not found: {}", what, path.display()));
    }
    Ok(())
}

/// Quality inspection settings
#[derive(Debug, Clone)]
pub struct InspectConfig {
    /// Folder of files to inspect (the transcodes in comparison mode)
    pub input_path: PathBuf,
    /// Folder of originals mirrored by relative path
    pub compare_path: Option<PathBuf>,
    pub sample_path: PathBuf,
    pub csv_path: PathBuf,
    pub screenshot_samples: usize,
    pub video_samples: usize,
    /// Clip length in seconds
    pub video_length: u64,
    /// Delete existing samples and regenerate
    pub force: bool,
    pub thresholds: Thresholds,
    pub extensions: ExtensionFilter,
    pub ffmpeg_timeout: Duration,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("."),
            compare_path: None,
            sample_path: PathBuf::from("./samples"),
            csv_path: PathBuf::from("./csv"),
            screenshot_samples: 5,
            video_samples: 3,
            video_length: 10,
            force: false,
            thresholds: Thresholds::default(),
            extensions: ExtensionFilter::new(DEFAULT_INSPECT_EXTENSIONS),
            ffmpeg_timeout: Duration::from_secs(30),
        }
    }
}

impl InspectConfig {
    pub fn validate(&self) -> Result<()> {
        require_dir(&self.input_path, "Input path")?;
        if let Some(compare) = &self.compare_path {
            require_dir(compare, "Compare path")?;
        }
        self.thresholds.validate()?;

        if self.video_samples > 0 && self.video_length == 0 {
            return Err(anyhow!("Video sample length must be greater than 0"));
        }
        if self.ffmpeg_timeout.is_zero() {
            return Err(anyhow!("FFmpeg timeout must be greater than 0"));
        }
        if self.extensions.is_empty() {
            return Err(anyhow!("At least one file extension is required"));
        }
        Ok(())
    }

    pub fn comparison_mode(&self) -> bool {
        self.compare_path.is_some()
    }
}

/// Media inventory settings
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub root_folder: PathBuf,
    pub extensions: ExtensionFilter,
    pub output_dir: PathBuf,
    /// Custom CSV file name inside `output_dir`
    pub output_name: Option<String>,
    pub delimiter: u8,
    pub full_ffprobe: bool,
    pub pretty_json: bool,
    pub hdr_list: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            root_folder: PathBuf::from("."),
            extensions: ExtensionFilter::parse_list(DEFAULT_INVENTORY_EXTENSIONS),
            output_dir: PathBuf::from("./output"),
            output_name: None,
            delimiter: b'\t',
            full_ffprobe: false,
            pretty_json: false,
            hdr_list: false,
        }
    }
}

impl InventoryConfig {
    pub fn validate(&self) -> Result<()> {
        require_dir(&self.root_folder, "Root folder")?;
        if self.extensions.is_empty() {
            return Err(anyhow!("At least one file extension is required"));
        }
        if !self.delimiter.is_ascii() || self.delimiter == b'"' || self.delimiter == b'\n' {
            return Err(anyhow!("Unsupported CSV delimiter"));
        }
        Ok(())
    }
}

/// Playback health check settings
#[derive(Debug, Clone)]
pub struct HealthCheckConfig {
    pub input: PathBuf,
    pub samples: usize,
    /// Window length in seconds; `None` checks the whole file
    pub duration: Option<u64>,
    pub extensions: ExtensionFilter,
    pub output: PathBuf,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("."),
            samples: 1,
            duration: None,
            extensions: ExtensionFilter::parse_list(DEFAULT_HEALTH_CHECK_EXTENSIONS),
            output: PathBuf::from("output-health-check"),
        }
    }
}

impl HealthCheckConfig {
    pub fn validate(&self) -> Result<()> {
        require_dir(&self.input, "Input folder")?;
        if self.samples == 0 {
            return Err(anyhow!("Number of samples must be at least 1"));
        }
        if self.duration == Some(0) {
            return Err(anyhow!("Sample duration must be greater than 0"));
        }
        Ok(())
    }

    /// `30s` or `full`, as used in the report name
    pub fn duration_label(&self) -> String {
        match self.duration {
            Some(seconds) => format!("{}s", seconds),
            None => "full".to_string(),
        }
    }
}

/// HandBrake HDR to SDR settings
#[derive(Debug, Clone)]
pub struct TranscodeConfig {
    /// Working folder holding the default file list
    pub input: Option<PathBuf>,
    pub file_list: Option<PathBuf>,
    pub preset: PathBuf,
    pub preset_name: String,
    /// Output folder; next to each source when absent
    pub output: Option<PathBuf>,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            input: None,
            file_list: None,
            preset: PathBuf::new(),
            preset_name: DEFAULT_PRESET_NAME.to_string(),
            output: None,
        }
    }
}

impl TranscodeConfig {
    /// Explicit list, or `<input>/hdr-video-files.txt`
    pub fn resolved_file_list(&self) -> Result<PathBuf> {
        match (&self.file_list, &self.input) {
            (Some(list), _) => Ok(list.clone()),
            (None, Some(input)) => Ok(input.join(HDR_LIST_FILE_NAME)),
            (None, None) => Err(anyhow!("Either an input folder or a file list is required")),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(input) = &self.input {
            require_dir(input, "Input folder")?;
        }
        require_file(&self.resolved_file_list()?, "File list")?;
        require_file(&self.preset, "Preset file")?;
        if self.preset_name.trim().is_empty() {
            return Err(anyhow!("Preset name must not be empty"));
        }
        Ok(())
    }
}

/// ffmpeg re-encode settings for files that failed a health check
#[derive(Debug, Clone)]
pub struct FixHealthConfig {
    pub file_list: PathBuf,
    pub video_codec: String,
    pub quality: u32,
    pub audio_bitrate: String,
}

impl Default for FixHealthConfig {
    fn default() -> Self {
        Self {
            file_list: PathBuf::new(),
            video_codec: "hevc_videotoolbox".to_string(),
            quality: 50,
            audio_bitrate: "384k".to_string(),
        }
    }
}

impl FixHealthConfig {
    pub fn validate(&self) -> Result<()> {
        require_file(&self.file_list, "File list")?;
        if self.video_codec.trim().is_empty() {
            return Err(anyhow!("Video codec must not be empty"));
        }
        if self.quality > 100 {
            return Err(anyhow!("Quality must be between 0 and 100"));
        }
        let bitrate = self.audio_bitrate.trim_end_matches(['k', 'K']);
        if bitrate.is_empty() || bitrate.parse::<u32>().is_err() {
            return Err(anyhow!("Audio bitrate must look like 384k"));
        }
        Ok(())
    }
}

/// Symlink preparation settings
#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub file_list: PathBuf,
    pub output: PathBuf,
    /// Copy instead of linking
    pub copy: bool,
    /// Skip sources whose folder holds a `to_be_deleted` marker
    pub skip_marked: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            file_list: PathBuf::new(),
            output: PathBuf::from("./symlinks"),
            copy: false,
            skip_marked: false,
        }
    }
}

impl LinkConfig {
    pub fn validate(&self) -> Result<()> {
        require_file(&self.file_list, "File list")?;
        if self.output.exists() && !self.output.is_dir() {
            return Err(anyhow!("Output path is not a directory: {}", self.output.display()));
        }
        Ok(())
    }
}

/// Playback compatibility report settings
#[derive(Debug, Clone)]
pub struct CompatConfig {
    pub input: PathBuf,
    pub extensions: ExtensionFilter,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("."),
            extensions: ExtensionFilter::parse_list(DEFAULT_INVENTORY_EXTENSIONS),
        }
    }
}

impl CompatConfig {
    pub fn validate(&self) -> Result<()> {
        require_dir(&self.input, "Input folder")
    }
}

/// Optional JSON settings shared by every subcommand
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitSettings {
    /// Executable overrides keyed by tool name (`ffmpeg`, `ffprobe`, `HandBrakeCLI`)
    pub tools: HashMap<String, PathBuf>,
}

impl ToolkitSettings {
    /// `<config dir>/media-tools/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("media-tools").join("settings.json"))
    }

    /// Load settings from file; a missing file means defaults
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let settings: ToolkitSettings = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Invalid settings file {}: {}", path.display(), e))?;
        Ok(settings)
    }

    /// Explicit path when given, otherwise the default location
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                require_file(path, "Settings file")?;
                Self::from_file(path).await
            }
            None => match Self::default_path() {
                Some(path) => Self::from_file(&path).await,
                None => Ok(Self::default()),
            },
        }
    }

    /// Save settings to file
    #[cfg(test)]
    pub(crate) async fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
