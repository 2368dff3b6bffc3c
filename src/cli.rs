//! # Command Line Interface
//!
//! Definizione dei subcommand con `clap` derive e conversione dei flag nelle
//! struct di configurazione di ogni utility.
//!
//! ## Flag globali:
//! - `-v/--verbose`: log DEBUG
//! - `-q/--quiet`: solo WARN, progress bar nascoste
//! - `--settings`: file JSON con i path dei tool esterni
//!
//! ## Esempio di utilizzo:
//! ```bash
//! media-tools inspect /media/transcoded -c /media/originals --video-samples 2
//! media-tools inventory /media/movies --hdr-list
//! media-tools health-check -i /media/movies -s 3 -d 30
//! ```

use crate::comparison::{Thresholds, DEFAULT_LOWER_THRESHOLD, DEFAULT_UPPER_THRESHOLD};
use crate::config::{
    CompatConfig, FixHealthConfig, HealthCheckConfig, InspectConfig, InventoryConfig, LinkConfig,
    TranscodeConfig, DEFAULT_HEALTH_CHECK_EXTENSIONS, DEFAULT_INSPECT_EXTENSIONS,
    DEFAULT_INVENTORY_EXTENSIONS, DEFAULT_PRESET_NAME,
};
use crate::file_manager::ExtensionFilter;
use crate::report::parse_delimiter;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "media-tools")]
#[command(version, about = "Inspect, catalog, health-check and transcode a video library")]
pub struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only warnings and errors, no progress bars
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file with tool path overrides
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract screenshots and clips to compare transcodes with their originals
    Inspect(InspectArgs),
    /// Write a CSV inventory and statistics of a media folder
    Inventory(InventoryArgs),
    /// Decode files with ffmpeg and report corruption
    HealthCheck(HealthCheckArgs),
    /// Transcode HDR files to SDR with HandBrakeCLI
    Transcode(TranscodeArgs),
    /// Re-encode files that failed a health check
    FixHealth(FixHealthArgs),
    /// Create a folder of symlinks from a list of paths
    Link(LinkArgs),
    /// Report files with codecs or containers most players cannot direct play
    Compat(CompatArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Folder of files to inspect
    pub input_path: PathBuf,

    /// Folder of originals with the same relative layout
    #[arg(short, long)]
    pub compare_path: Option<PathBuf>,

    /// Where samples are written
    #[arg(short, long, default_value = "./samples")]
    pub sample_path: PathBuf,

    /// Where the CSV report is written
    #[arg(long, default_value = "./csv")]
    pub csv_path: PathBuf,

    /// Screenshots per file
    #[arg(short = 'n', long, default_value = "5")]
    pub screenshot_samples: usize,

    /// Video clips per file
    #[arg(long, default_value = "3")]
    pub video_samples: usize,

    /// Clip length in seconds
    #[arg(short = 'l', long, default_value = "10")]
    pub video_length: u64,

    /// Delete existing samples and regenerate them
    #[arg(short, long)]
    pub force: bool,

    /// Re-probe and resample every file, ignoring sidecars and thresholds
    #[arg(long)]
    pub force_all: bool,

    /// File extensions to include
    #[arg(short, long, num_args = 1.., value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Ratio (%) below which a transcode is sampled
    #[arg(long, default_value_t = DEFAULT_LOWER_THRESHOLD)]
    pub lower_threshold: f64,

    /// Ratio (%) above which a transcode is sampled
    #[arg(long, default_value_t = DEFAULT_UPPER_THRESHOLD)]
    pub upper_threshold: f64,

    /// Sample every file regardless of its bitrate ratio
    #[arg(long)]
    pub ignore_thresholds: bool,

    /// Sample files inside the thresholds too
    #[arg(long)]
    pub force_video_samples: bool,

    /// Timeout for each ffmpeg call in seconds
    #[arg(long, default_value = "30")]
    pub ffmpeg_timeout: u64,
}

impl InspectArgs {
    pub fn into_config(self) -> InspectConfig {
        let extensions = match self.extensions {
            Some(list) => ExtensionFilter::new(list),
            None => ExtensionFilter::new(DEFAULT_INSPECT_EXTENSIONS),
        };
        InspectConfig {
            input_path: self.input_path,
            compare_path: self.compare_path,
            sample_path: self.sample_path,
            csv_path: self.csv_path,
            screenshot_samples: self.screenshot_samples,
            video_samples: self.video_samples,
            video_length: self.video_length,
            force: self.force || self.force_all,
            thresholds: Thresholds {
                lower: self.lower_threshold,
                upper: self.upper_threshold,
                ignore_thresholds: self.ignore_thresholds,
                force_video_samples: self.force_video_samples,
                force_all: self.force_all,
            },
            extensions,
            ffmpeg_timeout: Duration::from_secs(self.ffmpeg_timeout),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    /// Folder to scan recursively
    pub root_folder: PathBuf,

    /// Comma-separated extensions
    #[arg(short, long, default_value = DEFAULT_INVENTORY_EXTENSIONS)]
    pub extensions: String,

    /// Output folder
    #[arg(short = 'd', long, default_value = "./output")]
    pub output_dir: PathBuf,

    /// Custom CSV file name
    #[arg(short, long)]
    pub output: Option<String>,

    /// CSV delimiter: a single character, `\t` or `tab`
    #[arg(long, default_value = "\\t", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Keep the complete ffprobe JSON in the CSV
    #[arg(long)]
    pub full_ffprobe: bool,

    /// Pretty-print the ffprobe JSON
    #[arg(long)]
    pub pretty_json: bool,

    /// Also write hdr-video-files.txt
    #[arg(long)]
    pub hdr_list: bool,
}

impl InventoryArgs {
    pub fn into_config(self) -> InventoryConfig {
        InventoryConfig {
            root_folder: self.root_folder,
            extensions: ExtensionFilter::parse_list(&self.extensions),
            output_dir: self.output_dir,
            output_name: self.output,
            delimiter: self.delimiter,
            full_ffprobe: self.full_ffprobe,
            pretty_json: self.pretty_json,
            hdr_list: self.hdr_list,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct HealthCheckArgs {
    /// Folder to check
    #[arg(short, long)]
    pub input: PathBuf,

    /// Samples per file
    #[arg(short, long, default_value = "1")]
    pub samples: usize,

    /// Seconds decoded per sample; the whole file when omitted
    #[arg(short, long)]
    pub duration: Option<u64>,

    /// Comma-separated extensions
    #[arg(short, long, default_value = DEFAULT_HEALTH_CHECK_EXTENSIONS)]
    pub extensions: String,

    /// Report folder
    #[arg(short, long, default_value = "output-health-check")]
    pub output: PathBuf,
}

impl HealthCheckArgs {
    pub fn into_config(self) -> HealthCheckConfig {
        HealthCheckConfig {
            input: self.input,
            samples: self.samples,
            duration: self.duration,
            extensions: ExtensionFilter::parse_list(&self.extensions),
            output: self.output,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct TranscodeArgs {
    /// Working folder holding hdr-video-files.txt
    #[arg(short, long, required_unless_present = "file_list")]
    pub input: Option<PathBuf>,

    /// List of files to transcode; takes precedence over --input
    #[arg(short, long)]
    pub file_list: Option<PathBuf>,

    /// HandBrake preset JSON
    #[arg(short, long)]
    pub preset: PathBuf,

    /// Preset name inside the JSON
    #[arg(long, default_value = DEFAULT_PRESET_NAME)]
    pub preset_name: String,

    /// Output folder; next to each source when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl TranscodeArgs {
    pub fn into_config(self) -> TranscodeConfig {
        TranscodeConfig {
            input: self.input,
            file_list: self.file_list,
            preset: self.preset,
            preset_name: self.preset_name,
            output: self.output,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct FixHealthArgs {
    /// List of files to re-encode
    #[arg(short, long)]
    pub file_list: PathBuf,

    /// ffmpeg video encoder
    #[arg(long, default_value = "hevc_videotoolbox")]
    pub video_codec: String,

    /// Encoder quality (`-q:v`)
    #[arg(long, default_value = "50")]
    pub quality: u32,

    /// AAC bitrate
    #[arg(long, default_value = "384k")]
    pub audio_bitrate: String,
}

impl FixHealthArgs {
    pub fn into_config(self) -> FixHealthConfig {
        FixHealthConfig {
            file_list: self.file_list,
            video_codec: self.video_codec,
            quality: self.quality,
            audio_bitrate: self.audio_bitrate,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    /// File containing one path per line
    #[arg(short, long)]
    pub file: PathBuf,

    /// Folder receiving the links
    #[arg(short, long, default_value = "./symlinks")]
    pub output: PathBuf,

    /// Copy files instead of linking them
    #[arg(long)]
    pub copy: bool,

    /// Skip files whose folder contains a `to_be_deleted` file
    #[arg(long)]
    pub skip_marked: bool,
}

impl LinkArgs {
    pub fn into_config(self) -> LinkConfig {
        LinkConfig {
            file_list: self.file,
            output: self.output,
            copy: self.copy,
            skip_marked: self.skip_marked,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CompatArgs {
    /// Folder to scan recursively
    pub input: PathBuf,

    /// Comma-separated extensions
    #[arg(short, long, default_value = DEFAULT_INVENTORY_EXTENSIONS)]
    pub extensions: String,
}

impl CompatArgs {
    pub fn into_config(self) -> CompatConfig {
        CompatConfig {
            input: self.input,
            extensions: ExtensionFilter::parse_list(&self.extensions),
        }
    }
}
