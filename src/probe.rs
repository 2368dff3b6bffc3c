//! # Media Probe Module
//!
//! Questo modulo interroga `ffprobe` e modella il suo output JSON.
//!
//! ## Responsabilità:
//! - Esecuzione di `ffprobe -print_format json -show_format -show_streams`
//! - Modello tipizzato (`ProbeOutput`, `ProbeFormat`, `ProbeStream`) con serde
//! - Derivazione di `MediaFile`: durata, bitrate, codec, risoluzione, HDR, bit depth
//! - Query leggera della sola durata per health check e re-encode
//!
//! ## Regole di estrazione:
//! - Bitrate video: `bit_rate` dello stream video, altrimenti quello del container
//! - HDR: `color_transfer` uguale a `smpte2084` (PQ) o `arib-std-b67` (HLG)
//! - Bit depth: `bits_per_raw_sample`, poi `pix_fmt`, poi `profile`
//!
//! ## Esempio:
//! ```rust,ignore
//! let prober = Prober::new(&ProcessRunner, &tools);
//! let probe = prober.probe(&path).await?;
//! let media = MediaFile::from_probe(&path, size, &probe)?;
//! ```

use crate::args;
use crate::error::{MediaToolError, Result};
use crate::platform::{Tool, ToolSet};
use crate::runner::{ToolInvocation, ToolRunner};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Transfer characteristics that mark HDR content
pub const HDR_TRANSFERS: &[&str] = &["smpte2084", "arib-std-b67"];

/// Top-level `ffprobe -of json` document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeOutput {
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ProbeFormat>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeFormat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeStream {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec_long_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pix_fmt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_space: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_transfer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_primaries: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_frame_rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bits_per_raw_sample: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub disposition: BTreeMap<String, i64>,
}

impl ProbeOutput {
    /// Parse ffprobe's JSON; malformed documents are metadata errors
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| MediaToolError::Metadata(format!("invalid ffprobe JSON: {}", e)))
    }

    pub fn streams_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a ProbeStream> + 'a {
        self.streams
            .iter()
            .filter(move |s| s.codec_type.as_deref() == Some(kind))
    }

    pub fn video_stream(&self) -> Option<&ProbeStream> {
        self.streams_of("video").next()
    }

    pub fn duration(&self) -> Option<f64> {
        self.format
            .as_ref()?
            .duration
            .as_deref()?
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0)
    }

    pub fn container_bit_rate(&self) -> Option<u64> {
        parse_u64(self.format.as_ref()?.bit_rate.as_deref())
    }

    pub fn container_size(&self) -> Option<u64> {
        parse_u64(self.format.as_ref()?.size.as_deref())
    }

    /// Video stream bitrate, falling back to the container's overall bitrate
    pub fn video_bit_rate(&self) -> Option<u64> {
        self.video_stream()
            .and_then(|s| parse_u64(s.bit_rate.as_deref()))
            .or_else(|| self.container_bit_rate())
    }

    /// Copy without the per-track statistics tags that mkvmerge writes
    pub fn without_statistics_tags(&self) -> Self {
        let mut reduced = self.clone();
        if let Some(format) = reduced.format.as_mut() {
            strip_statistics_tags(&mut format.tags);
        }
        for stream in &mut reduced.streams {
            strip_statistics_tags(&mut stream.tags);
        }
        reduced
    }
}

impl ProbeStream {
    /// `avg_frame_rate` as a decimal; `0/0` and garbage yield `None`
    pub fn frame_rate(&self) -> Option<f64> {
        parse_frame_rate(self.avg_frame_rate.as_deref()?)
    }

    pub fn is_hdr(&self) -> bool {
        self.color_transfer
            .as_deref()
            .map(|t| HDR_TRANSFERS.contains(&t.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    pub fn bit_depth(&self) -> Option<u32> {
        if let Some(bits) = parse_u64(self.bits_per_raw_sample.as_deref()) {
            return u32::try_from(bits).ok();
        }

        if let Some(pix_fmt) = self.pix_fmt.as_deref() {
            for (marker, bits) in [("p10", 10), ("p12", 12), ("p14", 14), ("p16", 16)] {
                if pix_fmt.contains(marker) {
                    return Some(bits);
                }
            }
            if ["yuv420p", "yuvj420p", "yuv422p", "yuv444p", "yuvj444p"].contains(&pix_fmt) {
                return Some(8);
            }
        }

        let profile = self.profile.as_deref()?.to_lowercase();
        if profile.contains("10") {
            Some(10)
        } else if profile.contains("12") {
            Some(12)
        } else if profile.contains("high") || profile.contains("main") {
            Some(8)
        } else {
            None
        }
    }

    pub fn language(&self) -> &str {
        self.tags.get("language").map(String::as_str).unwrap_or("und")
    }

    pub fn is_default(&self) -> bool {
        self.disposition.get("default").copied() == Some(1)
    }

    pub fn is_forced(&self) -> bool {
        self.disposition.get("forced").copied() == Some(1) || self.title_contains("forced")
    }

    pub fn is_commentary(&self) -> bool {
        self.disposition.get("comment").copied() == Some(1) || self.title_contains("commentary")
    }

    /// Dolby Atmos, as reported in the codec name, the profile or any tag value
    pub fn is_atmos(&self) -> bool {
        let mentions = |value: &str| value.to_lowercase().contains("atmos");
        self.codec_name.as_deref().is_some_and(mentions)
            || self.profile.as_deref().is_some_and(mentions)
            || self.tags.values().any(|value| mentions(value))
    }

    fn title_contains(&self, needle: &str) -> bool {
        self.tags
            .get("title")
            .is_some_and(|title| title.to_lowercase().contains(needle))
    }
}

/// Parse `num/den` or a plain decimal frame rate
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

fn parse_u64(value: Option<&str>) -> Option<u64> {
    let value = value?.trim();
    value
        .parse::<u64>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().filter(|v| *v >= 0.0).map(|v| v as u64))
}

fn strip_statistics_tags(tags: &mut BTreeMap<String, String>) {
    const PREFIXES: &[&str] = &["_STATISTICS", "BPS", "DURATION", "NUMBER_OF_FRAMES", "NUMBER_OF_BYTES"];
    tags.retain(|key, _| !PREFIXES.iter().any(|p| key.to_uppercase().starts_with(p)));
}

/// A probed media file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaFile {
    pub path: PathBuf,
    pub extension: String,
    pub size: u64,
    pub duration: Option<f64>,
    pub bitrate: Option<u64>,
    pub codec: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub container: Option<String>,
    pub hdr: bool,
    pub bit_depth: Option<u32>,
    pub frame_rate: Option<f64>,
}

impl MediaFile {
    /// Build from a probe result; a document without `format` is unreadable metadata
    pub fn from_probe(path: &Path, size: u64, probe: &ProbeOutput) -> Result<Self> {
        let format = probe.format.as_ref().ok_or_else(|| {
            MediaToolError::Metadata(format!("no format section for {}", path.display()))
        })?;
        let video = probe.video_stream();

        Ok(Self {
            path: path.to_path_buf(),
            extension: path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default(),
            size,
            duration: probe.duration(),
            bitrate: probe.video_bit_rate(),
            codec: video.and_then(|v| v.codec_name.clone()),
            width: video.and_then(|v| v.width),
            height: video.and_then(|v| v.height),
            container: format.format_name.clone(),
            hdr: video.map(ProbeStream::is_hdr).unwrap_or(false),
            bit_depth: video.and_then(ProbeStream::bit_depth),
            frame_rate: video.and_then(ProbeStream::frame_rate),
        })
    }

    pub fn resolution(&self) -> Option<String> {
        Some(format!("{}x{}", self.width?, self.height?))
    }

    pub fn resolution_category(&self) -> &'static str {
        resolution_category(self.width.unwrap_or(0), self.height.unwrap_or(0))
    }
}

/// 8K, 4K, 1080p, 720p, 480p or SD
pub fn resolution_category(width: u32, height: u32) -> &'static str {
    const CATEGORIES: &[(&str, u32, u32)] = &[
        ("8K", 7680, 4320),
        ("4K", 3840, 2160),
        ("1080p", 1920, 1080),
        ("720p", 1280, 720),
        ("480p", 720, 480),
    ];
    CATEGORIES
        .iter()
        .find(|(_, w, h)| width >= *w && height >= *h)
        .map(|(name, _, _)| *name)
        .unwrap_or("SD")
}

/// Runs ffprobe through a `ToolRunner`
pub struct Prober<'a, R> {
    runner: &'a R,
    tools: &'a ToolSet,
    timeout: Option<Duration>,
}

impl<'a, R: ToolRunner> Prober<'a, R> {
    pub fn new(runner: &'a R, tools: &'a ToolSet) -> Self {
        Self {
            runner,
            tools,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn invocation(&self, args: Vec<OsString>) -> ToolInvocation {
        let invocation = ToolInvocation::new(self.tools, Tool::Ffprobe, args);
        match self.timeout {
            Some(timeout) => invocation.with_timeout(timeout),
            None => invocation,
        }
    }

    /// Raw JSON text of `-show_format -show_streams`
    pub async fn probe_raw(&self, path: &Path) -> Result<String> {
        let invocation = self.invocation(args![
            "-v", "quiet",
            "-print_format", "json",
            "-show_format",
            "-show_streams",
            path,
        ]);
        let output = self.runner.run(&invocation).await?.into_success()?;
        Ok(output.stdout)
    }

    pub async fn probe(&self, path: &Path) -> Result<ProbeOutput> {
        ProbeOutput::from_json(&self.probe_raw(path).await?)
    }

    /// Container duration in seconds
    pub async fn duration(&self, path: &Path) -> Result<f64> {
        let invocation = self.invocation(args![
            "-v", "error",
            "-show_entries", "format=duration",
            "-of", "default=noprint_wrappers=1:nokey=1",
            path,
        ]);
        let output = self.runner.run(&invocation).await?.into_success()?;
        output
            .stdout
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d > 0.0)
            .ok_or_else(|| {
                MediaToolError::Metadata(format!("could not determine duration for {}", path.display()))
            })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::{ok_stdout, ScriptedRunner};

    #[test]
    fn test_parse_hdr_movie() {
        let probe = ProbeOutput::from_json(&fixtures::hdr_movie_json(Some(45_000_000), 59_000_000)).unwrap();
        let media = MediaFile::from_probe(Path::new("/media/movie.MKV"), 42, &probe).unwrap();

        assert_eq!(media.extension, "mkv");
        assert_eq!(media.codec.as_deref(), Some("hevc"));
        assert_eq!(media.bitrate, Some(45_000_000));
        assert_eq!(media.duration, Some(7200.0));
        assert_eq!(media.resolution().as_deref(), Some("3840x2160"));
        assert_eq!(media.resolution_category(), "4K");
        assert!(media.hdr);
        assert_eq!(media.bit_depth, Some(10));
        assert!((media.frame_rate.unwrap() - 23.976).abs() < 0.001);
        assert_eq!(probe.streams_of("audio").count(), 2);
        assert!(probe.streams_of("audio").next().unwrap().is_default());
    }

    #[test]
    fn test_stream_flags() {
        let json = r#"{"streams": [
            {"codec_type": "audio", "codec_name": "truehd", "profile": "Dolby TrueHD + Dolby Atmos"},
            {"codec_type": "audio", "codec_name": "eac3", "tags": {"title": "Director's Commentary"}},
            {"codec_type": "audio", "codec_name": "ac3", "disposition": {"comment": 1}},
            {"codec_type": "subtitle", "codec_name": "subrip", "disposition": {"forced": 1}},
            {"codec_type": "subtitle", "codec_name": "subrip", "tags": {"title": "Forced"}},
            {"codec_type": "audio", "codec_name": "aac", "tags": {"title": "English ATMOS mix"}}
        ]}"#;
        let probe = ProbeOutput::from_json(json).unwrap();
        let atmos: Vec<bool> = probe.streams_of("audio").map(ProbeStream::is_atmos).collect();
        assert_eq!(atmos, vec![true, false, false, true]);
        let commentary: Vec<bool> = probe.streams_of("audio").map(ProbeStream::is_commentary).collect();
        assert_eq!(commentary, vec![false, true, true, false]);
        assert!(probe.streams_of("subtitle").all(ProbeStream::is_forced));
    }

    #[test]
    fn test_bitrate_falls_back_to_container() {
        let probe = ProbeOutput::from_json(&fixtures::hdr_movie_json(None, 59_000_000)).unwrap();
        assert_eq!(probe.video_bit_rate(), Some(59_000_000));
    }

    #[test]
    fn test_malformed_json_is_metadata_error() {
        let err = ProbeOutput::from_json("not json").unwrap_err();
        assert!(matches!(err, MediaToolError::Metadata(_)));

        let empty = ProbeOutput::from_json("{}").unwrap();
        assert!(matches!(
            MediaFile::from_probe(Path::new("a.mkv"), 0, &empty),
            Err(MediaToolError::Metadata(_))
        ));
    }

    #[test]
    fn test_statistics_tags_are_stripped() {
        let probe = ProbeOutput::from_json(&fixtures::hdr_movie_json(None, 1)).unwrap();
        let reduced = probe.without_statistics_tags();
        let tags = &reduced.streams[0].tags;
        assert!(!tags.contains_key("BPS-eng"));
        assert_eq!(tags.get("title").map(String::as_str), Some("Main"));
    }

    #[test]
    fn test_frame_rate_and_categories() {
        assert_eq!(parse_frame_rate("25/1"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("29.97"), Some(29.97));
        assert_eq!(parse_frame_rate("n/a"), None);
        assert_eq!(resolution_category(1920, 800), "720p");
        assert_eq!(resolution_category(1920, 1080), "1080p");
        assert_eq!(resolution_category(640, 360), "SD");
        assert_eq!(resolution_category(7680, 4320), "8K");
    }

    #[tokio::test]
    async fn test_prober_duration() {
        let runner = ScriptedRunner::new(|_| Ok(ok_stdout(Tool::Ffprobe, "5400.120000\n")));
        let tools = ToolSet::default();
        let prober = Prober::new(&runner, &tools);

        let duration = prober.duration(Path::new("/m/a.mkv")).await.unwrap();
        assert!((duration - 5400.12).abs() < 1e-9);

        let call = &runner.calls()[0];
        assert_eq!(call.tool, Tool::Ffprobe);
        assert_eq!(call.last_path(), Some(Path::new("/m/a.mkv")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_duration_lookup_keeps_non_utf8_path() {
        use std::os::unix::ffi::OsStrExt;

        let runner = ScriptedRunner::new(|_| Ok(ok_stdout(Tool::Ffprobe, "12.0\n")));
        let tools = ToolSet::default();
        let path = Path::new(std::ffi::OsStr::from_bytes(b"/m/Am\xe9lie.mkv"));

        Prober::new(&runner, &tools).duration(path).await.unwrap();
        assert_eq!(runner.calls()[0].last_path(), Some(path));
    }

    #[tokio::test]
    async fn test_prober_rejects_empty_duration() {
        let runner = ScriptedRunner::new(|_| Ok(ok_stdout(Tool::Ffprobe, "N/A\n")));
        let tools = ToolSet::default();
        let err = Prober::new(&runner, &tools)
            .duration(Path::new("broken.mkv"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaToolError::Metadata(_)));
    }
}
