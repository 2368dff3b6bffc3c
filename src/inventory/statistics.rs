//! Aggregate statistics written next to the inventory CSV.
//!
//! Sections follow the order of the report: run, files, video, audio, subtitles.
//! Percentages are relative to the files processed; languages count once per file.

use super::languages::{dedup_languages, normalize_language, subtitle_file_language};
use crate::probe::{MediaFile, ProbeOutput, ProbeStream};
use crate::utils::{bps_to_mbps, bytes_to_gb, format_duration, format_size};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::path::Path;
use std::time::Duration;

const TOP_COUNT: usize = 10;

/// Stream counts from this value up share one bucket
const MAX_STREAM_BUCKET: usize = 4;

type Counter = BTreeMap<String, usize>;

/// The per-file values behind the top/bottom lists
#[derive(Debug, Clone, PartialEq)]
pub struct FileFacts {
    pub name: String,
    pub size: u64,
    pub duration: Option<f64>,
    pub video_bitrate: Option<u64>,
}

#[derive(Debug, Default)]
pub struct InventoryStatistics {
    pub files_processed: usize,
    pub files_failed: usize,
    pub failures: Vec<(String, String)>,
    pub total_size: u64,
    pub total_runtime: f64,
    pub total_frames: u64,
    pub total_pixels: u128,

    pub containers: Counter,
    pub files: Vec<FileFacts>,

    pub codecs: Counter,
    pub bit_depths: Counter,
    pub color_spaces: Counter,
    pub resolutions: Counter,
    pub resolution_categories: Counter,
    pub hdr_count: usize,
    pub sdr_count: usize,

    pub soundtrack_counts: Counter,
    pub audio_language_counts: Counter,
    pub audio_languages: Counter,
    pub single_language_files: Counter,
    pub channel_formats: Counter,
    pub channel_layouts: Counter,
    pub audio_formats: Counter,
    pub atmos_count: usize,
    pub commentary_count: usize,

    pub subtitle_streams: usize,
    pub subtitle_languages: Counter,
    pub subtitle_formats: Counter,
    pub folder_subtitle_languages: Counter,
    pub combined_subtitle_languages: Counter,
    pub missing_subtitles: usize,
    pub missing_eng_subtitles: usize,
    pub missing_nor_subtitles: usize,
    pub forced_subtitles: usize,
}

impl InventoryStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one probed file; `folder_subtitles` are the external subtitle file names
    pub fn record_file(&mut self, media: &MediaFile, probe: &ProbeOutput, folder_subtitles: &[String]) {
        self.files_processed += 1;
        self.total_size += media.size;
        let duration = media.duration.unwrap_or(0.0);
        self.total_runtime += duration;
        if let Some(fps) = media.frame_rate {
            let frames = (duration * fps) as u64;
            self.total_frames += frames;
            let pixels_per_frame = media.width.unwrap_or(0) as u128 * media.height.unwrap_or(0) as u128;
            self.total_pixels += frames as u128 * pixels_per_frame;
        }

        bump(&mut self.containers, media.container.as_deref().unwrap_or("unknown"));
        self.files.push(FileFacts {
            name: media
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size: media.size,
            duration: media.duration,
            video_bitrate: media.bitrate,
        });

        self.record_video(media, probe);
        self.record_audio(probe);
        self.record_subtitles(probe, folder_subtitles);
    }

    fn record_video(&mut self, media: &MediaFile, probe: &ProbeOutput) {
        let video = probe.video_stream();
        bump(&mut self.codecs, media.codec.as_deref().unwrap_or("unknown"));
        let bits = media
            .bit_depth
            .map(|b| b.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        bump(&mut self.bit_depths, &bits);
        bump(
            &mut self.color_spaces,
            video.and_then(|v| v.color_space.as_deref()).unwrap_or("unknown"),
        );
        bump(
            &mut self.resolutions,
            &media.resolution().unwrap_or_else(|| "unknown".to_string()),
        );
        bump(&mut self.resolution_categories, media.resolution_category());
        if media.hdr {
            self.hdr_count += 1;
        } else {
            self.sdr_count += 1;
        }
    }

    fn record_audio(&mut self, probe: &ProbeOutput) {
        let audio: Vec<&ProbeStream> = probe.streams_of("audio").collect();
        let languages = dedup_languages(audio.iter().map(|s| s.language()));

        bump(&mut self.soundtrack_counts, &stream_bucket(audio.len()));
        bump(&mut self.audio_language_counts, &stream_bucket(languages.len()));
        for language in &languages {
            bump(&mut self.audio_languages, language);
        }
        if let [only] = languages.as_slice() {
            bump(&mut self.single_language_files, only);
        }

        let channels: BTreeSet<String> = audio
            .iter()
            .map(|s| s.channels.unwrap_or(0).to_string())
            .collect();
        let layouts: BTreeSet<&str> = audio
            .iter()
            .map(|s| s.channel_layout.as_deref().unwrap_or("unknown"))
            .collect();
        let codecs: BTreeSet<&str> = audio
            .iter()
            .map(|s| s.codec_name.as_deref().unwrap_or("unknown"))
            .collect();
        channels.iter().for_each(|c| bump(&mut self.channel_formats, c));
        layouts.into_iter().for_each(|l| bump(&mut self.channel_layouts, l));
        codecs.into_iter().for_each(|c| bump(&mut self.audio_formats, c));

        if audio.iter().any(|s| s.is_atmos()) {
            self.atmos_count += 1;
        }
        if audio.iter().any(|s| s.is_commentary()) {
            self.commentary_count += 1;
        }
    }

    fn record_subtitles(&mut self, probe: &ProbeOutput, folder_subtitles: &[String]) {
        let streams: Vec<&ProbeStream> = probe.streams_of("subtitle").collect();
        self.subtitle_streams += streams.len();

        let in_file: BTreeSet<String> = streams.iter().map(|s| normalize_language(s.language())).collect();
        let in_folder: BTreeSet<String> = folder_subtitles
            .iter()
            .filter_map(|name| subtitle_file_language(name))
            .collect();
        let formats: BTreeSet<&str> = streams
            .iter()
            .map(|s| s.codec_name.as_deref().unwrap_or("unknown"))
            .collect();

        in_file.iter().for_each(|l| bump(&mut self.subtitle_languages, l));
        in_folder.iter().for_each(|l| bump(&mut self.folder_subtitle_languages, l));
        formats.into_iter().for_each(|f| bump(&mut self.subtitle_formats, f));

        let combined: BTreeSet<&String> = in_file.iter().chain(in_folder.iter()).collect();
        combined.iter().for_each(|l| bump(&mut self.combined_subtitle_languages, l));

        if streams.is_empty() && folder_subtitles.is_empty() {
            self.missing_subtitles += 1;
        }
        if !combined.iter().any(|l| l.as_str() == "eng") {
            self.missing_eng_subtitles += 1;
        }
        if !combined.iter().any(|l| l.as_str() == "nor") {
            self.missing_nor_subtitles += 1;
        }
        let forced_in_folder = folder_subtitles
            .iter()
            .any(|name| name.to_lowercase().contains(".forced"));
        if forced_in_folder || streams.iter().any(|s| s.is_forced()) {
            self.forced_subtitles += 1;
        }
    }

    pub fn record_failure(&mut self, file: &Path, error: &str) {
        self.files_failed += 1;
        if self.failures.len() < TOP_COUNT {
            self.failures.push((file.display().to_string(), error.to_string()));
        }
    }

    /// Largest files, biggest first
    pub fn largest_files(&self) -> Vec<&FileFacts> {
        let mut files: Vec<&FileFacts> = self.files.iter().collect();
        files.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.name.cmp(&b.name)));
        files
    }

    /// Files with a known duration, longest first
    pub fn longest_files(&self) -> Vec<&FileFacts> {
        let mut files: Vec<&FileFacts> = self.files.iter().filter(|f| f.duration.is_some()).collect();
        files.sort_by(|a, b| {
            let (a_secs, b_secs) = (a.duration.unwrap_or(0.0), b.duration.unwrap_or(0.0));
            b_secs.total_cmp(&a_secs).then_with(|| a.name.cmp(&b.name))
        });
        files
    }

    /// Files with a known video bitrate, highest first
    pub fn bitrate_ranking(&self) -> Vec<&FileFacts> {
        let mut files: Vec<&FileFacts> = self.files.iter().filter(|f| f.video_bitrate.is_some()).collect();
        files.sort_by(|a, b| b.video_bitrate.cmp(&a.video_bitrate).then_with(|| a.name.cmp(&b.name)));
        files
    }

    /// Mean video bitrate in bits per second over files that report one
    pub fn average_bitrate(&self) -> Option<f64> {
        let rates: Vec<u64> = self.files.iter().filter_map(|f| f.video_bitrate).collect();
        if rates.is_empty() {
            return None;
        }
        Some(rates.iter().map(|r| *r as f64).sum::<f64>() / rates.len() as f64)
    }

    pub fn render(&self, root_folder: &Path, elapsed: Duration) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Media Inventory Statistics");
        let _ = writeln!(out, "{}", "=".repeat(50));
        self.render_run(&mut out, root_folder, elapsed);
        self.render_files(&mut out);
        self.render_video(&mut out);
        self.render_audio(&mut out);
        self.render_subtitles(&mut out);
        out
    }

    fn render_run(&self, out: &mut String, root_folder: &Path, elapsed: Duration) {
        let seconds = elapsed.as_secs_f64();
        let _ = writeln!(out, "Folder scanned: {}", root_folder.display());
        let _ = writeln!(out, "Files processed: {}", self.files_processed);
        let _ = writeln!(out, "Files failed: {}", self.files_failed);
        for (file, error) in &self.failures {
            let _ = writeln!(out, "  {}: {}", file, error);
        }
        let _ = writeln!(out, "Execution time: {:.2} seconds", seconds);
        let _ = writeln!(out, "Total size: {}", format_size(self.total_size));
        let _ = writeln!(out, "Total frames: {}", self.total_frames);
        let _ = writeln!(out, "Total pixels: {}", self.total_pixels);
        let _ = writeln!(out, "Total runtime: {}", format_duration(self.total_runtime));
        let average = if self.files_processed > 0 {
            self.total_runtime / self.files_processed as f64
        } else {
            0.0
        };
        let _ = writeln!(out, "Average runtime: {}", format_duration(average));

        if self.files_processed > 0 && seconds > 0.0 {
            let _ = writeln!(out, "Files / second: {:.2}", self.files_processed as f64 / seconds);
            let _ = writeln!(out, "Seconds / file: {:.2}", seconds / self.files_processed as f64);
            let _ = writeln!(out, "Gigabytes / second: {:.2}", bytes_to_gb(self.total_size) / seconds);
        } else {
            let _ = writeln!(out, "Files / second: N/A");
            let _ = writeln!(out, "Seconds / file: N/A");
            let _ = writeln!(out, "Gigabytes / second: N/A");
        }
    }

    fn render_files(&self, out: &mut String) {
        self.render_counter(out, "Container formats", &self.containers);

        render_top_bottom(out, "Largest/Smallest files", &self.largest_files(), |f| {
            format_size(f.size)
        });
        render_top_bottom(out, "Longest/Shortest playtimes", &self.longest_files(), |f| {
            format_duration(f.duration.unwrap_or(0.0))
        });
        let unknown = self.files.iter().filter(|f| f.duration.is_none()).count();
        if unknown > 0 {
            let _ = writeln!(out, "Files with unknown duration: {}", unknown);
        }
    }

    fn render_video(&self, out: &mut String) {
        self.render_counter(out, "Video codecs", &self.codecs);
        self.render_counter(out, "Bits", &self.bit_depths);
        self.render_counter(out, "Color spaces", &self.color_spaces);

        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "HDR files: {} ({})",
            self.hdr_count,
            percent(self.hdr_count, self.files_processed)
        );
        let _ = writeln!(
            out,
            "SDR files: {} ({})",
            self.sdr_count,
            percent(self.sdr_count, self.files_processed)
        );

        render_top_bottom(out, "Top/bottom bitrates", &self.bitrate_ranking(), |f| {
            format!("{:.2} Mbps", bps_to_mbps(f.video_bitrate.unwrap_or(0)))
        });
        match self.average_bitrate() {
            Some(bps) => {
                let _ = writeln!(out, "Average bitrate: {:.2} Mbps", bps / 1_000_000.0);
            }
            None => {
                let _ = writeln!(out, "Average bitrate: N/A");
            }
        }

        let mut categories: Vec<(&str, usize)> = self
            .resolution_categories
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect();
        categories.sort_by_key(|(name, _)| category_rank(name));
        let _ = writeln!(out);
        let _ = writeln!(out, "Resolution categories:");
        for (name, count) in categories {
            let _ = writeln!(out, "  {}: {} ({})", name, count, percent(count, self.files_processed));
        }
        self.render_counter(out, "Specific resolutions", &self.resolutions);
    }

    fn render_audio(&self, out: &mut String) {
        self.render_buckets(out, "Soundtrack counts", "soundtrack", &self.soundtrack_counts);
        self.render_buckets(out, "Audio language counts", "audio language", &self.audio_language_counts);

        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Files with Atmos audio: {} ({})",
            self.atmos_count,
            percent(self.atmos_count, self.files_processed)
        );
        let _ = writeln!(
            out,
            "Files with commentary track: {} ({})",
            self.commentary_count,
            percent(self.commentary_count, self.files_processed)
        );

        self.render_counter(out, "Audio languages", &self.audio_languages);
        self.render_counter(out, "Single language files", &self.single_language_files);
        self.render_counter(out, "Channel formats", &self.channel_formats);
        self.render_counter(out, "Channel layouts", &self.channel_layouts);
        self.render_counter(out, "Audio formats", &self.audio_formats);
    }

    fn render_subtitles(&self, out: &mut String) {
        let _ = writeln!(out);
        let _ = writeln!(out, "Subtitle streams in files: {}", self.subtitle_streams);
        self.render_counter(out, "Subtitle languages in file", &self.subtitle_languages);
        self.render_counter(out, "Subtitle formats in file", &self.subtitle_formats);
        self.render_counter(out, "Subtitle languages in folder", &self.folder_subtitle_languages);
        self.render_counter(out, "Subtitle languages combined", &self.combined_subtitle_languages);

        let _ = writeln!(out);
        for (label, count) in [
            ("Files missing subtitles (file+folder)", self.missing_subtitles),
            ("Files missing eng subtitles (file+folder)", self.missing_eng_subtitles),
            ("Files missing nor subtitles (file+folder)", self.missing_nor_subtitles),
            ("Files with forced subtitles (file/folder)", self.forced_subtitles),
        ] {
            let _ = writeln!(out, "{}: {} ({})", label, count, percent(count, self.files_processed));
        }
    }

    fn render_counter(&self, out: &mut String, title: &str, counter: &Counter) {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}:", title);
        for (name, count) in sorted_by_count(counter) {
            let _ = writeln!(
                out,
                "  {}: {} ({})",
                name,
                count,
                percent(count, self.files_processed)
            );
        }
    }

    /// `Files with N <noun>s` for 0..=3 and `more`
    fn render_buckets(&self, out: &mut String, title: &str, noun: &str, counter: &Counter) {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}:", title);
        for bucket in (0..MAX_STREAM_BUCKET).map(|n| n.to_string()).chain(["more".to_string()]) {
            let count = counter.get(&bucket).copied().unwrap_or(0);
            let plural = if bucket == "1" { "" } else { "s" };
            let _ = writeln!(
                out,
                "  Files with {} {}{}: {} ({})",
                bucket,
                noun,
                plural,
                count,
                percent(count, self.files_processed)
            );
        }
    }
}

/// `0`..`3`, then `more`
fn stream_bucket(count: usize) -> String {
    if count >= MAX_STREAM_BUCKET {
        "more".to_string()
    } else {
        count.to_string()
    }
}

fn category_rank(name: &str) -> usize {
    const ORDER: &[&str] = &["8K", "4K", "1080p", "720p", "480p", "SD"];
    ORDER.iter().position(|c| *c == name).unwrap_or(ORDER.len())
}

/// The first and last `TOP_COUNT` entries of a ranking, or all of them when short
fn render_top_bottom<F>(out: &mut String, title: &str, ranked: &[&FileFacts], value: F)
where
    F: Fn(&FileFacts) -> String,
{
    let _ = writeln!(out);
    let _ = writeln!(out, "{}:", title);
    let line = |out: &mut String, facts: &FileFacts| {
        let _ = writeln!(out, "  {} - {}", value(facts), facts.name);
    };
    if ranked.len() <= TOP_COUNT * 2 {
        ranked.iter().for_each(|f| line(out, *f));
        return;
    }
    ranked[..TOP_COUNT].iter().for_each(|f| line(out, *f));
    let _ = writeln!(out, "  ...");
    ranked[ranked.len() - TOP_COUNT..].iter().for_each(|f| line(out, *f));
}

fn bump(counter: &mut Counter, key: &str) {
    *counter.entry(key.to_string()).or_insert(0) += 1;
}

fn sorted_by_count(counter: &Counter) -> Vec<(&str, usize)> {
    let mut entries: Vec<(&str, usize)> = counter.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
}

fn percent(part: usize, whole: usize) -> String {
    if whole == 0 {
        "0.00%".to_string()
    } else {
        format!("{:.2}%", part as f64 / whole as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::fixtures::hdr_movie_json;
    use std::path::PathBuf;

    fn movie(name: &str, size: u64) -> (MediaFile, ProbeOutput) {
        let probe = ProbeOutput::from_json(&hdr_movie_json(Some(1), 1)).unwrap();
        let media = MediaFile::from_probe(&PathBuf::from(name), size, &probe).unwrap();
        (media, probe)
    }

    /// An 8-bit 1080p SDR file with the given audio and subtitle streams
    fn sdr_file(name: &str, size: u64, duration: &str, bitrate: u64, extra_streams: &str) -> (MediaFile, ProbeOutput) {
        let json = format!(
            r#"{{
  "streams": [
    {{"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080,
      "pix_fmt": "yuv420p", "color_space": "bt709", "avg_frame_rate": "25/1",
      "bit_rate": "{bitrate}"}}{extra_streams}
  ],
  "format": {{"format_name": "mov,mp4,m4a,3gp,3g2,mj2", "duration": "{duration}"}}
}}"#
        );
        let probe = ProbeOutput::from_json(&json).unwrap();
        let media = MediaFile::from_probe(&PathBuf::from(name), size, &probe).unwrap();
        (media, probe)
    }

    #[test]
    fn test_counts_and_largest() {
        let mut stats = InventoryStatistics::new();
        for (name, size) in [("/m/a.mkv", 10), ("/m/b.mkv", 30), ("/m/c.mkv", 20)] {
            let (media, probe) = movie(name, size);
            stats.record_file(&media, &probe, &[]);
        }
        stats.record_failure(Path::new("/m/broken.mkv"), "Unreadable metadata");

        assert_eq!(stats.files_processed, 3);
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.total_size, 60);
        assert_eq!(stats.hdr_count, 3);
        assert_eq!(stats.codecs.get("hevc"), Some(&3));
        assert_eq!(stats.resolution_categories.get("4K"), Some(&3));
        assert_eq!(stats.audio_languages.get("eng"), Some(&3));
        assert_eq!(stats.audio_languages.get("nor"), Some(&3));
        assert_eq!(stats.largest_files()[0].name, "b.mkv");

        let text = stats.render(Path::new("/m"), Duration::from_secs(2));
        assert!(text.contains("Files processed: 3"));
        assert!(text.contains("/m/broken.mkv: Unreadable metadata"));
        assert!(text.contains("HDR files: 3 (100.00%)"));
        assert!(text.contains("  4K: 3 (100.00%)"));
        assert!(text.contains("Total runtime: 6:00:00"));
    }

    #[test]
    fn test_video_depth_color_and_dynamic_range() {
        let mut stats = InventoryStatistics::new();
        let (hdr, hdr_probe) = movie("/m/hdr.mkv", 1);
        stats.record_file(&hdr, &hdr_probe, &[]);
        let (sdr, sdr_probe) = sdr_file("/m/sdr.mp4", 1, "60", 8_000_000, "");
        stats.record_file(&sdr, &sdr_probe, &[]);

        assert_eq!(stats.bit_depths.get("10"), Some(&1));
        assert_eq!(stats.bit_depths.get("8"), Some(&1));
        assert_eq!(stats.color_spaces.get("bt2020nc"), Some(&1));
        assert_eq!(stats.color_spaces.get("bt709"), Some(&1));
        assert_eq!((stats.hdr_count, stats.sdr_count), (1, 1));
        assert_eq!(stats.resolutions.get("1920x1080"), Some(&1));

        let text = stats.render(Path::new("/m"), Duration::from_secs(1));
        assert!(text.contains("SDR files: 1 (50.00%)"));
        assert!(text.contains("Bits:\n  10: 1 (50.00%)\n  8: 1 (50.00%)"));
    }

    #[test]
    fn test_atmos_and_commentary_counted_once_per_file() {
        let mut stats = InventoryStatistics::new();
        let streams = r#",
    {"codec_type": "audio", "codec_name": "truehd", "profile": "Dolby TrueHD + Dolby Atmos", "tags": {"language": "en"}},
    {"codec_type": "audio", "codec_name": "eac3", "tags": {"language": "eng", "title": "Dolby Atmos"}},
    {"codec_type": "audio", "codec_name": "ac3", "tags": {"language": "eng", "title": "Commentary"}}"#;
        let (atmos, atmos_probe) = sdr_file("/m/atmos.mkv", 1, "60", 1, streams);
        stats.record_file(&atmos, &atmos_probe, &[]);
        let (plain, plain_probe) = movie("/m/plain.mkv", 1);
        stats.record_file(&plain, &plain_probe, &[]);

        assert_eq!(stats.atmos_count, 1);
        assert_eq!(stats.commentary_count, 1);
        let text = stats.render(Path::new("/m"), Duration::from_secs(1));
        assert!(text.contains("Files with Atmos audio: 1 (50.00%)"));
        assert!(text.contains("Files with commentary track: 1 (50.00%)"));
    }

    #[test]
    fn test_audio_buckets_layouts_and_language_folding() {
        let mut stats = InventoryStatistics::new();
        let streams = r#",
    {"codec_type": "audio", "codec_name": "aac", "channels": 2, "channel_layout": "stereo", "tags": {"language": "en"}},
    {"codec_type": "audio", "codec_name": "aac", "channels": 2, "channel_layout": "stereo", "tags": {"language": "eng"}}"#;
        let (single, single_probe) = sdr_file("/m/single.mp4", 1, "60", 1, streams);
        stats.record_file(&single, &single_probe, &[]);
        let (multi, multi_probe) = movie("/m/multi.mkv", 1);
        stats.record_file(&multi, &multi_probe, &[]);
        let (silent, silent_probe) = sdr_file("/m/silent.mp4", 1, "60", 1, "");
        stats.record_file(&silent, &silent_probe, &[]);

        assert_eq!(stats.soundtrack_counts.get("2"), Some(&2));
        assert_eq!(stats.soundtrack_counts.get("0"), Some(&1));
        assert_eq!(stats.audio_language_counts.get("1"), Some(&1));
        assert_eq!(stats.audio_language_counts.get("2"), Some(&1));
        assert_eq!(stats.audio_languages.get("eng"), Some(&2));
        assert_eq!(stats.single_language_files.get("eng"), Some(&1));
        assert_eq!(stats.channel_layouts.get("stereo"), Some(&1));
        assert_eq!(stats.channel_layouts.get("7.1"), Some(&1));
        assert_eq!(stats.channel_formats.get("2"), Some(&1));
        assert_eq!(stats.audio_formats.get("aac"), Some(&1));

        let text = stats.render(Path::new("/m"), Duration::from_secs(1));
        assert!(text.contains("  Files with 1 soundtrack: 0 (0.00%)"));
        assert!(text.contains("  Files with 2 soundtracks: 2 (66.67%)"));
        assert!(text.contains("  Files with more soundtracks: 0 (0.00%)"));
    }

    #[test]
    fn test_missing_and_forced_subtitles() {
        let mut stats = InventoryStatistics::new();
        // eng subtitle stream only
        let (movie_a, probe_a) = movie("/m/a.mkv", 1);
        stats.record_file(&movie_a, &probe_a, &[]);
        // no subtitles at all
        let (bare, bare_probe) = sdr_file("/m/bare.mp4", 1, "60", 1, "");
        stats.record_file(&bare, &bare_probe, &[]);
        // norwegian from the folder, forced track in the file
        let forced = r#",
    {"codec_type": "subtitle", "codec_name": "subrip", "tags": {"language": "en"}, "disposition": {"forced": 1}}"#;
        let (both, both_probe) = sdr_file("/m/both.mkv", 1, "60", 1, forced);
        stats.record_file(&both, &both_probe, &["both.no.srt".to_string()]);

        assert_eq!(stats.subtitle_streams, 2);
        assert_eq!(stats.subtitle_languages.get("eng"), Some(&2));
        assert_eq!(stats.folder_subtitle_languages.get("nor"), Some(&1));
        assert_eq!(stats.combined_subtitle_languages.get("nor"), Some(&1));
        assert_eq!(stats.missing_subtitles, 1);
        assert_eq!(stats.missing_eng_subtitles, 1);
        assert_eq!(stats.missing_nor_subtitles, 2);
        assert_eq!(stats.forced_subtitles, 1);

        let text = stats.render(Path::new("/m"), Duration::from_secs(1));
        assert!(text.contains("Files missing nor subtitles (file+folder): 2 (66.67%)"));
    }

    #[test]
    fn test_rankings_and_average_bitrate() {
        let mut stats = InventoryStatistics::new();
        for (name, size, duration, bitrate) in [
            ("/m/short.mp4", 5, "30", 2_000_000),
            ("/m/long.mp4", 1, "7200", 6_000_000),
            ("/m/mid.mp4", 3, "600", 4_000_000),
        ] {
            let (media, probe) = sdr_file(name, size, duration, bitrate, "");
            stats.record_file(&media, &probe, &[]);
        }

        let names = |files: Vec<&FileFacts>| files.iter().map(|f| f.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(stats.largest_files()), vec!["short.mp4", "mid.mp4", "long.mp4"]);
        assert_eq!(names(stats.longest_files()), vec!["long.mp4", "mid.mp4", "short.mp4"]);
        assert_eq!(names(stats.bitrate_ranking()), vec!["long.mp4", "mid.mp4", "short.mp4"]);
        assert_eq!(stats.average_bitrate(), Some(4_000_000.0));
        assert_eq!(stats.total_frames, (30 + 7200 + 600) * 25);

        let text = stats.render(Path::new("/m"), Duration::from_secs(1));
        assert!(text.contains("Average bitrate: 4.00 Mbps"));
        assert!(text.contains("Longest/Shortest playtimes:\n  2:00:00 - long.mp4"));
        assert!(text.contains("Top/bottom bitrates:\n  6.00 Mbps - long.mp4"));
    }

    #[test]
    fn test_throughput_lines() {
        let mut stats = InventoryStatistics::new();
        let (media, probe) = movie("/m/a.mkv", 4 * 1024 * 1024 * 1024);
        stats.record_file(&media, &probe, &[]);

        let text = stats.render(Path::new("/m"), Duration::from_secs(2));
        assert!(text.contains("Files / second: 0.50"));
        assert!(text.contains("Seconds / file: 2.00"));
        assert!(text.contains("Gigabytes / second: 2.00"));

        let instant = stats.render(Path::new("/m"), Duration::ZERO);
        assert!(instant.contains("Files / second: N/A"));
    }

    #[test]
    fn test_empty_run_renders() {
        let text = InventoryStatistics::new().render(Path::new("/empty"), Duration::ZERO);
        assert!(text.contains("HDR files: 0 (0.00%)"));
        assert!(text.contains("Average bitrate: N/A"));
    }
}
