//! # File Management Module
//!
//! Questo modulo gestisce tutte le operazioni sui file e la discovery dei video.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva di file video in directory, filtrata per estensione
//! - Normalizzazione delle liste di estensioni (`mkv`, `.MKV`, `.mkv` sono equivalenti)
//! - Lettura di liste di path (una per riga, `#` per i commenti)
//! - Utilità su path relativi, nomi cartella e contenuto delle directory
//!
//! ## Esempio:
//! ```rust,ignore
//! let filter = ExtensionFilter::parse_list("mkv,mp4");
//! let files = FileManager::find_media_files(Path::new("/media/movies"), &filter)?;
//! ```

use crate::error::{MediaToolError, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Case-insensitive extension allow-list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: BTreeSet<String>,
}

impl ExtensionFilter {
    /// Build from items such as `mkv`, `.MP4`
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = items
            .into_iter()
            .map(|item| item.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|item| !item.is_empty())
            .collect();
        Self { extensions }
    }

    /// Build from a comma-separated list such as `mkv,mp4,avi`
    pub fn parse_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| self.extensions.contains(&ext.to_string_lossy().to_lowercase()))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Extensions with a leading dot, sorted
    pub fn dotted(&self) -> Vec<String> {
        self.extensions.iter().map(|ext| format!(".{}", ext)).collect()
    }
}

impl std::fmt::Display for ExtensionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.dotted().join(" "))
    }
}

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Find all files under `root` whose extension passes `filter`, in walk order
    /// with entries of each directory sorted by name
    pub fn find_media_files(root: &Path, filter: &ExtensionFilter) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(MediaToolError::Validation(format!(
                "Not a directory: {}",
                root.display()
            )));
        }

        let files = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|path| filter.matches(path))
            .collect();

        Ok(files)
    }

    /// Count directories under `root`, including `root` itself
    pub fn count_directories(root: &Path) -> usize {
        WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .count()
    }

    /// Read a list of paths, one per line; blank lines and `#` comments are ignored
    pub async fn read_path_list(list_file: &Path) -> Result<Vec<PathBuf>> {
        let content = fs::read_to_string(list_file).await?;
        Ok(Self::parse_path_list(&content))
    }

    pub fn parse_path_list(content: &str) -> Vec<PathBuf> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(PathBuf::from)
            .collect()
    }

    /// Path of `path` relative to `base`, or the bare file name when it is not below it
    pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
        match path.strip_prefix(base) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => path.file_name().map(PathBuf::from).unwrap_or_default(),
        }
    }

    /// Last component of a folder path, tolerant of trailing separators and `.`
    pub fn folder_name(path: &Path) -> String {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        absolute
            .components()
            .filter(|c| !matches!(c, std::path::Component::CurDir))
            .next_back()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string())
    }

    /// Keep only characters that are safe in a file name
    pub fn sanitize_for_filename(name: &str) -> String {
        name.chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    /// Whether `dir` (recursively) holds a file with one of the given extensions
    pub fn directory_has_files(dir: &Path, extensions: &[&str]) -> bool {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .any(|e| Self::has_extension(e.path(), extensions))
    }

    /// Remove files with one of the given extensions directly inside `dir`
    pub async fn remove_files_with_extensions(dir: &Path, extensions: &[&str]) -> Result<usize> {
        if !dir.is_dir() {
            return Ok(0);
        }

        let mut removed = 0;
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file() && Self::has_extension(&path, extensions) {
                fs::remove_file(&path).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn has_extension(path: &Path, extensions: &[&str]) -> bool {
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(&ext))
            })
            .unwrap_or(false)
    }

    /// Append a suffix to the full file name: `a.mkv` + `.bak` -> `a.mkv.bak`
    pub fn with_appended_suffix(path: &Path, suffix: &str) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extension_filter_normalizes() {
        let filter = ExtensionFilter::new([".MKV", "mp4", " .avi "]);
        assert!(filter.matches(Path::new("/a/b.mkv")));
        assert!(filter.matches(Path::new("/a/b.MP4")));
        assert!(filter.matches(Path::new("b.avi")));
        assert!(!filter.matches(Path::new("b.mov")));
        assert!(!filter.matches(Path::new("mkv")));
        assert_eq!(filter.to_string(), ".avi .mkv .mp4");
    }

    #[test]
    fn test_find_media_files_applies_filter() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("season 1")).unwrap();
        for name in ["b.mkv", "a.mp4", "season 1/c.MKV", "season 1/notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let filter = ExtensionFilter::new([".mkv"]);
        let files = FileManager::find_media_files(dir.path(), &filter).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| FileManager::relative_to(p, dir.path()))
            .collect();

        assert_eq!(
            names,
            vec![PathBuf::from("b.mkv"), PathBuf::from("season 1").join("c.MKV")]
        );
    }

    #[test]
    fn test_find_media_files_rejects_missing_root() {
        let filter = ExtensionFilter::new(["mkv"]);
        assert!(FileManager::find_media_files(Path::new("/no/such/dir"), &filter).is_err());
    }

    #[test]
    fn test_parse_path_list_skips_comments() {
        let content = "# generated\n/media/a.mkv\n\n  /media/b c.mkv  \n#/media/skip.mkv\n";
        assert_eq!(
            FileManager::parse_path_list(content),
            vec![PathBuf::from("/media/a.mkv"), PathBuf::from("/media/b c.mkv")]
        );
    }

    #[test]
    fn test_folder_name_and_sanitize() {
        assert_eq!(FileManager::folder_name(Path::new("/media/movies/")), "movies");
        assert_eq!(
            FileManager::sanitize_for_filename("Movies: 4K/HDR (2024) "),
            "Movies 4KHDR 2024"
        );
    }

    #[tokio::test]
    async fn test_directory_helpers() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("scr-1.png"), b"x").unwrap();
        std::fs::write(dir.path().join("vid-1.MP4"), b"x").unwrap();
        std::fs::write(dir.path().join("video_info.json"), b"{}").unwrap();

        assert!(FileManager::directory_has_files(dir.path(), &["png"]));
        assert!(FileManager::directory_has_files(dir.path(), &["mp4", "mkv"]));
        assert!(!FileManager::directory_has_files(dir.path(), &["avi"]));

        let removed = FileManager::remove_files_with_extensions(dir.path(), &["png", "mp4"])
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert!(dir.path().join("video_info.json").exists());
    }

    #[test]
    fn test_with_appended_suffix() {
        assert_eq!(
            FileManager::with_appended_suffix(Path::new("/m/a.mkv"), ".to_be_deleted"),
            PathBuf::from("/m/a.mkv.to_be_deleted")
        );
    }
}
