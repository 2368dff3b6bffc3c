//! # Platform-specific utilities
//!
//! Questo modulo centralizza la gestione dei tool esterni richiesti da ogni
//! utility (ffmpeg, ffprobe, HandBrakeCLI). Tutti i tool necessari vengono
//! risolti all'avvio: se ne manca anche uno solo l'esecuzione termina prima
//! di toccare qualsiasi file.

use crate::error::{MediaToolError, Result};
use crate::tool_resolver::ToolPathResolver;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// External binaries wrapped by the toolkit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Ffmpeg,
    Ffprobe,
    HandBrake,
}

impl Tool {
    /// Base executable name, without platform suffix
    pub fn base_name(&self) -> &'static str {
        match self {
            Tool::Ffmpeg => "ffmpeg",
            Tool::Ffprobe => "ffprobe",
            Tool::HandBrake => "HandBrakeCLI",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_name())
    }
}

/// Resolved paths of the tools a utility needs
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    paths: HashMap<Tool, PathBuf>,
}

impl ToolSet {
    /// Resolve every required tool, failing on the first one that is missing
    pub fn resolve(resolver: &ToolPathResolver, required: &[Tool]) -> Result<Self> {
        let mut paths = HashMap::new();

        for tool in required {
            let path = resolver
                .check_tool_with_instructions(tool.base_name())
                .map_err(MediaToolError::MissingDependency)?;
            debug!("Resolved {} -> {}", tool, path.display());
            paths.insert(*tool, path);
        }

        Ok(Self { paths })
    }

    /// Build a tool set from known paths
    pub fn from_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = (Tool, PathBuf)>,
    {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    /// Path of a tool; falls back to the bare name for tools that were not resolved
    pub fn path(&self, tool: Tool) -> &Path {
        self.paths
            .get(&tool)
            .map(PathBuf::as_path)
            .unwrap_or_else(|| Path::new(tool.base_name()))
    }

    pub fn contains(&self, tool: Tool) -> bool {
        self.paths.contains_key(&tool)
    }

    /// Get system information for debugging
    pub fn system_info() -> SystemInfo {
        SystemInfo {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            family: std::env::consts::FAMILY,
        }
    }
}

/// System information structure
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub os: &'static str,
    pub arch: &'static str,
    pub family: &'static str,
}

impl fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.os, self.arch, self.family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_tool_is_reported_before_anything_else() {
        let empty = TempDir::new().unwrap();
        let resolver = ToolPathResolver::with_search_path(vec![empty.path().to_path_buf()]);

        let err = ToolSet::resolve(&resolver, &[Tool::Ffprobe, Tool::Ffmpeg]).unwrap_err();
        match err {
            MediaToolError::MissingDependency(message) => assert!(message.contains("ffprobe")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_all_tools() {
        let dir = TempDir::new().unwrap();
        let extension = if cfg!(windows) { ".exe" } else { "" };
        for name in ["ffmpeg", "ffprobe"] {
            std::fs::write(dir.path().join(format!("{}{}", name, extension)), b"").unwrap();
        }
        let resolver = ToolPathResolver::with_search_path(vec![dir.path().to_path_buf()]);

        let tools = ToolSet::resolve(&resolver, &[Tool::Ffmpeg, Tool::Ffprobe]).unwrap();
        assert!(tools.contains(Tool::Ffmpeg));
        assert!(tools.path(Tool::Ffprobe).starts_with(dir.path()));
        assert_eq!(tools.path(Tool::HandBrake), Path::new("HandBrakeCLI"));
    }

    #[test]
    fn test_system_info() {
        let info = ToolSet::system_info();
        assert!(!info.os.is_empty());
        assert!(!info.arch.is_empty());
        assert!(!info.family.is_empty());
    }
}
