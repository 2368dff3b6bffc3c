//! # Tool Path Resolver
//!
//! This module handles finding the external media tools in different environments:
//! - Explicit overrides from the settings file
//! - A tools directory pointed to by `TOOLS_DIR` (or `tools/` next to the executable)
//! - System-installed tools on `PATH`

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Tool path resolver for different deployment environments
#[derive(Debug, Clone)]
pub struct ToolPathResolver {
    /// Directory holding bundled tools, if any
    tools_dir: Option<PathBuf>,
    /// Directories searched in order, normally the entries of `PATH`
    search_path: Vec<PathBuf>,
    /// Per-tool binary overrides keyed by base name
    overrides: HashMap<String, PathBuf>,
}

impl ToolPathResolver {
    /// Create a resolver from the process environment
    pub fn new() -> Self {
        let search_path = env::var_os("PATH")
            .map(|paths| env::split_paths(&paths).collect())
            .unwrap_or_default();

        Self {
            tools_dir: Self::detect_bundled_tools_dir(),
            search_path,
            overrides: HashMap::new(),
        }
    }

    /// Create a resolver that only looks in the given directories
    pub fn with_search_path(search_path: Vec<PathBuf>) -> Self {
        Self {
            tools_dir: None,
            search_path,
            overrides: HashMap::new(),
        }
    }

    /// Add explicit binary overrides (tool base name -> path)
    pub fn with_overrides(mut self, overrides: HashMap<String, PathBuf>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    /// Detect the bundled tools directory
    fn detect_bundled_tools_dir() -> Option<PathBuf> {
        // Strategy 1: TOOLS_DIR environment variable (direct override)
        if let Ok(tools_dir) = env::var("TOOLS_DIR") {
            let tools_path = PathBuf::from(tools_dir);
            debug!("Checking TOOLS_DIR: {:?}", tools_path);
            if tools_path.is_dir() {
                return Some(tools_path);
            }
            warn!("TOOLS_DIR is set but is not a directory: {}", tools_path.display());
        }

        // Strategy 2: tools/ next to the executable
        let exe_path = env::current_exe().ok()?;
        let candidate = exe_path.parent()?.join("tools");
        debug!("Checking tools directory next to executable: {:?}", candidate);
        if candidate.is_dir() {
            return Some(candidate);
        }

        None
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        debug!("Resolving tool: {}", tool_name);

        if let Some(path) = self.overrides.get(tool_name) {
            if path.is_file() {
                debug!("Using configured tool: {} -> {:?}", tool_name, path);
                return Some(path.clone());
            }
            warn!(
                "Configured path for {} does not exist: {}",
                tool_name,
                path.display()
            );
        }

        if let Some(ref tools_dir) = self.tools_dir {
            if let Some(bundled) = Self::find_in_dir(tools_dir, tool_name) {
                debug!("Using bundled tool: {} -> {:?}", tool_name, bundled);
                return Some(bundled);
            }
        }

        let found = self
            .search_path
            .iter()
            .find_map(|dir| Self::find_in_dir(dir, tool_name));

        match found {
            Some(path) => {
                debug!("Using system tool: {} -> {:?}", tool_name, path);
                Some(path)
            }
            None => {
                debug!("Tool not found: {}", tool_name);
                None
            }
        }
    }

    fn find_in_dir(dir: &Path, tool_name: &str) -> Option<PathBuf> {
        let extension = if cfg!(windows) { ".exe" } else { "" };
        let candidate = dir.join(format!("{}{}", tool_name, extension));
        candidate.is_file().then_some(candidate)
    }

    /// Check if a specific tool is available
    pub fn is_tool_available(&self, tool_name: &str) -> bool {
        self.resolve_tool(tool_name).is_some()
    }

    /// Check if a tool is available and provide installation instructions if not
    pub fn check_tool_with_instructions(&self, tool_name: &str) -> Result<PathBuf, String> {
        if let Some(path) = self.resolve_tool(tool_name) {
            return Ok(path);
        }

        if cfg!(target_os = "linux") {
            Err(format!(
                "Tool '{}' not found in system PATH. To install on Linux, run: {}",
                tool_name,
                Self::linux_install_instructions(tool_name)
            ))
        } else {
            Err(format!(
                "Tool '{}' not found. Install it, put it on PATH or point TOOLS_DIR at it.",
                tool_name
            ))
        }
    }

    fn linux_install_instructions(tool_name: &str) -> &'static str {
        match tool_name {
            "ffmpeg" | "ffprobe" => "sudo apt-get install ffmpeg",
            "HandBrakeCLI" => "sudo apt-get install handbrake-cli",
            _ => "your package manager",
        }
    }

    /// Get a report of tool availability
    pub fn get_tools_report(&self, tools: &[&str]) -> String {
        let mut report = String::from("Tool availability:\n");
        for tool in tools {
            match self.resolve_tool(tool) {
                Some(path) => report.push_str(&format!("  ✅ {} -> {}\n", tool, path.display())),
                None => report.push_str(&format!("  ❌ {} (not found)\n", tool)),
            }
        }
        report
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_tool(dir: &Path, name: &str) -> PathBuf {
        let extension = if cfg!(windows) { ".exe" } else { "" };
        let path = dir.join(format!("{}{}", name, extension));
        std::fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn test_resolves_from_search_path() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let expected = fake_tool(second.path(), "ffprobe");

        let resolver = ToolPathResolver::with_search_path(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);

        assert_eq!(resolver.resolve_tool("ffprobe"), Some(expected));
        assert!(!resolver.is_tool_available("ffmpeg"));
    }

    #[test]
    fn test_override_wins_over_search_path() {
        let on_path = TempDir::new().unwrap();
        let custom = TempDir::new().unwrap();
        fake_tool(on_path.path(), "ffmpeg");
        let custom_tool = custom.path().join("my-ffmpeg");
        std::fs::write(&custom_tool, b"").unwrap();

        let mut overrides = HashMap::new();
        overrides.insert("ffmpeg".to_string(), custom_tool.clone());
        let resolver = ToolPathResolver::with_search_path(vec![on_path.path().to_path_buf()])
            .with_overrides(overrides);

        assert_eq!(resolver.resolve_tool("ffmpeg"), Some(custom_tool));
    }

    #[test]
    fn test_missing_override_falls_back() {
        let on_path = TempDir::new().unwrap();
        let expected = fake_tool(on_path.path(), "ffmpeg");

        let mut overrides = HashMap::new();
        overrides.insert("ffmpeg".to_string(), PathBuf::from("/definitely/not/here/ffmpeg"));
        let resolver = ToolPathResolver::with_search_path(vec![on_path.path().to_path_buf()])
            .with_overrides(overrides);

        assert_eq!(resolver.resolve_tool("ffmpeg"), Some(expected));
    }

    #[test]
    fn test_instructions_name_the_tool() {
        let resolver = ToolPathResolver::with_search_path(Vec::new());
        let message = resolver.check_tool_with_instructions("HandBrakeCLI").unwrap_err();
        assert!(message.contains("HandBrakeCLI"));

        let report = resolver.get_tools_report(&["ffmpeg"]);
        assert!(report.contains("ffmpeg (not found)"));
    }
}
