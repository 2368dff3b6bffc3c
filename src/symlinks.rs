//! # Symlink Preparation
//!
//! Questo modulo prepara una cartella di link (o copie) a partire da una
//! lista di path, per dare in pasto a un transcoder esterno solo i file
//! selezionati invece di un'intera libreria.
//!
//! Sorgenti mancanti e link già presenti vengono segnalati ma non
//! interrompono l'esecuzione.

use crate::config::LinkConfig;
use crate::error::Result;
use crate::file_manager::FileManager;
use crate::progress::{FileOutcome, RunStats, SkipReason};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// Marker substring left next to files that were already transcoded
pub const TO_BE_DELETED_MARKER: &str = "to_be_deleted";

#[derive(Debug)]
pub struct LinkSummary {
    pub stats: RunStats,
    pub created: Vec<PathBuf>,
}

pub struct LinkCreator<'a> {
    config: &'a LinkConfig,
}

impl<'a> LinkCreator<'a> {
    pub fn new(config: &'a LinkConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self) -> anyhow::Result<LinkSummary> {
        let sources = FileManager::read_path_list(&self.config.file_list).await?;
        if !self.config.output.exists() {
            fs::create_dir_all(&self.config.output).await?;
            info!("Created output directory: {}", self.config.output.display());
        }
        info!("🔗 Found {} file paths in {}", sources.len(), self.config.file_list.display());

        let mut stats = RunStats::new();
        let mut created = Vec::new();

        for source in &sources {
            let name = source.display().to_string();
            let outcome = match self.link_file(source).await {
                Ok((outcome, target)) => {
                    if let Some(target) = target {
                        created.push(target);
                    }
                    outcome
                }
                Err(e) => FileOutcome::Failed(e.to_string()),
            };

            match &outcome {
                FileOutcome::Skipped(reason) => warn!("{}: {}", name, reason),
                FileOutcome::Failed(error) => warn!("Error linking {}: {}", name, error),
                FileOutcome::Processed => {}
            }
            stats.record(&name, &outcome);
        }

        info!(
            "✅ {} {} created in {}. {}",
            created.len(),
            if self.config.copy { "copies" } else { "symlinks" },
            self.config.output.display(),
            stats.format_summary()
        );
        Ok(LinkSummary { stats, created })
    }

    /// Link or copy one source; the target path is returned when something was created
    pub async fn link_file(&self, source: &Path) -> Result<(FileOutcome, Option<PathBuf>)> {
        if !source.is_file() {
            return Ok((FileOutcome::Skipped(SkipReason::MissingSource), None));
        }
        if self.config.skip_marked && folder_has_marker(source).await? {
            return Ok((FileOutcome::Skipped(SkipReason::AlreadyMarked), None));
        }

        let Some(file_name) = source.file_name() else {
            return Ok((FileOutcome::Skipped(SkipReason::MissingSource), None));
        };
        let target = self.config.output.join(file_name);
        // symlink_metadata also sees dangling links
        if fs::symlink_metadata(&target).await.is_ok() {
            return Ok((FileOutcome::Skipped(SkipReason::OutputExists), None));
        }

        if self.config.copy {
            fs::copy(source, &target).await?;
        } else {
            let absolute = std::path::absolute(source)?;
            create_symlink(&absolute, &target).await?;
        }
        Ok((FileOutcome::Processed, Some(target)))
    }
}

/// Whether the source's folder holds any file with the marker in its name
async fn folder_has_marker(source: &Path) -> Result<bool> {
    let Some(folder) = source.parent() else {
        return Ok(false);
    };
    let mut entries = fs::read_dir(folder).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry
            .file_name()
            .to_string_lossy()
            .contains(TO_BE_DELETED_MARKER)
        {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(unix)]
async fn create_symlink(source: &Path, target: &Path) -> std::io::Result<()> {
    fs::symlink(source, target).await
}

#[cfg(windows)]
async fn create_symlink(source: &Path, target: &Path) -> std::io::Result<()> {
    fs::symlink_file(source, target).await
}
