//! # Media Library Tools Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per i test
//!
//! ## Architettura dei moduli:
//! - `cli` / `config`: flag della command line e configurazione per utility
//! - `error`: Tipi di errore custom
//! - `tool_resolver` / `platform` / `runner`: risoluzione ed esecuzione di
//!   ffmpeg, ffprobe e HandBrakeCLI
//! - `probe`: Modello tipizzato dell'output JSON di ffprobe
//! - `comparison` / `sampling`: Bitrate ratio, soglie e punti di campionamento
//! - `file_manager`: Discovery dei file e liste di path
//! - `progress` / `report`: Progress bar, contatori e report CSV
//! - `inspector`, `inventory`, `health_check`, `transcode`, `fix_health`,
//!   `symlinks`, `compat`: le utility
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use media_library_tools::{HealthCheckConfig, HealthChecker, ProcessRunner, Tool, ToolPathResolver, ToolSet};
//!
//! let tools = ToolSet::resolve(&ToolPathResolver::new(), &[Tool::Ffmpeg, Tool::Ffprobe])?;
//! let checker = HealthChecker::new(&config, &ProcessRunner, &tools, false);
//! checker.run().await?;
//! ```

pub mod cli;
pub mod comparison;
pub mod compat;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod fix_health;
pub mod health_check;
pub mod inspector;
pub mod inventory;
pub mod platform;
pub mod probe;
pub mod progress;
pub mod report;
pub mod runner;
pub mod sampling;
pub mod symlinks;
pub mod tool_resolver;
pub mod transcode;
pub mod utils;

pub use compat::CompatChecker;
pub use config::{
    CompatConfig, FixHealthConfig, HealthCheckConfig, InspectConfig, InventoryConfig, LinkConfig,
    ToolkitSettings, TranscodeConfig,
};
pub use error::{MediaToolError, Result};
pub use fix_health::HealthFixer;
pub use health_check::HealthChecker;
pub use inspector::QualityInspector;
pub use inventory::MediaInventory;
pub use platform::{Tool, ToolSet};
pub use runner::{ProcessRunner, ToolRunner};
pub use symlinks::LinkCreator;
pub use tool_resolver::ToolPathResolver;
pub use transcode::HdrTranscoder;
