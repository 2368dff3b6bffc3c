//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `MediaToolError` enum per categorizzare tutti gli errori possibili
//! - Fornisce messaggi di errore descrittivi e strutturati
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (file non trovati, permessi, symlink rotti)
//! - `Json` / `Csv`: Errori di serializzazione report e sidecar
//! - `ToolFailed`: Tool esterno terminato con exit code non zero
//! - `ToolTimeout`: Tool esterno non terminato entro il timeout
//! - `Metadata`: Output di ffprobe malformato o incompleto
//! - `MissingDependency`: Tool esterno mancante (ffmpeg, ffprobe, HandBrakeCLI)
//! - `Validation`: Errori di validazione input
//!
//! ## Esempio:
//! ```rust,ignore
//! if resolver.resolve_tool("ffprobe").is_none() {
//!     return Err(MediaToolError::MissingDependency("ffprobe".to_string()));
//! }
//! ```

/// Custom error types for the media library tools
#[derive(thiserror::Error, Debug)]
pub enum MediaToolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{tool} failed (exit code {code}): {stderr}")]
    ToolFailed {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("{tool} timed out after {seconds}s")]
    ToolTimeout { tool: String, seconds: u64 },

    #[error("Unreadable metadata: {0}")]
    Metadata(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, MediaToolError>;
