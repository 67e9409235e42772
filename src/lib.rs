//! Tingli: a lesson-audio archive crawler
//!
//! This crate implements a sequential crawler that walks a language-lesson
//! site's paginated archive, resolves each lesson's audio file, mirrors the
//! audio into a local directory, and writes a JSON summary of every lesson
//! it touched.

pub mod config;
pub mod crawler;
pub mod download;
pub mod summary;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Tingli operations
///
/// Per-lesson failures (fetch, extraction, download) never surface here;
/// the coordinator absorbs them into the run summary. This type covers the
/// unrecoverable setup and teardown paths only.
#[derive(Debug, Error)]
pub enum TingliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Summary error: {0}")]
    Summary(#[from] summary::SummaryError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Tingli operations
pub type Result<T> = std::result::Result<T, TingliError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, FetchError, LessonLink};
pub use summary::{CrawlRun, LessonRecord, LessonStatus};
