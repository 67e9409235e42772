//! Audio download management
//!
//! This module owns everything about getting an audio file onto disk:
//! - Idempotent downloads: an existing destination file short-circuits
//!   before any network I/O
//! - Atomic writes: bytes go to a `.part` sibling first, then rename
//! - Filename derivation: title sanitization, extension inference, and
//!   collision disambiguation within a run

use crate::crawler::fetcher::{fetch_bytes, FetchError, RetryPolicy};
use reqwest::Client;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Longest allowed sanitized title stem (bytes)
const MAX_STEM_LEN: usize = 120;

/// Extension used when the audio URL does not reveal one
const DEFAULT_AUDIO_EXT: &str = "mp3";

/// Audio file extensions we trust when inferring from a URL path
const KNOWN_AUDIO_EXTS: &[&str] = &["mp3", "m4a", "ogg", "wav", "aac", "flac"];

/// Errors from downloading an audio file
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Outcome of a download request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    /// The file was fetched and written
    Downloaded,

    /// The destination already existed; no request was made
    SkippedExists,
}

/// Downloads an audio file to `dest`, skipping if it already exists
///
/// The existence check looks only at the final path, so a `.part` file
/// orphaned by an interrupted run never suppresses a re-download. Bytes are
/// written to the `.part` sibling and renamed into place, so `dest` is
/// either absent or complete.
pub async fn download_audio(
    client: &Client,
    policy: &RetryPolicy,
    audio_url: &Url,
    dest: &Path,
) -> Result<DownloadStatus, DownloadError> {
    if dest.exists() {
        return Ok(DownloadStatus::SkippedExists);
    }

    let body = fetch_bytes(client, audio_url.as_str(), policy).await?;

    let part_path = partial_path(dest);
    std::fs::write(&part_path, &body).map_err(|source| DownloadError::Write {
        path: part_path.clone(),
        source,
    })?;
    std::fs::rename(&part_path, dest).map_err(|source| DownloadError::Write {
        path: dest.to_path_buf(),
        source,
    })?;

    tracing::debug!("Wrote {} bytes to {}", body.len(), dest.display());
    Ok(DownloadStatus::Downloaded)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

/// Sanitizes a lesson title into a filesystem-safe filename stem
///
/// Keeps ASCII alphanumerics, `.`, `-`, and `_`; every run of whitespace or
/// disallowed characters collapses into a single underscore. The result is
/// trimmed of leading/trailing separators, capped in length, and never
/// empty.
pub fn sanitize_title(title: &str) -> String {
    let mut stem = String::new();
    let mut pending_separator = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            if pending_separator && !stem.is_empty() {
                stem.push('_');
            }
            pending_separator = false;
            stem.push(c);
        } else {
            pending_separator = true;
        }
    }

    let mut stem: String = stem
        .trim_matches(|c| c == '.' || c == '-' || c == '_')
        .to_string();
    stem.truncate(MAX_STEM_LEN);

    if stem.is_empty() {
        "lesson".to_string()
    } else {
        stem
    }
}

/// Infers the audio file extension from a URL path
///
/// Falls back to `mp3` when the path has no recognizable audio extension.
pub fn audio_extension(url: &Url) -> &'static str {
    let path = url.path().to_ascii_lowercase();
    let ext = path.rsplit('.').next().unwrap_or("");
    KNOWN_AUDIO_EXTS
        .iter()
        .find(|known| **known == ext)
        .copied()
        .unwrap_or(DEFAULT_AUDIO_EXT)
}

/// Hands out filenames that are unique within one run
///
/// Two lessons whose titles sanitize to the same stem get `stem.ext` and
/// `stem_2.ext`, in discovery order, so neither silently overwrites the
/// other.
#[derive(Debug, Default)]
pub struct FilenameAllocator {
    used: HashSet<String>,
}

impl FilenameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a filename for the given stem and extension, disambiguating
    /// collisions with a numeric suffix
    pub fn assign(&mut self, stem: &str, ext: &str) -> String {
        let candidate = format!("{}.{}", stem, ext);
        if self.used.insert(candidate.clone()) {
            return candidate;
        }

        let mut counter = 2u32;
        loop {
            let candidate = format!("{}_{}.{}", stem, counter, ext);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            counter += 1;
        }
    }
}
