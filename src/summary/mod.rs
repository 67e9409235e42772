//! Run state and summary output
//!
//! [`CrawlRun`] accumulates one record per processed lesson, in discovery
//! order, together with running totals and run metadata. At the end of a
//! run (including a run cut short by a listing failure) the whole thing is
//! serialized to a JSON summary file, overwriting any previous summary.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while writing the summary
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Failed to serialize summary: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Terminal outcome of one lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LessonStatus {
    /// Audio was fetched and written to disk
    Downloaded,

    /// Audio file already existed locally; nothing was fetched
    SkippedExists,

    /// Fetch, extraction, or download failed for this lesson
    Failed,
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Downloaded => "downloaded",
            Self::SkippedExists => "skipped-exists",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// The persisted outcome and metadata for one processed lesson
#[derive(Debug, Clone, Serialize)]
pub struct LessonRecord {
    /// URL of the lesson page this record describes
    pub page_url: String,

    /// Resolved lesson title (possibly a placeholder derived from the URL)
    pub title: String,

    /// Resolved audio URL, or null if resolution never succeeded
    pub audio_url: Option<String>,

    /// Local filename the audio was (or would have been) written to
    pub filename: Option<String>,

    /// Terminal outcome for this lesson
    pub status: LessonStatus,

    /// Failure reason when status is `failed`
    pub error: Option<String>,
}

/// Running totals for a crawl
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunTotals {
    pub downloaded: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Process-scoped state for one crawl run
///
/// Created at startup, fed one record per lesson, and flushed exactly once
/// at the end. Passed explicitly through the pipeline; there is no global
/// run state.
#[derive(Debug, Serialize)]
pub struct CrawlRun {
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    config_hash: String,
    totals: RunTotals,
    lessons: Vec<LessonRecord>,

    #[serde(skip)]
    output_dir: PathBuf,
}

impl CrawlRun {
    /// Creates a new run rooted at the given output directory
    pub fn new(output_dir: PathBuf, config_hash: &str) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            config_hash: config_hash.to_string(),
            totals: RunTotals::default(),
            lessons: Vec::new(),
            output_dir,
        }
    }

    /// Appends a lesson record and updates the totals
    pub fn record(&mut self, record: LessonRecord) {
        match record.status {
            LessonStatus::Downloaded => self.totals.downloaded += 1,
            LessonStatus::SkippedExists => self.totals.skipped += 1,
            LessonStatus::Failed => self.totals.failed += 1,
        }
        self.lessons.push(record);
    }

    /// The directory downloads are written into
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Records in discovery order
    pub fn lessons(&self) -> &[LessonRecord] {
        &self.lessons
    }

    pub fn totals(&self) -> RunTotals {
        self.totals
    }

    /// Marks the run as finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Serializes the run to the summary file, replacing any previous one
    ///
    /// Called unconditionally at the end of a run, so a walk cut short by a
    /// listing failure still leaves a summary of the lessons it reached.
    pub fn flush(&self, summary_filename: &str) -> Result<PathBuf, SummaryError> {
        let path = self.output_dir.join(summary_filename);
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(&path, json)?;
        tracing::info!(
            "Summary written to {} ({} lesson(s))",
            path.display(),
            self.lessons.len()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, status: LessonStatus) -> LessonRecord {
        LessonRecord {
            page_url: url.to_string(),
            title: "A Lesson".to_string(),
            audio_url: Some("https://example.com/a.mp3".to_string()),
            filename: Some("A_Lesson.mp3".to_string()),
            status,
            error: None,
        }
    }

    #[test]
    fn test_records_keep_discovery_order() {
        let mut run = CrawlRun::new(PathBuf::from("/tmp"), "hash");
        run.record(record("https://example.com/b", LessonStatus::Downloaded));
        run.record(record("https://example.com/a", LessonStatus::Failed));

        let urls: Vec<_> = run.lessons().iter().map(|r| r.page_url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/b", "https://example.com/a"]);
    }

    #[test]
    fn test_totals_track_statuses() {
        let mut run = CrawlRun::new(PathBuf::from("/tmp"), "hash");
        run.record(record("u1", LessonStatus::Downloaded));
        run.record(record("u2", LessonStatus::Downloaded));
        run.record(record("u3", LessonStatus::SkippedExists));
        run.record(record("u4", LessonStatus::Failed));

        let totals = run.totals();
        assert_eq!(totals.downloaded, 2);
        assert_eq!(totals.skipped, 1);
        assert_eq!(totals.failed, 1);
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&LessonStatus::SkippedExists).unwrap(),
            "\"skipped-exists\""
        );
        assert_eq!(
            serde_json::to_string(&LessonStatus::Downloaded).unwrap(),
            "\"downloaded\""
        );
    }

    #[test]
    fn test_flush_writes_records_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();

        let mut run = CrawlRun::new(dir.path().to_path_buf(), "hash-one");
        run.record(record("https://example.com/one", LessonStatus::Downloaded));
        run.finish();
        let path = run.flush("summary.json").unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["lessons"].as_array().unwrap().len(), 1);
        assert_eq!(value["lessons"][0]["status"], "downloaded");
        assert_eq!(value["config_hash"], "hash-one");

        // A second flush replaces the file rather than appending
        let mut rerun = CrawlRun::new(dir.path().to_path_buf(), "hash-two");
        rerun.record(record("https://example.com/one", LessonStatus::SkippedExists));
        rerun.finish();
        rerun.flush("summary.json").unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["lessons"].as_array().unwrap().len(), 1);
        assert_eq!(value["lessons"][0]["status"], "skipped-exists");
        assert_eq!(value["config_hash"], "hash-two");
    }

    #[test]
    fn test_failed_record_carries_null_fields() {
        let rec = LessonRecord {
            page_url: "https://example.com/silent".to_string(),
            title: "Silent".to_string(),
            audio_url: None,
            filename: None,
            status: LessonStatus::Failed,
            error: Some("no audio resource found".to_string()),
        };

        let value = serde_json::to_value(&rec).unwrap();
        assert!(value["audio_url"].is_null());
        assert!(value["filename"].is_null());
        assert_eq!(value["status"], "failed");
    }
}
