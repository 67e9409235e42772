//! Crawl coordinator - main orchestration logic
//!
//! This module drives the end-to-end run: it owns the output directory and
//! HTTP client, walks the listing pages, processes each lesson (fetch →
//! extract → name → download), and flushes the summary when the walk ends.
//! Per-lesson failures are absorbed into failed records; only setup
//! failures abort the run.

use crate::config::Config;
use crate::crawler::extractor::{extract_lesson, title_from_url};
use crate::crawler::fetcher::{build_http_client, fetch_text, RetryPolicy};
use crate::crawler::parser::LessonLink;
use crate::crawler::walker::ListingWalker;
use crate::download::{
    audio_extension, download_audio, sanitize_title, DownloadStatus, FilenameAllocator,
};
use crate::summary::{CrawlRun, LessonRecord, LessonStatus};
use crate::TingliError;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Main crawl coordinator structure
pub struct Coordinator {
    config: Config,
    client: Client,
    policy: RetryPolicy,
    output_dir: PathBuf,
    config_hash: String,
}

impl Coordinator {
    /// Creates a coordinator, performing all setup that may fail
    ///
    /// Builds the HTTP client and creates the output directory. A directory
    /// that cannot be created is an unrecoverable setup error.
    pub fn new(config: Config, config_hash: &str) -> Result<Self, TingliError> {
        let client = build_http_client(&config.http)?;
        let policy = RetryPolicy::from_config(&config.http);

        let output_dir = PathBuf::from(&config.output.directory);
        std::fs::create_dir_all(&output_dir).map_err(|source| TingliError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        Ok(Self {
            config,
            client,
            policy,
            output_dir,
            config_hash: config_hash.to_string(),
        })
    }

    /// Runs the crawl to completion and returns the finished run state
    ///
    /// The start URL was validated at config load; lessons are processed
    /// strictly one at a time. The summary is flushed whether the walk
    /// finished naturally or was cut short by a listing failure.
    pub async fn run(&self) -> Result<CrawlRun, TingliError> {
        let start_url = match Url::parse(&self.config.crawl.start_url) {
            Ok(url) => url,
            Err(e) => {
                return Err(TingliError::Config(crate::ConfigError::Validation(
                    format!("start-url is not a valid URL: {}", e),
                )))
            }
        };

        tracing::info!("Starting crawl from {}", start_url);

        let mut run = CrawlRun::new(self.output_dir.clone(), &self.config_hash);
        let mut walker = ListingWalker::new(self.client.clone(), self.policy, start_url);
        let mut names = FilenameAllocator::new();
        let delay = Duration::from_millis(self.config.crawl.delay_between_requests_ms);

        let mut lessons_seen = 0u32;
        while let Some(link) = walker.next_lesson().await {
            if lessons_seen > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            lessons_seen += 1;

            let record = self.process_lesson(&link, &mut names).await;
            match record.status {
                LessonStatus::Downloaded => {
                    tracing::info!(
                        "{}: downloaded -> {}",
                        record.title,
                        record.filename.as_deref().unwrap_or("?")
                    );
                }
                LessonStatus::SkippedExists => {
                    tracing::info!(
                        "{}: already downloaded, skipping ({})",
                        record.title,
                        record.filename.as_deref().unwrap_or("?")
                    );
                }
                LessonStatus::Failed => {
                    tracing::warn!(
                        "{}: failed: {}",
                        record.title,
                        record.error.as_deref().unwrap_or("unknown error")
                    );
                }
            }
            run.record(record);
        }

        run.finish();
        run.flush(&self.config.output.summary_filename)?;

        let totals = run.totals();
        tracing::info!(
            "Crawl finished: {} listing page(s), {} lesson(s) ({} downloaded, {} skipped, {} failed)",
            walker.pages_visited(),
            run.lessons().len(),
            totals.downloaded,
            totals.skipped,
            totals.failed
        );

        Ok(run)
    }

    /// Processes one lesson end to end, always producing a record
    ///
    /// Every failure path lands in a `failed` record with the reason; none
    /// of them propagate.
    async fn process_lesson(
        &self,
        link: &LessonLink,
        names: &mut FilenameAllocator,
    ) -> LessonRecord {
        let page_url = link.url.to_string();

        let body = match fetch_text(&self.client, link.url.as_str(), &self.policy).await {
            Ok(body) => body,
            Err(e) => {
                return LessonRecord {
                    page_url,
                    title: self.resolve_title(link, None),
                    audio_url: None,
                    filename: None,
                    status: LessonStatus::Failed,
                    error: Some(e.to_string()),
                };
            }
        };

        let detail = match extract_lesson(&body, &link.url) {
            Ok(detail) => detail,
            Err(e) => {
                return LessonRecord {
                    page_url,
                    title: self.resolve_title(link, None),
                    audio_url: None,
                    filename: None,
                    status: LessonStatus::Failed,
                    error: Some(e.to_string()),
                };
            }
        };

        let title = self.resolve_title(link, detail.title.as_deref());
        let filename = names.assign(&sanitize_title(&title), audio_extension(&detail.audio_url));
        let dest = self.output_dir.join(&filename);

        let (status, error) =
            match download_audio(&self.client, &self.policy, &detail.audio_url, &dest).await {
                Ok(DownloadStatus::Downloaded) => (LessonStatus::Downloaded, None),
                Ok(DownloadStatus::SkippedExists) => (LessonStatus::SkippedExists, None),
                Err(e) => (LessonStatus::Failed, Some(e.to_string())),
            };

        LessonRecord {
            page_url,
            title,
            audio_url: Some(detail.audio_url.to_string()),
            filename: Some(filename),
            status,
            error,
        }
    }

    /// Picks the lesson title: detail-page heading, then listing anchor
    /// text, then a placeholder derived from the URL
    fn resolve_title(&self, link: &LessonLink, detail_title: Option<&str>) -> String {
        if let Some(title) = detail_title {
            if !title.is_empty() {
                return title.to_string();
            }
        }
        if !link.title.trim().is_empty() {
            return link.title.trim().to_string();
        }
        title_from_url(&link.url)
    }
}

/// Runs the main crawl operation
///
/// Convenience wrapper: builds a [`Coordinator`] and drives it to
/// completion.
pub async fn run_crawl(config: Config, config_hash: &str) -> Result<CrawlRun, TingliError> {
    let coordinator = Coordinator::new(config, config_hash)?;
    coordinator.run().await
}
