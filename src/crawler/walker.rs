//! Listing walker: pagination across the lesson archive
//!
//! Produces lesson links one at a time across all listing pages, fetching
//! the next page lazily only when the current page's lessons are exhausted.
//! The walk is forward-only and finite: a visited-URL set guards against
//! pagination that loops back on itself, and any listing-level fetch or
//! parse failure ends the walk while keeping everything yielded so far.

use crate::crawler::fetcher::{fetch_text, RetryPolicy};
use crate::crawler::parser::{Document, LessonLink};
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Lazy producer of lesson links across paginated listing pages
pub struct ListingWalker {
    client: Client,
    policy: RetryPolicy,
    next_listing: Option<Url>,
    visited: HashSet<String>,
    queue: VecDeque<LessonLink>,
    pages_visited: u32,
    finished: bool,
}

impl ListingWalker {
    /// Creates a walker starting from the first listing page
    pub fn new(client: Client, policy: RetryPolicy, start_url: Url) -> Self {
        Self {
            client,
            policy,
            next_listing: Some(start_url),
            visited: HashSet::new(),
            queue: VecDeque::new(),
            pages_visited: 0,
            finished: false,
        }
    }

    /// Number of listing pages fetched and parsed so far
    pub fn pages_visited(&self) -> u32 {
        self.pages_visited
    }

    /// Yields the next lesson link, or `None` when the walk is over
    ///
    /// Fetches further listing pages on demand. Termination conditions:
    /// no next-page URL, a next-page URL that was already visited, or a
    /// fetch/parse failure on a listing page (logged, not propagated;
    /// lessons from earlier pages are unaffected).
    pub async fn next_lesson(&mut self) -> Option<LessonLink> {
        loop {
            if let Some(lesson) = self.queue.pop_front() {
                return Some(lesson);
            }

            if self.finished {
                return None;
            }

            let listing_url = match self.next_listing.take() {
                Some(url) => url,
                None => {
                    tracing::info!(
                        "Pagination exhausted after {} listing page(s)",
                        self.pages_visited
                    );
                    self.finished = true;
                    return None;
                }
            };

            if !self.visited.insert(listing_url.to_string()) {
                tracing::warn!(
                    "Listing page {} already visited, stopping pagination",
                    listing_url
                );
                self.finished = true;
                return None;
            }

            let body = match fetch_text(&self.client, listing_url.as_str(), &self.policy).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!("Failed to fetch listing page {}: {}", listing_url, e);
                    self.finished = true;
                    return None;
                }
            };

            let listing = match Document::parse(&body).listing(&listing_url) {
                Ok(listing) => listing,
                Err(e) => {
                    tracing::warn!("Failed to parse listing page {}: {}", listing_url, e);
                    self.finished = true;
                    return None;
                }
            };

            self.pages_visited += 1;
            tracing::info!(
                "Listing page {} ({} lesson(s) found)",
                listing_url,
                listing.lessons.len()
            );

            self.queue.extend(listing.lessons);
            self.next_listing = listing.next_page;
        }
    }
}

// Walker behavior over live pagination (including the cycle guard and
// mid-walk failures) is exercised end-to-end in tests/crawl_tests.rs.
