//! HTML parsing for listing and lesson pages
//!
//! This module wraps the HTML tree behind a [`Document`] type with two typed
//! queries (listing extraction and lesson-detail extraction) so the rest
//! of the pipeline never touches the parsing library's object model.
//!
//! The selectors encode the one site layout this crawler targets: lesson
//! entries live in `div.archive_teaser` blocks with the link inside
//! `div.archive_title a`, pagination is a numbered `div.paginator` whose
//! `a.selected` entry marks the current page, and lesson audio sits in an
//! `<audio>` element (usually via a nested `<source>`).

use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

/// Errors from interpreting a parsed page
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no lesson entries found on listing page {url}")]
    NoListingEntries { url: String },
}

/// A lesson as discovered on a listing page
#[derive(Debug, Clone)]
pub struct LessonLink {
    /// Title text from the listing anchor (may be empty)
    pub title: String,

    /// Absolute URL of the lesson page
    pub url: Url,
}

/// The useful content of one listing page
#[derive(Debug, Clone)]
pub struct ListingPage {
    /// Lessons in the order they appear on the page
    pub lessons: Vec<LessonLink>,

    /// Absolute URL of the next listing page, if the paginator has one
    pub next_page: Option<Url>,
}

/// Raw lesson-detail fields pulled from a lesson page
///
/// Both fields are optional at this layer; the extractor decides what their
/// absence means.
#[derive(Debug, Clone, Default)]
pub struct LessonDetailRaw {
    /// Text of the page's main heading, trimmed
    pub title: Option<String>,

    /// The audio source reference exactly as it appears in the markup
    pub audio_src: Option<String>,
}

/// A parsed HTML page exposing the two queries the crawler needs
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML into a queryable document
    ///
    /// The underlying parser is lenient and never rejects input; failures
    /// surface from the queries when no recognizable structure exists.
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// Extracts the lesson links and next-page URL from a listing page
    ///
    /// Relative hrefs are resolved against `base`, the URL the listing was
    /// fetched from. A listing with no lesson entries at all is treated as
    /// unrecognizable structure and returns an error; a missing paginator or
    /// missing next-page anchor simply ends pagination.
    pub fn listing(&self, base: &Url) -> Result<ListingPage, ParseError> {
        let mut lessons = Vec::new();

        if let (Ok(teaser_sel), Ok(link_sel)) = (
            Selector::parse("div.archive_teaser"),
            Selector::parse("div.archive_title a"),
        ) {
            for entry in self.html.select(&teaser_sel) {
                let Some(anchor) = entry.select(&link_sel).next() else {
                    continue;
                };
                let Some(href) = anchor.value().attr("href") else {
                    continue;
                };
                let Ok(url) = base.join(href) else {
                    continue;
                };
                let title = anchor.text().collect::<String>().trim().to_string();
                lessons.push(LessonLink { title, url });
            }
        }

        if lessons.is_empty() {
            return Err(ParseError::NoListingEntries {
                url: base.to_string(),
            });
        }

        Ok(ListingPage {
            lessons,
            next_page: self.next_page_url(base),
        })
    }

    /// Finds the next listing page via the numbered paginator
    ///
    /// The paginator marks the current page with `a.selected`; the anchor
    /// whose text is the following number, if present, is the next page.
    fn next_page_url(&self, base: &Url) -> Option<Url> {
        let paginator_sel = Selector::parse("div.paginator").ok()?;
        let selected_sel = Selector::parse("a.selected").ok()?;
        let anchor_sel = Selector::parse("a").ok()?;

        let paginator = self.html.select(&paginator_sel).next()?;
        let current: u32 = paginator
            .select(&selected_sel)
            .next()?
            .text()
            .collect::<String>()
            .trim()
            .parse()
            .ok()?;

        let next_label = (current + 1).to_string();
        for anchor in paginator.select(&anchor_sel) {
            if anchor.text().collect::<String>().trim() == next_label {
                if let Some(href) = anchor.value().attr("href") {
                    return base.join(href).ok();
                }
            }
        }

        None
    }

    /// Extracts the raw title and audio reference from a lesson page
    ///
    /// The audio source is taken from a `<source>` child of the `<audio>`
    /// element, falling back to a `src` attribute on `<audio>` itself.
    pub fn lesson_detail(&self) -> LessonDetailRaw {
        let mut detail = LessonDetailRaw::default();

        if let Ok(heading_sel) = Selector::parse("h1") {
            detail.title = self
                .html
                .select(&heading_sel)
                .next()
                .map(|e| e.text().collect::<String>().trim().to_string())
                .filter(|t| !t.is_empty());
        }

        if detail.title.is_none() {
            if let Ok(title_sel) = Selector::parse("title") {
                detail.title = self
                    .html
                    .select(&title_sel)
                    .next()
                    .map(|e| e.text().collect::<String>().trim().to_string())
                    .filter(|t| !t.is_empty());
            }
        }

        if let Ok(audio_sel) = Selector::parse("audio") {
            if let Some(audio) = self.html.select(&audio_sel).next() {
                if let Ok(source_sel) = Selector::parse("source") {
                    detail.audio_src = audio
                        .select(&source_sel)
                        .next()
                        .and_then(|s| s.value().attr("src"))
                        .map(str::to_string);
                }
                if detail.audio_src.is_none() {
                    detail.audio_src = audio.value().attr("src").map(str::to_string);
                }
            }
        }

        detail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/lessons/absolute-beginners?page=1").unwrap()
    }

    fn listing_html(entries: &[(&str, &str)], paginator: &str) -> String {
        let teasers: String = entries
            .iter()
            .map(|(title, href)| {
                format!(
                    r#"<div class="archive_teaser">
                        <div class="archive_title"><a class="black nonlink" href="{}">{}</a></div>
                    </div>"#,
                    href, title
                )
            })
            .collect();
        format!(
            "<html><body>{}{}</body></html>",
            teasers, paginator
        )
    }

    #[test]
    fn test_listing_extracts_entries_in_order() {
        let html = listing_html(
            &[("First Lesson", "/lessons/first"), ("Second Lesson", "/lessons/second")],
            "",
        );
        let listing = Document::parse(&html).listing(&base_url()).unwrap();

        assert_eq!(listing.lessons.len(), 2);
        assert_eq!(listing.lessons[0].title, "First Lesson");
        assert_eq!(
            listing.lessons[0].url.as_str(),
            "https://example.com/lessons/first"
        );
        assert_eq!(listing.lessons[1].title, "Second Lesson");
    }

    #[test]
    fn test_listing_resolves_relative_hrefs() {
        let html = listing_html(&[("A Lesson", "detail/a-lesson")], "");
        let listing = Document::parse(&html).listing(&base_url()).unwrap();
        assert_eq!(
            listing.lessons[0].url.as_str(),
            "https://example.com/lessons/detail/a-lesson"
        );
    }

    #[test]
    fn test_listing_without_entries_is_parse_error() {
        let html = "<html><body><p>Nothing here</p></body></html>";
        let result = Document::parse(html).listing(&base_url());
        assert!(matches!(
            result,
            Err(ParseError::NoListingEntries { .. })
        ));
    }

    #[test]
    fn test_missing_paginator_means_no_next_page() {
        let html = listing_html(&[("Only Lesson", "/lessons/only")], "");
        let listing = Document::parse(&html).listing(&base_url()).unwrap();
        assert!(listing.next_page.is_none());
    }

    #[test]
    fn test_paginator_yields_next_page() {
        let paginator = r#"<div class="paginator" id="paginator">
            <a class="selected" href="?page=1">1</a>
            <a href="?page=2">2</a>
            <a href="?page=3">3</a>
        </div>"#;
        let html = listing_html(&[("Lesson", "/lessons/x")], paginator);
        let listing = Document::parse(&html).listing(&base_url()).unwrap();
        assert_eq!(
            listing.next_page.unwrap().as_str(),
            "https://example.com/lessons/absolute-beginners?page=2"
        );
    }

    #[test]
    fn test_paginator_on_last_page_has_no_next() {
        let paginator = r#"<div class="paginator" id="paginator">
            <a href="?page=1">1</a>
            <a class="selected" href="?page=2">2</a>
        </div>"#;
        let html = listing_html(&[("Lesson", "/lessons/x")], paginator);
        let listing = Document::parse(&html).listing(&base_url()).unwrap();
        assert!(listing.next_page.is_none());
    }

    #[test]
    fn test_lesson_detail_title_from_heading() {
        let html = r#"<html><head><title>Site | Lesson</title></head>
            <body><h1>  Ordering Coffee  </h1></body></html>"#;
        let detail = Document::parse(html).lesson_detail();
        assert_eq!(detail.title.as_deref(), Some("Ordering Coffee"));
    }

    #[test]
    fn test_lesson_detail_title_falls_back_to_title_tag() {
        let html = r#"<html><head><title>Ordering Coffee</title></head><body></body></html>"#;
        let detail = Document::parse(html).lesson_detail();
        assert_eq!(detail.title.as_deref(), Some("Ordering Coffee"));
    }

    #[test]
    fn test_lesson_detail_audio_from_source_child() {
        let html = r#"<html><body>
            <audio controls><source src="/media/lesson1.mp3" type="audio/mpeg"></audio>
        </body></html>"#;
        let detail = Document::parse(html).lesson_detail();
        assert_eq!(detail.audio_src.as_deref(), Some("/media/lesson1.mp3"));
    }

    #[test]
    fn test_lesson_detail_audio_src_attribute_fallback() {
        let html = r#"<html><body><audio src="/media/lesson2.mp3"></audio></body></html>"#;
        let detail = Document::parse(html).lesson_detail();
        assert_eq!(detail.audio_src.as_deref(), Some("/media/lesson2.mp3"));
    }

    #[test]
    fn test_lesson_detail_without_audio() {
        let html = r#"<html><body><h1>No Audio Here</h1></body></html>"#;
        let detail = Document::parse(html).lesson_detail();
        assert!(detail.audio_src.is_none());
    }
}
