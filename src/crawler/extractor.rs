//! Lesson-detail extraction
//!
//! Turns a fetched lesson page into the fields the pipeline needs: a title
//! (with fallbacks) and the absolute URL of the lesson's audio file.

use crate::crawler::parser::Document;
use thiserror::Error;
use url::Url;

/// Errors from lesson-detail extraction
///
/// A lesson without audio is not fatal to the run; the coordinator records
/// the lesson as failed and moves on.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no audio resource found on lesson page {url}")]
    NoAudioFound { url: String },
}

/// The resolved detail of one lesson page
#[derive(Debug, Clone)]
pub struct LessonDetail {
    /// Title from the page heading, if the page has one
    pub title: Option<String>,

    /// Absolute URL of the lesson's audio file
    pub audio_url: Url,
}

/// Extracts the title and audio URL from a lesson page
///
/// Relative audio references are resolved against `page_url`. Returns
/// [`ExtractError::NoAudioFound`] when the page carries no usable audio
/// reference at all.
pub fn extract_lesson(html: &str, page_url: &Url) -> Result<LessonDetail, ExtractError> {
    let raw = Document::parse(html).lesson_detail();

    let audio_url = raw
        .audio_src
        .as_deref()
        .and_then(|src| page_url.join(src.trim()).ok())
        .ok_or_else(|| ExtractError::NoAudioFound {
            url: page_url.to_string(),
        })?;

    Ok(LessonDetail {
        title: raw.title,
        audio_url,
    })
}

/// Derives a placeholder title from a lesson URL
///
/// Used when neither the lesson page nor the listing provided a title. The
/// last non-empty path segment stands in, with separators spaced out.
pub fn title_from_url(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or("lesson");

    let spaced = segment.replace(['-', '_'], " ");
    let trimmed = spaced.trim();
    if trimmed.is_empty() {
        "lesson".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://example.com/lessons/ordering-coffee").unwrap()
    }

    #[test]
    fn test_extracts_title_and_audio() {
        let html = r#"<html><body>
            <h1>Ordering Coffee</h1>
            <audio controls><source src="/media/coffee.mp3" type="audio/mpeg"></audio>
        </body></html>"#;

        let detail = extract_lesson(html, &page_url()).unwrap();
        assert_eq!(detail.title.as_deref(), Some("Ordering Coffee"));
        assert_eq!(
            detail.audio_url.as_str(),
            "https://example.com/media/coffee.mp3"
        );
    }

    #[test]
    fn test_absolute_audio_url_passes_through() {
        let html = r#"<html><body>
            <audio><source src="https://cdn.example.com/a.mp3"></audio>
        </body></html>"#;

        let detail = extract_lesson(html, &page_url()).unwrap();
        assert_eq!(detail.audio_url.as_str(), "https://cdn.example.com/a.mp3");
    }

    #[test]
    fn test_missing_audio_is_no_audio_found() {
        let html = r#"<html><body><h1>Silent Lesson</h1></body></html>"#;
        let result = extract_lesson(html, &page_url());
        assert!(matches!(result, Err(ExtractError::NoAudioFound { .. })));
    }

    #[test]
    fn test_missing_title_is_allowed() {
        let html = r#"<html><body>
            <audio><source src="/media/untitled.mp3"></audio>
        </body></html>"#;

        let detail = extract_lesson(html, &page_url()).unwrap();
        assert!(detail.title.is_none());
    }

    #[test]
    fn test_title_from_url_uses_last_segment() {
        let url = Url::parse("https://example.com/lessons/ordering-coffee").unwrap();
        assert_eq!(title_from_url(&url), "ordering coffee");
    }

    #[test]
    fn test_title_from_url_skips_trailing_slash() {
        let url = Url::parse("https://example.com/lessons/first_lesson/").unwrap();
        assert_eq!(title_from_url(&url), "first lesson");
    }

    #[test]
    fn test_title_from_url_handles_bare_root() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(title_from_url(&url), "lesson");
    }
}
