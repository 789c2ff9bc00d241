//! Listing-page records for the board scraper that runs alongside the merger.
//!
//! Only the DOM-selection step lives here: one page of HTML in, records out. Fetching,
//! pagination and output are left to the caller. Nothing in `combine` depends on this.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Placeholder for an author or date the listing does not show.
pub const UNKNOWN_FIELD: &str = "unknown";

/// Separator between author and date in a listing's info line.
const INFO_SEPARATOR: char = '·';

/// One post on a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub title: String,
    /// Absolute URL of the post.
    pub url: String,
    pub author: String,
    /// Date as displayed, e.g. `6일 전`; not parsed.
    pub date_text: String,
}

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("Invalid base URL: {input}: {reason}")]
    InvalidBaseUrl { input: String, reason: String },

    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// CSS selectors for one listing layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSelectors {
    /// One element per post.
    pub item: String,
    /// Title link inside an item; its text is the title and its `href` the URL.
    pub title_link: String,
    /// Element inside an item whose text is `author · date`.
    pub info: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            item: r#"li[class*="py-3.5 sm:py-4"]"#.to_string(),
            title_link: "a.line-clamp-1".to_string(),
            info: "div.flex.items-center.space-x-1.text-sm.text-gray-500".to_string(),
        }
    }
}

/// Parse a CSS selector or return a selector error (avoids panics from Selector::parse).
fn parse_selector(sel: &str) -> Result<Selector, ListingError> {
    Selector::parse(sel).map_err(|e| ListingError::InvalidSelector {
        selector: sel.to_string(),
        reason: e.to_string(),
    })
}

/// Extract records from one listing page. Items without a title link are skipped, as are
/// links that cannot be resolved against `base_url`.
pub fn parse_listing(
    html: &str,
    base_url: &str,
    selectors: &ListingSelectors,
) -> Result<Vec<ListingRecord>, ListingError> {
    let base = Url::parse(base_url).map_err(|e| ListingError::InvalidBaseUrl {
        input: base_url.to_string(),
        reason: e.to_string(),
    })?;
    let item_sel = parse_selector(&selectors.item)?;
    let title_sel = parse_selector(&selectors.title_link)?;
    let info_sel = parse_selector(&selectors.info)?;

    let document = Html::parse_document(html);
    let mut records = Vec::new();
    for item in document.select(&item_sel) {
        let Some(link) = item.select(&title_sel).next() else {
            continue;
        };
        let href = link.value().attr("href").unwrap_or("").trim();
        let url = match base.join(href) {
            Ok(u) => u,
            Err(e) => {
                tracing::debug!(href, error = %e, "skipping listing item with unusable link");
                continue;
            }
        };
        let (author, date_text) = match item.select(&info_sel).next() {
            Some(info) => split_info(&element_text(&info)),
            None => (UNKNOWN_FIELD.to_string(), UNKNOWN_FIELD.to_string()),
        };
        records.push(ListingRecord {
            title: element_text(&link),
            url: url.to_string(),
            author,
            date_text,
        });
    }
    Ok(records)
}

/// Concatenated text of an element with each text node trimmed.
fn element_text(el: &ElementRef<'_>) -> String {
    el.text().map(str::trim).collect::<String>()
}

/// `author · date` → (author, date). Anything else keeps the whole text as the date.
fn split_info(text: &str) -> (String, String) {
    let parts: Vec<&str> = text.split(INFO_SEPARATOR).collect();
    match parts.as_slice() {
        [author, date] => (author.trim().to_string(), date.trim().to_string()),
        _ => (UNKNOWN_FIELD.to_string(), text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://okky.kr/community/gathering";

    const PAGE: &str = r#"
        <html><body><ul>
          <li class="flex py-3.5 sm:py-4 border-b">
            <a class="line-clamp-1 text-base" href="/article/101">  스터디 모집  </a>
            <div class="flex items-center space-x-1 text-sm text-gray-500">박중호 · 6일 전</div>
          </li>
          <li class="py-3.5 sm:py-4">
            <a class="line-clamp-1" href="https://example.com/post/7">External</a>
          </li>
          <li class="py-3.5 sm:py-4">
            <span>no title link here</span>
          </li>
          <li class="py-3.5 sm:py-4">
            <a class="line-clamp-1" href="/article/103">Odd info</a>
            <div class="flex items-center space-x-1 text-sm text-gray-500">방금</div>
          </li>
          <li class="other"><a class="line-clamp-1" href="/ignored">Ignored</a></li>
        </ul></body></html>
    "#;

    #[test]
    fn parses_listing_items() -> Result<(), ListingError> {
        let records = parse_listing(PAGE, BASE, &ListingSelectors::default())?;
        assert_eq!(records.len(), 3);

        assert_eq!(
            records[0],
            ListingRecord {
                title: "스터디 모집".to_string(),
                url: "https://okky.kr/article/101".to_string(),
                author: "박중호".to_string(),
                date_text: "6일 전".to_string(),
            }
        );
        assert_eq!(records[1].url, "https://example.com/post/7");
        assert_eq!(records[1].author, UNKNOWN_FIELD);
        assert_eq!(records[1].date_text, UNKNOWN_FIELD);
        assert_eq!(records[2].author, UNKNOWN_FIELD);
        assert_eq!(records[2].date_text, "방금");
        Ok(())
    }

    #[test]
    fn invalid_base_url_errors() {
        let result = parse_listing(PAGE, "not-a-url", &ListingSelectors::default());
        assert!(matches!(result, Err(ListingError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn invalid_selector_errors() {
        let selectors = ListingSelectors {
            item: "li[".to_string(),
            ..ListingSelectors::default()
        };
        let result = parse_listing(PAGE, BASE, &selectors);
        assert!(matches!(result, Err(ListingError::InvalidSelector { .. })));
    }

    #[test]
    fn split_info_requires_exactly_one_separator() {
        assert_eq!(
            split_info("a · b"),
            ("a".to_string(), "b".to_string())
        );
        assert_eq!(
            split_info("a · b · c"),
            (UNKNOWN_FIELD.to_string(), "a · b · c".to_string())
        );
    }

    #[test]
    fn record_serializes_with_snake_case_fields() -> Result<(), serde_json::Error> {
        let record = ListingRecord {
            title: "t".to_string(),
            url: "https://okky.kr/article/1".to_string(),
            author: "a".to_string(),
            date_text: "d".to_string(),
        };
        let json = serde_json::to_string(&record)?;
        assert!(json.contains("\"date_text\":\"d\""));
        let back: ListingRecord = serde_json::from_str(&json)?;
        assert_eq!(back, record);
        Ok(())
    }
}
