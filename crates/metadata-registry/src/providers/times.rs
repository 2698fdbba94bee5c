use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::document::PageDocument;
use crate::provider::{first_text, parse_published_date, MetadataProvider, PartialMetadata};
use crate::providers::host_matches;

// "Times Cryptic No 28765", "Sunday Times Crossword No. 5,123"
static TITLE_SERIES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?P<series>.+?)\s+(?:crossword\s+)?no\.?\s*[\d,]+")
        .expect("times title regex")
});

/// The Times / Sunday Times crossword club.
pub struct TimesProvider;

impl TimesProvider {
    fn series_from_title(title: &str) -> Option<String> {
        TITLE_SERIES
            .captures(title)
            .and_then(|caps| caps.name("series"))
            .map(|series| series.as_str().trim().to_string())
            .filter(|series| !series.is_empty())
    }
}

impl MetadataProvider for TimesProvider {
    fn name(&self) -> &'static str {
        "times"
    }

    fn test(&self, url: &Url, _doc: &PageDocument) -> bool {
        (host_matches(url, "thetimes.co.uk") || host_matches(url, "thetimes.com"))
            && url.path().contains("crossword")
    }

    fn load_metadata(&self, _url: &Url, doc: &PageDocument) -> PartialMetadata {
        let title = first_text(
            doc,
            &["//h1", "//meta[@property='og:title']/@content", "//title"],
        );
        PartialMetadata {
            series: title.as_deref().and_then(Self::series_from_title),
            setter: first_text(
                doc,
                &[
                    "//*[contains(@class,'setter')]",
                    "//meta[@name='author']/@content",
                ],
            ),
            date_published: first_text(
                doc,
                &["//time/@datetime", "//*[contains(@class,'puzzle-date')]"],
            )
            .and_then(|raw| parse_published_date(&raw)),
            title,
        }
    }
}
