use url::Url;

use crate::document::PageDocument;
use crate::provider::{first_text, parse_published_date, MetadataProvider, PartialMetadata};
use crate::providers::{host_matches, title_case};

const SERIES: &[&str] = &[
    "cryptic", "quick", "quiptic", "prize", "everyman", "speedy", "weekend", "genius", "azed",
];

/// theguardian.com/crosswords/<series>/<number>
pub struct GuardianProvider;

impl GuardianProvider {
    fn series(url: &Url) -> Option<&str> {
        let mut segments = url.path_segments()?;
        if segments.next()? != "crosswords" {
            return None;
        }
        let series = segments.next()?;
        SERIES.contains(&series).then_some(series)
    }
}

impl MetadataProvider for GuardianProvider {
    fn name(&self) -> &'static str {
        "guardian"
    }

    fn test(&self, url: &Url, _doc: &PageDocument) -> bool {
        host_matches(url, "theguardian.com") && Self::series(url).is_some()
    }

    fn load_metadata(&self, url: &Url, doc: &PageDocument) -> PartialMetadata {
        PartialMetadata {
            series: Self::series(url).map(|series| format!("Guardian {}", title_case(series))),
            title: first_text(doc, &["//h1", "//meta[@property='og:title']/@content"]),
            setter: first_text(
                doc,
                &["//a[@rel='author']", "//meta[@name='author']/@content"],
            ),
            date_published: first_text(
                doc,
                &[
                    "//time/@datetime",
                    "//meta[@property='article:published_time']/@content",
                ],
            )
            .and_then(|raw| parse_published_date(&raw)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DomNode;

    #[test]
    fn matches_crossword_pages_only() {
        let doc = PageDocument::new(DomNode::element("HTML"));
        let provider = GuardianProvider;
        for (url, expected) in [
            ("https://www.theguardian.com/crosswords/cryptic/29211", true),
            ("https://www.theguardian.com/crosswords/azed/2680", true),
            ("https://www.theguardian.com/crosswords/crossword-blog", false),
            ("https://www.theguardian.com/uk-news/2023/oct/26/x", false),
            ("https://theguardian.com.evil.example/crosswords/cryptic/1", false),
        ] {
            let url = Url::parse(url).unwrap();
            assert_eq!(provider.test(&url, &doc), expected, "{url}");
        }
    }

    #[test]
    fn missing_fields_stay_empty() {
        let doc = PageDocument::new(DomNode::element("HTML"));
        let url = Url::parse("https://www.theguardian.com/crosswords/quick/16000").unwrap();
        let metadata = GuardianProvider.load_metadata(&url, &doc);
        assert_eq!(metadata.series.as_deref(), Some("Guardian Quick"));
        assert_eq!(metadata.title, None);
        assert_eq!(metadata.setter, None);
        assert_eq!(metadata.date_published, None);
    }
}
