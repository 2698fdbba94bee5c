use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use url::Url;

use crate::document::PageDocument;
use crate::provider::{first_text, MetadataProvider, PartialMetadata};
use crate::providers::{host_matches, title_case};

/// nytimes.com/crosswords/game/<kind>/<yyyy>/<mm>/<dd>
pub struct NewYorkTimesProvider;

impl NewYorkTimesProvider {
    fn game_path(url: &Url) -> Option<Vec<&str>> {
        let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["crosswords", "game", _, ..] => Some(segments[2..].to_vec()),
            _ => None,
        }
    }

    /// The puzzle date is only reliable in the url.
    fn date_from_path(parts: &[&str]) -> Option<DateTime<Utc>> {
        let [_, year, month, day, ..] = parts else {
            return None;
        };
        let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?;
        Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
    }
}

impl MetadataProvider for NewYorkTimesProvider {
    fn name(&self) -> &'static str {
        "nyt"
    }

    fn test(&self, url: &Url, _doc: &PageDocument) -> bool {
        host_matches(url, "nytimes.com") && Self::game_path(url).is_some()
    }

    fn load_metadata(&self, url: &Url, doc: &PageDocument) -> PartialMetadata {
        let parts = Self::game_path(url).unwrap_or_default();
        PartialMetadata {
            series: parts
                .first()
                .map(|kind| format!("New York Times {}", title_case(kind))),
            title: first_text(doc, &["//meta[@property='og:title']/@content", "//h1"]),
            setter: first_text(doc, &["//*[contains(@class,'byline')]//a", "//*[contains(@class,'byline')]"])
                .map(|byline| byline.trim_start_matches("By ").to_string()),
            date_published: Self::date_from_path(&parts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DomNode;

    #[test]
    fn date_and_series_come_from_the_url() {
        let url = Url::parse("https://www.nytimes.com/crosswords/game/daily/2023/10/26").unwrap();
        let doc = PageDocument::new(
            DomNode::element("HTML").with_child(
                DomNode::element("DIV")
                    .with_attr("class", "xwd__details--byline")
                    .with_child(DomNode::text("By Jane Doe")),
            ),
        );
        assert!(NewYorkTimesProvider.test(&url, &doc));
        let metadata = NewYorkTimesProvider.load_metadata(&url, &doc);
        assert_eq!(metadata.series.as_deref(), Some("New York Times Daily"));
        assert_eq!(metadata.setter.as_deref(), Some("Jane Doe"));
        assert_eq!(
            metadata.date_published,
            Some(Utc.with_ymd_and_hms(2023, 10, 26, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn other_nyt_pages_do_not_match() {
        let doc = PageDocument::new(DomNode::element("HTML"));
        let url = Url::parse("https://www.nytimes.com/section/world").unwrap();
        assert!(!NewYorkTimesProvider.test(&url, &doc));
    }
}
