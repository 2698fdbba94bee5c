use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use url::Url;

use puzlog_metadata_registry::{
    enrich_metadata, DomNode, MetadataProvider, PageDocument, PartialMetadata, ProviderRegistry,
};
use puzlog_puzzle_model::CrosswordMetadata;

const GUARDIAN_URL: &str = "https://www.theguardian.com/crosswords/cryptic/29211";

fn guardian_page() -> PageDocument {
    PageDocument::from_json(include_str!("fixtures/guardian_cryptic_29211.json")).unwrap()
}

#[test]
fn guardian_page_resolves_to_guardian_metadata() {
    let registry = ProviderRegistry::with_defaults();
    let doc = guardian_page();

    let provider = registry.find_provider(GUARDIAN_URL, &doc).unwrap();
    assert_eq!(provider.name(), "guardian");

    let resolution = registry.resolve(GUARDIAN_URL, &doc).unwrap();
    assert_eq!(
        resolution.metadata,
        CrosswordMetadata {
            series: Some("Guardian Cryptic".into()),
            title: Some("Cryptic crossword No 29,211".into()),
            setter: Some("Picaroon".into()),
            date_published: Some(Utc.with_ymd_and_hms(2023, 10, 26, 0, 0, 0).unwrap()),
        }
    );
}

#[test]
fn unmatched_page_has_no_provider() {
    let registry = ProviderRegistry::with_defaults();
    let doc = PageDocument::new(DomNode::element("HTML"));
    assert!(registry.find_provider("https://example.com/puzzles/1", &doc).is_none());
    assert!(registry.resolve("https://example.com/puzzles/1", &doc).is_none());
    assert!(registry.find_provider("not a url", &doc).is_none());
}

struct CatchAll;

impl MetadataProvider for CatchAll {
    fn name(&self) -> &'static str {
        "catch-all"
    }

    fn test(&self, _url: &Url, _doc: &PageDocument) -> bool {
        true
    }

    fn load_metadata(&self, _url: &Url, _doc: &PageDocument) -> PartialMetadata {
        PartialMetadata {
            series: Some("Anything".into()),
            ..PartialMetadata::default()
        }
    }
}

#[test]
fn first_registered_match_wins() {
    let doc = guardian_page();

    let mut catch_all_first = ProviderRegistry::empty();
    catch_all_first.register(CatchAll);
    catch_all_first.register(puzlog_metadata_registry::GuardianProvider);
    assert_eq!(
        catch_all_first.find_provider(GUARDIAN_URL, &doc).unwrap().name(),
        "catch-all"
    );

    let mut defaults_first = ProviderRegistry::with_defaults();
    defaults_first.register(CatchAll);
    assert_eq!(
        defaults_first.find_provider(GUARDIAN_URL, &doc).unwrap().name(),
        "guardian"
    );
    assert_eq!(
        defaults_first
            .find_provider("https://example.com/x", &doc)
            .unwrap()
            .name(),
        "catch-all"
    );
}

#[test]
fn enrich_is_idempotent_and_never_drops_known_fields() {
    let existing = CrosswordMetadata {
        series: Some("Guardian Cryptic".into()),
        title: Some(String::new()),
        setter: None,
        date_published: None,
    };
    let incoming = CrosswordMetadata {
        series: Some("Something else".into()),
        title: Some("Cryptic crossword No 29,211".into()),
        setter: Some("Picaroon".into()),
        date_published: Some(Utc.with_ymd_and_hms(2023, 10, 26, 0, 0, 0).unwrap()),
    };

    let once = enrich_metadata(&existing, &incoming);
    assert_eq!(once.series.as_deref(), Some("Guardian Cryptic"));
    assert_eq!(once.title.as_deref(), Some("Cryptic crossword No 29,211"));
    assert_eq!(once.setter.as_deref(), Some("Picaroon"));
    assert_eq!(enrich_metadata(&once, &incoming), once);

    let regress = enrich_metadata(&once, &CrosswordMetadata::default());
    assert_eq!(regress, once);
}
