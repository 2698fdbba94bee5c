use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::{debug, warn};
use url::Url;

use puzlog_puzzle_model::CrosswordMetadata;

use crate::document::PageDocument;
use crate::providers::{GuardianProvider, NewYorkTimesProvider, TimesProvider};

/// Whatever a provider could scrape; any field may be missing.
pub type PartialMetadata = CrosswordMetadata;

/// One puzzle-provider family.
pub trait MetadataProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this provider understands the page.
    fn test(&self, url: &Url, doc: &PageDocument) -> bool;

    /// Scrapes what it can. A field that cannot be extracted is left `None`.
    fn load_metadata(&self, url: &Url, doc: &PageDocument) -> PartialMetadata;
}

/// Provider chosen for a page plus what it scraped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub provider: &'static str,
    pub metadata: PartialMetadata,
}

/// Ordered list of providers; the first whose `test` matches wins.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn MetadataProvider>>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ProviderRegistry {
    pub fn empty() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(GuardianProvider);
        registry.register(TimesProvider);
        registry.register(NewYorkTimesProvider);
        registry
    }

    pub fn register<P>(&mut self, provider: P)
    where
        P: MetadataProvider + 'static,
    {
        self.providers.push(Box::new(provider));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn find_provider(&self, url: &str, doc: &PageDocument) -> Option<&dyn MetadataProvider> {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(url, error = %err, "not a scrapeable url");
                return None;
            }
        };
        self.providers
            .iter()
            .find(|provider| provider.test(&parsed, doc))
            .map(|provider| provider.as_ref())
    }

    /// Finds the provider for a page and runs it. `None` for unmatched pages.
    pub fn resolve(&self, url: &str, doc: &PageDocument) -> Option<Resolution> {
        let provider = self.find_provider(url, doc)?;
        let parsed = Url::parse(url).ok()?;
        let metadata = provider.load_metadata(&parsed, doc);
        debug!(provider = provider.name(), url, "metadata scraped");
        Some(Resolution {
            provider: provider.name(),
            metadata,
        })
    }
}

/// First non-blank match among `exprs`, tried in order.
pub(crate) fn first_text(doc: &PageDocument, exprs: &[&str]) -> Option<String> {
    for expr in exprs {
        match doc.evaluate_text(expr) {
            Ok(Some(value)) => return Some(value),
            Ok(None) => {}
            Err(err) => warn!(error = %err, "skipping provider query"),
        }
    }
    None
}

/// Accepts the date shapes provider pages use.
pub fn parse_published_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%d", "%d %B %Y", "%A %d %B %Y", "%A, %d %B %Y", "%B %d, %Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
