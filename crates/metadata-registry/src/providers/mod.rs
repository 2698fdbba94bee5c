mod guardian;
mod nyt;
mod times;

pub use guardian::GuardianProvider;
pub use nyt::NewYorkTimesProvider;
pub use times::TimesProvider;

/// `cryptic` -> `Cryptic`.
pub(crate) fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn host_matches(url: &url::Url, domain: &str) -> bool {
    url.host_str().map_or(false, |host| {
        host == domain || host.ends_with(&format!(".{domain}"))
    })
}
