//! Video-call link detection for events and browser tabs.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::integrations::provider::CalendarEvent;

/// Hosts of known call providers. Subdomains match too.
pub const CALL_DOMAINS: &[&str] = &[
    "meet.google.com",
    "zoom.us",
    "teams.microsoft.com",
    "webex.com",
    "dialpad.com",
    "whereby.com",
    "around.co",
    "riverside.fm",
    "bluejeans.com",
    "gotomeeting.com",
];

fn url_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    // A URL token runs until whitespace or a closing parenthesis.
    REGEX.get_or_init(|| Regex::new(r"\bhttps?://[^\s)]+").expect("static pattern compiles"))
}

/// Normalized host of `url`: lowercase, leading `www.` removed.
fn normalized_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

/// Whether `host` is a call provider or a subdomain of one.
pub fn is_call_host(host: &str) -> bool {
    CALL_DOMAINS.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// All `http(s)://` tokens in `text`.
pub fn extract_urls(text: &str) -> Vec<&str> {
    url_regex().find_iter(text).map(|m| m.as_str()).collect()
}

/// True if the event has structured conference data or mentions a call URL
/// in its location, description or native meeting link.
pub fn has_join_link(event: &CalendarEvent) -> bool {
    if event
        .conference_data
        .as_ref()
        .is_some_and(|c| !c.entry_points.is_empty())
    {
        return true;
    }

    let blob = [&event.location, &event.description, &event.hangout_link]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    if blob.is_empty() {
        return false;
    }

    extract_urls(&blob)
        .into_iter()
        .filter_map(normalized_host)
        .any(|host| is_call_host(&host))
}

/// Host of the active tab if it is a call page.
pub fn call_page_host(url: &str) -> Option<String> {
    normalized_host(url.trim()).filter(|host| is_call_host(host))
}
