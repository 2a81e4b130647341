//! Utility functions for resolving links and handling host names.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

/// An `<a href>` element lifted out of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Anchor {
    /// The href as written in the page.
    pub href: String,
    /// Whitespace-collapsed link text.
    pub text: String,
    /// The href resolved against the page URL, when it is an http(s) link.
    pub url: Option<Url>,
}

/// Resolves `href` against `base`. Malformed input yields `href` unchanged.
pub(crate) fn absolute(base: &str, href: &str) -> String {
    match Url::parse(base).and_then(|b| b.join(href)) {
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::debug!("Could not resolve '{}' against '{}': {}", href, base, e);
            href.to_string()
        }
    }
}

/// Drops blank and repeated entries, keeping the first occurrence of each.
pub(crate) fn dedupe_ordered<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let item = item.as_ref();
        if item.trim().is_empty() {
            continue;
        }
        if seen.insert(item.to_string()) {
            out.push(item.to_string());
        }
    }
    out
}

/// Parses `candidate` as an absolute http(s) URL.
pub(crate) fn http_url(candidate: &str) -> Option<Url> {
    let url = Url::parse(candidate).ok()?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(url),
        _ => None,
    }
}

/// Collects every anchor in document order.
pub(crate) fn extract_anchors(document: &Html, page_url: &Url) -> Vec<Anchor> {
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|element| {
            let href = element.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }
            let text = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
            let url = http_url(&absolute(page_url.as_str(), href));
            Some(Anchor {
                href: href.to_string(),
                text,
                url,
            })
        })
        .collect()
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased host with any leading `www.` removed.
pub(crate) fn site_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// True when `url` is served from `domain` or one of its subdomains.
pub(crate) fn belongs_to(url: &Url, domain: &str) -> bool {
    match url.host_str() {
        Some(host) => {
            let host = host.to_lowercase();
            let domain = domain.to_lowercase();
            host == domain || host.ends_with(&format!(".{}", domain))
        }
        None => false,
    }
}

/// The scheme, host and port of `url`, with an empty path.
pub(crate) fn site_root(url: &Url) -> Option<Url> {
    let host = url.host_str()?;
    let root = match url.port() {
        Some(port) => format!("{}://{}:{}/", url.scheme(), host, port),
        None => format!("{}://{}/", url.scheme(), host),
    };
    Url::parse(&root).ok()
}
