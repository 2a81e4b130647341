//! Locating a contact (or about) page on a club's website.

use url::Url;

use crate::fetcher::PageFetcher;
use crate::links::{Anchor, belongs_to, site_domain, site_root};
use crate::strategy::StrategyChain;

/// A located contact page. `body` is set when probing already downloaded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ContactPage {
    pub url: Url,
    pub body: Option<String>,
}

/// Finds the most likely contact page for the site at `base_url`.
///
/// Anchors on the already-parsed page are checked first, keeping only links
/// that stay on the same site. When none looks like a contact link,
/// well-known paths are probed on the site root. `None` means the site has
/// no recognisable contact page.
pub(crate) async fn locate_contact_page(
    fetcher: &dyn PageFetcher,
    base_url: &Url,
    anchors: &[Anchor],
    hints: &[String],
) -> Option<ContactPage> {
    let domain = site_domain(base_url)?;
    let anchored = anchor_chain(hints, &domain).first_match(anchors);
    if let Some((strategy, url)) = anchored {
        tracing::debug!(target: "locate_task", "Contact page for {} via {}: {}", base_url, strategy, url);
        return Some(ContactPage { url, body: None });
    }

    let root = site_root(base_url)?;
    for path in probe_paths(hints) {
        let Ok(candidate) = root.join(&path) else {
            continue;
        };
        tracing::debug!(target: "locate_task", "Probing {}", candidate);
        if let Some(body) = fetcher.fetch(&candidate).await {
            tracing::debug!(target: "locate_task", "Contact page for {} via probe: {}", base_url, candidate);
            return Some(ContactPage {
                url: candidate,
                body: Some(body),
            });
        }
    }

    tracing::info!(target: "locate_task", "No contact page found for {}", base_url);
    None
}

fn anchor_chain<'a>(hints: &'a [String], domain: &'a str) -> StrategyChain<'a, [Anchor], Url> {
    StrategyChain::new("contact_page").then("hinted_anchor", move |anchors: &[Anchor]| {
        anchors.iter().find_map(|anchor| {
            let url = anchor.url.as_ref().filter(|url| belongs_to(url, domain))?;
            let text = anchor.text.to_lowercase();
            let href = anchor.href.to_lowercase();
            hints
                .iter()
                .any(|hint| text.contains(hint.as_str()) || href.contains(hint.as_str()))
                .then(|| url.clone())
        })
    })
}

/// Root-relative paths built from the hint keywords, in hint order.
pub(crate) fn probe_paths(hints: &[String]) -> Vec<String> {
    hints.iter().map(|hint| format!("/{}", hint)).collect()
}
