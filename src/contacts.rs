//! Extraction of contact emails and a social handle from a club website.

use scraper::Html;
use url::Url;

use crate::fetcher::PageFetcher;
use crate::links::{Anchor, dedupe_ordered, extract_anchors};
use crate::locator::locate_contact_page;
use crate::models::ContactBundle;
use crate::normalize::find_email_candidates;

/// Keyword lists steering contact extraction.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ContactRules<'a> {
    pub contact_hints: &'a [String],
    pub priority_keywords: &'a [String],
    pub social_marker: &'a str,
}

/// What a single page yielded.
#[derive(Debug, Default)]
struct PageContacts {
    emails: Vec<String>,
    social_handle: Option<String>,
    anchors: Vec<Anchor>,
}

/// Collects contact data for the site at `url`, following its contact page
/// when it is a different page. Fetch failure yields an empty bundle.
pub(crate) async fn extract_contacts(
    fetcher: &dyn PageFetcher,
    url: &Url,
    rules: ContactRules<'_>,
) -> ContactBundle {
    tracing::info!(target: "contact_task", "Extracting contacts from {}", url);

    let Some(html) = fetcher.fetch(url).await else {
        tracing::warn!(target: "contact_task", "Could not fetch site {}", url);
        return ContactBundle::default();
    };
    let landing = read_page(&html, url, rules.social_marker);

    let mut emails = landing.emails;
    let mut social_handle = landing.social_handle;

    let contact_page = locate_contact_page(fetcher, url, &landing.anchors, rules.contact_hints).await;
    let contact_url = contact_page.as_ref().map(|page| page.url.clone());

    if let Some(page) = contact_page.filter(|page| page.url != *url) {
        let contact_html = match page.body {
            Some(body) => Some(body),
            None => fetcher.fetch(&page.url).await,
        };
        match contact_html {
            Some(contact_html) => {
                let found = read_page(&contact_html, &page.url, rules.social_marker);
                tracing::debug!(target: "contact_task",
                    "Contact page {} added {} email candidates", page.url, found.emails.len()
                );
                emails = dedupe_ordered(emails.into_iter().chain(found.emails));
                if social_handle.is_none() {
                    social_handle = found.social_handle;
                }
            }
            None => {
                tracing::warn!(target: "contact_task", "Could not fetch contact page {}", page.url);
            }
        }
    }

    let emails = rank_emails(emails, rules.priority_keywords);
    tracing::info!(target: "contact_task",
        "Site {}: {} emails, social={:?}, contact page={:?}",
        url,
        emails.len(),
        social_handle,
        contact_url.as_ref().map(Url::as_str)
    );

    ContactBundle {
        emails,
        social_handle,
        contact_page_url: contact_url.map(|page| page.to_string()),
    }
}

fn read_page(html: &str, url: &Url, social_marker: &str) -> PageContacts {
    let emails = dedupe_ordered(find_email_candidates(html));

    let document = Html::parse_document(html);
    let anchors = extract_anchors(&document, url);
    let social_handle = anchors
        .iter()
        .find(|anchor| anchor.href.to_lowercase().contains(social_marker))
        .map(|anchor| {
            anchor
                .url
                .as_ref()
                .map(|u| u.to_string())
                .unwrap_or_else(|| anchor.href.clone())
        });

    PageContacts {
        emails,
        social_handle,
        anchors,
    }
}

/// Orders emails by the first priority keyword found in their local part.
///
/// A lower keyword index ranks higher. Emails matching no keyword go last and
/// ties keep their original order.
pub(crate) fn rank_emails(emails: Vec<String>, priority_keywords: &[String]) -> Vec<String> {
    let mut ranked = emails;
    ranked.sort_by_key(|email| priority_of(email, priority_keywords));
    ranked
}

fn priority_of(email: &str, priority_keywords: &[String]) -> usize {
    let local = email
        .split('@')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    priority_keywords
        .iter()
        .position(|keyword| local.contains(keyword.as_str()))
        .unwrap_or(priority_keywords.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fetcher::test_support::StaticFetcher;
    use pretty_assertions::assert_eq;

    fn rules(config: &Config) -> ContactRules<'_> {
        ContactRules {
            contact_hints: &config.contact_hints,
            priority_keywords: &config.priority_keywords,
            social_marker: &config.social_marker,
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rank_emails_by_keyword_index() {
        let ranked = rank_emails(
            strings(&["x@club.com", "info@club.com", "press@club.com"]),
            &strings(&["press", "info"]),
        );
        assert_eq!(ranked, strings(&["press@club.com", "info@club.com", "x@club.com"]));
    }

    #[test]
    fn test_rank_keeps_order_among_ties() {
        let ranked = rank_emails(
            strings(&["b@club.com", "INFO2@club.com", "a@club.com", "info@club.com"]),
            &strings(&["press", "info"]),
        );
        assert_eq!(
            ranked,
            strings(&["INFO2@club.com", "info@club.com", "b@club.com", "a@club.com"])
        );
    }

    #[test]
    fn test_keyword_only_counts_in_local_part() {
        let ranked = rank_emails(
            strings(&["joao@press.com", "info@club.com"]),
            &strings(&["press", "info"]),
        );
        assert_eq!(ranked, strings(&["info@club.com", "joao@press.com"]));
    }

    #[tokio::test]
    async fn test_follows_contact_page_and_merges() {
        let home = r#"
            <a href="/contato">Contato</a>
            <a href="https://www.instagram.com/clube_a/">IG</a>
            <footer>info@clubea.com</footer>
        "#;
        let contact = r#"
            <p>Imprensa: imprensa [at] clubea [dot] com</p>
            <p>Geral: info@clubea.com</p>
            <a href="https://instagram.com/other">other</a>
        "#;
        let fetcher = StaticFetcher::new()
            .with_page("https://clubea.com/", home)
            .with_page("https://clubea.com/contato", contact);
        let config = Config::default();

        let url = Url::parse("https://clubea.com/").unwrap();
        let bundle = extract_contacts(&fetcher, &url, rules(&config)).await;

        assert_eq!(
            bundle,
            ContactBundle {
                emails: strings(&["imprensa@clubea.com", "info@clubea.com"]),
                social_handle: Some("https://www.instagram.com/clube_a/".to_string()),
                contact_page_url: Some("https://clubea.com/contato".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_social_handle_filled_from_contact_page() {
        let fetcher = StaticFetcher::new()
            .with_page("https://clubeb.com/", r#"<a href="/about">About us</a>"#)
            .with_page(
                "https://clubeb.com/about",
                r#"<a href="https://instagram.com/clubeb">Follow</a>"#,
            );
        let config = Config::default();

        let url = Url::parse("https://clubeb.com/").unwrap();
        let bundle = extract_contacts(&fetcher, &url, rules(&config)).await;

        assert!(bundle.emails.is_empty());
        assert_eq!(bundle.social_handle.as_deref(), Some("https://instagram.com/clubeb"));
        assert_eq!(bundle.contact_page_url.as_deref(), Some("https://clubeb.com/about"));
    }

    #[tokio::test]
    async fn test_same_page_is_not_fetched_twice() {
        let fetcher = StaticFetcher::new().with_page(
            "https://clubec.com/contact",
            r#"<a href="/contact">Contact</a> comercial@clubec.com"#,
        );
        let config = Config::default();

        let url = Url::parse("https://clubec.com/contact").unwrap();
        let bundle = extract_contacts(&fetcher, &url, rules(&config)).await;

        assert_eq!(bundle.emails, strings(&["comercial@clubec.com"]));
        assert_eq!(fetcher.requests(), vec!["https://clubec.com/contact"]);
    }

    #[tokio::test]
    async fn test_probed_contact_page_is_read_without_refetch() {
        let fetcher = StaticFetcher::new()
            .with_page("https://cluber.com/", "<p>Bem-vindo</p>")
            .with_page("https://cluber.com/contact", "secretaria@cluber.com");
        let config = Config::default();

        let url = Url::parse("https://cluber.com/").unwrap();
        let bundle = extract_contacts(&fetcher, &url, rules(&config)).await;

        assert_eq!(bundle.emails, strings(&["secretaria@cluber.com"]));
        assert_eq!(bundle.contact_page_url.as_deref(), Some("https://cluber.com/contact"));
        assert_eq!(
            fetcher.requests(),
            vec!["https://cluber.com/", "https://cluber.com/contact"]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_is_empty_bundle() {
        let fetcher = StaticFetcher::new();
        let config = Config::default();
        let url = Url::parse("https://down.test/").unwrap();
        let bundle = extract_contacts(&fetcher, &url, rules(&config)).await;
        assert_eq!(bundle, ContactBundle::default());
        assert_eq!(fetcher.requests().len(), 1);
    }
}
