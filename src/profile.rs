//! Extraction of a club's name, country and official website from its
//! directory page.

use scraper::{Html, Selector};
use url::Url;

use crate::fetcher::PageFetcher;
use crate::links::{belongs_to, collapse_whitespace, extract_anchors, site_domain};
use crate::models::ClubProfile;
use crate::strategy::StrategyChain;

/// Markup hooks for reading a club page.
#[derive(Debug, Clone)]
pub(crate) struct ProfileRules<'a> {
    pub heading: &'a Selector,
    pub country: &'a Selector,
    pub official_site_labels: &'a [String],
    /// Directory domain; derived from the club URL when `None`.
    pub directory_domain: Option<&'a str>,
}

/// An outbound link leaving the directory site.
#[derive(Debug, Clone)]
struct ExternalLink {
    url: Url,
    text: String,
}

/// Fetches a club page and reads its profile. Fetch failure yields an empty profile.
pub(crate) async fn extract_profile(
    fetcher: &dyn PageFetcher,
    club_url: &Url,
    rules: &ProfileRules<'_>,
) -> ClubProfile {
    let Some(html) = fetcher.fetch(club_url).await else {
        tracing::warn!(target: "profile_task", "Could not fetch club page {}", club_url);
        return ClubProfile::default();
    };

    let profile = parse_profile(&html, club_url, rules);
    tracing::info!(target: "profile_task",
        "Club page {}: name={:?}, country={:?}, site={:?}",
        club_url,
        profile.name,
        profile.country,
        profile.official_site.as_ref().map(Url::as_str)
    );
    profile
}

pub(crate) fn parse_profile(html: &str, club_url: &Url, rules: &ProfileRules<'_>) -> ClubProfile {
    let document = Html::parse_document(html);

    let directory = rules
        .directory_domain
        .map(str::to_string)
        .or_else(|| site_domain(club_url));

    let external: Vec<ExternalLink> = extract_anchors(&document, club_url)
        .into_iter()
        .filter_map(|anchor| {
            let url = anchor.url?;
            match directory.as_deref() {
                Some(domain) if belongs_to(&url, domain) => None,
                _ => Some(ExternalLink {
                    url,
                    text: anchor.text.to_lowercase(),
                }),
            }
        })
        .collect();

    ClubProfile {
        name: first_text(&document, rules.heading),
        country: first_text(&document, rules.country),
        official_site: official_site_chain(rules.official_site_labels).resolve(&external),
    }
}

fn official_site_chain(labels: &[String]) -> StrategyChain<'_, [ExternalLink], Url> {
    StrategyChain::new("official_site")
        .then("labelled_link", move |links: &[ExternalLink]| {
            links
                .iter()
                .find(|link| labels.iter().any(|label| link.text.contains(label.as_str())))
                .map(|link| link.url.clone())
        })
        .then("first_external_link", |links: &[ExternalLink]| {
            links.first().map(|link| link.url.clone())
        })
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(|element| collapse_whitespace(&element.text().collect::<Vec<_>>().join(" ")))
        .find(|text| !text.is_empty())
}
