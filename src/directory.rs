//! Discovery of club detail pages on a league listing.

use scraper::Html;
use url::Url;

use crate::fetcher::PageFetcher;
use crate::links::{belongs_to, dedupe_ordered, extract_anchors, site_domain};
use crate::models::ClubReference;

/// Fetches the league page and returns its club links in page order.
///
/// A failed fetch yields an empty list.
pub(crate) async fn scan_directory(
    fetcher: &dyn PageFetcher,
    league_url: &Url,
    club_path_marker: &str,
    directory_domain: Option<&str>,
) -> Vec<ClubReference> {
    tracing::info!(target: "scan_task", "Scanning league page {}", league_url);

    let Some(domain) = directory_domain
        .map(str::to_string)
        .or_else(|| site_domain(league_url))
    else {
        tracing::warn!(target: "scan_task", "League URL {} has no host", league_url);
        return Vec::new();
    };

    let Some(html) = fetcher.fetch(league_url).await else {
        tracing::warn!(target: "scan_task", "Could not fetch league page {}", league_url);
        return Vec::new();
    };

    let clubs = club_links(&html, league_url, club_path_marker, &domain);
    tracing::info!(target: "scan_task", "Found {} club pages on {}", clubs.len(), league_url);
    clubs
}

/// Picks the directory's own club links out of a listing page.
pub(crate) fn club_links(
    html: &str,
    page_url: &Url,
    club_path_marker: &str,
    directory_domain: &str,
) -> Vec<ClubReference> {
    let document = Html::parse_document(html);

    let candidates = extract_anchors(&document, page_url)
        .into_iter()
        .filter(|anchor| anchor.href.contains(club_path_marker))
        .filter_map(|anchor| anchor.url)
        .filter(|url| belongs_to(url, directory_domain))
        .map(|mut url| {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        });

    dedupe_ordered(candidates)
        .into_iter()
        .filter_map(|raw| Url::parse(&raw).ok())
        .map(|url| ClubReference { url })
        .collect()
}
