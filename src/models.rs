//! Defines the core data structures used in the club-scout application.

use serde::{Deserialize, Serialize};
use url::Url;

/// Placeholder written into every lead field that has no data.
pub(crate) const PLACEHOLDER: &str = "N/A";

/// A club detail page discovered on the directory site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClubReference {
    pub url: Url,
}

/// What could be learned about a club from its directory page.
/// Every field may be absent; an empty profile is a valid outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ClubProfile {
    pub name: Option<String>,
    pub country: Option<String>,
    /// Best guess at the club's own website. Never on the directory domain.
    pub official_site: Option<Url>,
}

/// Contact data extracted from a club's official site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ContactBundle {
    /// Deduplicated, priority-sorted addresses.
    pub emails: Vec<String>,
    pub social_handle: Option<String>,
    pub contact_page_url: Option<String>,
}

/// One flattened, export-ready row. Every field holds data or [`PLACEHOLDER`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct LeadRecord {
    #[serde(rename = "League")]
    pub league: String,
    #[serde(rename = "Club Name")]
    pub club_name: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Official Website")]
    pub official_website: String,
    #[serde(rename = "Contact Page")]
    pub contact_page: String,
    #[serde(rename = "Emails")]
    pub emails: String,
    #[serde(rename = "Social Handle")]
    pub social_handle: String,
}

fn or_placeholder(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => PLACEHOLDER.to_string(),
    }
}

impl LeadRecord {
    /// Flattens a profile and its (optional) contact bundle into a row.
    pub(crate) fn assemble(league: &str, profile: ClubProfile, contacts: ContactBundle) -> Self {
        let emails = if contacts.emails.is_empty() {
            None
        } else {
            Some(contacts.emails.join(", "))
        };

        LeadRecord {
            league: or_placeholder(Some(league.to_string())),
            club_name: or_placeholder(profile.name),
            country: or_placeholder(profile.country),
            official_website: or_placeholder(profile.official_site.map(|u| u.to_string())),
            contact_page: or_placeholder(contacts.contact_page_url),
            emails: or_placeholder(emails),
            social_handle: or_placeholder(contacts.social_handle),
        }
    }
}

/// Body of a collection request.
#[derive(Deserialize, Debug, Clone, Default)]
pub(crate) struct CollectRequest {
    #[serde(default)]
    pub league_name: Option<String>,
    #[serde(default)]
    pub league_url: Option<String>,
    #[serde(default)]
    pub max_clubs: Option<usize>,
}

/// Reply to a successful collection request.
#[derive(Serialize, Debug, Clone)]
pub(crate) struct CollectResponse {
    pub summary: String,
    pub download_url: String,
    pub leads: Vec<LeadRecord>,
}
