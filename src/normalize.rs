//! Canonicalisation of obfuscated email addresses found in page text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches email-like text, including `[at]`/`(dot)` style obfuscation, the
/// bare words `at`/`dot` surrounded by whitespace, and a `.` spaced out on
/// both sides.
pub(crate) static EMAIL_CANDIDATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    let at = r"(?:\s*@\s*|\s*[\[(]\s*(?i:at)\s*[\])]\s*|\s+(?:at|AT)\s+)";
    let dot = r"(?:\.|\s+\.\s+|\s*[\[(]\s*(?i:dot)\s*[\])]\s*|\s+(?:dot|DOT)\s+)";
    let pattern = format!(
        r"[A-Za-z0-9._%+-]+{at}[A-Za-z0-9-]+(?:{dot}[A-Za-z0-9-]+)*{dot}[A-Za-z]{{2,}}\b"
    );
    Regex::new(&pattern).expect("Failed to compile email candidate pattern")
});

static BRACKETED_AT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*[\[(]\s*at\s*[\])]\s*").expect("valid pattern"));
static BRACKETED_DOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*[\[(]\s*dot\s*[\])]\s*").expect("valid pattern"));
static BARE_AT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+at\s+").expect("valid pattern"));
static BARE_DOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+dot\s+").expect("valid pattern"));

fn replace_bracketed(text: &str) -> String {
    let at = BRACKETED_AT.replace_all(text, "@");
    BRACKETED_DOT.replace_all(&at, ".").into_owned()
}

/// Rewrites an obfuscated address into `local@domain` form.
///
/// Marker matching is case-insensitive; the casing of the address itself is
/// kept. Applying it to its own output returns the output unchanged.
pub(crate) fn normalize_email(raw: &str) -> String {
    let mut text = replace_bracketed(raw);
    text = BARE_AT.replace_all(&text, "@").into_owned();
    text = BARE_DOT.replace_all(&text, ".").into_owned();
    text.retain(|c| !c.is_whitespace());

    // Stripping whitespace can close up a marker such as "[ a t ]".
    loop {
        let next = replace_bracketed(&text);
        if next == text {
            return text;
        }
        text = next;
    }
}

/// Finds every email-like string in `text` and returns the normalised forms,
/// in order of appearance (duplicates included).
pub(crate) fn find_email_candidates(text: &str) -> Vec<String> {
    EMAIL_CANDIDATE_REGEX
        .find_iter(text)
        .filter_map(|m| {
            let email = normalize_email(m.as_str());
            if is_asset_name(&email) || is_prose(m.as_str(), &email) {
                return None;
            }
            Some(email)
        })
        .collect()
}

/// "Visit us at www.club.com" reads as a bare-word address but is a sentence.
fn is_prose(raw: &str, email: &str) -> bool {
    let bare_at = !raw.contains('@') && !BRACKETED_AT.is_match(raw);
    let web_host = email
        .split_once('@')
        .is_some_and(|(_, domain)| domain.to_lowercase().starts_with("www."));
    bare_at && web_host
}

/// Retina image names such as `logo@2x.png` have the shape of an address.
fn is_asset_name(email: &str) -> bool {
    const ASSET_SUFFIXES: [&str; 8] = ["png", "jpg", "jpeg", "gif", "svg", "webp", "css", "js"];
    email
        .rsplit_once('.')
        .map(|(_, tld)| ASSET_SUFFIXES.contains(&tld.to_lowercase().as_str()))
        .unwrap_or(false)
}
