//! Writes collected leads to a CSV sheet.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::LeadRecord;

const HEADERS: [&str; 7] = [
    "League",
    "Club Name",
    "Country",
    "Official Website",
    "Contact Page",
    "Emails",
    "Social Handle",
];

/// `leads_<league>.csv`, with the league lowercased and reduced to a safe file name.
pub(crate) fn export_file_name(league_name: &str) -> String {
    let slug: String = league_name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    let slug = if slug.is_empty() { "league".to_string() } else { slug };
    format!("leads_{}.csv", slug)
}

/// Writes `records` under `output_dir` and returns the written path.
/// The header row is always present, even for an empty run.
pub(crate) fn export_leads(
    records: &[LeadRecord],
    league_name: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(export_file_name(league_name));

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)?;
    writer.write_record(HEADERS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    tracing::info!("Wrote {} leads to {}", records.len(), path.display());
    Ok(path)
}
