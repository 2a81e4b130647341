//! Sequences directory scanning, profile reading and contact extraction for
//! every club of a league.

use indicatif::ProgressBar;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::time::sleep;

use crate::config::Config;
use crate::contacts::{ContactRules, extract_contacts};
use crate::directory::scan_directory;
use crate::error::{AppError, Result};
use crate::fetcher::PageFetcher;
use crate::links::{http_url, site_domain};
use crate::models::{ClubReference, ContactBundle, LeadRecord};
use crate::profile::{ProfileRules, extract_profile};

/// Runs the lead collection for one league at a time.
///
/// Clubs are processed one after another with a random pause in between, so
/// a run never hits the target sites with parallel requests.
pub(crate) struct LeadPipeline<F: PageFetcher> {
    fetcher: F,
    config: Config,
    progress: ProgressBar,
}

impl<F: PageFetcher> LeadPipeline<F> {
    pub(crate) fn new(fetcher: F, config: Config) -> Self {
        Self {
            fetcher,
            config,
            progress: ProgressBar::hidden(),
        }
    }

    pub(crate) fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    /// The trimmed league name, or the configured default when blank.
    pub(crate) fn league_name_or_default(&self, league_name: Option<&str>) -> String {
        league_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.config.default_league_name)
            .to_string()
    }

    /// Collects one lead per discovered club, in discovery order.
    ///
    /// Fails only when `league_url` is missing. `max_clubs` defaults to the
    /// configured ceiling.
    pub(crate) async fn run(
        &self,
        league_name: Option<&str>,
        league_url: Option<&str>,
        max_clubs: Option<usize>,
    ) -> Result<Vec<LeadRecord>> {
        let never = AtomicBool::new(false);
        self.run_until(league_name, league_url, max_clubs, &never).await
    }

    /// Like [`LeadPipeline::run`], checking `cancel` and the configured run
    /// deadline between clubs. Whatever was collected before stopping is returned.
    pub(crate) async fn run_until(
        &self,
        league_name: Option<&str>,
        league_url: Option<&str>,
        max_clubs: Option<usize>,
        cancel: &AtomicBool,
    ) -> Result<Vec<LeadRecord>> {
        let league_url = league_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AppError::MissingInput("league_url is required".to_string()))?;

        let league_name = self.league_name_or_default(league_name);
        let max_clubs = max_clubs.unwrap_or(self.config.default_max_clubs);

        let started = Instant::now();
        tracing::info!(target: "pipeline_task",
            "Starting run for league '{}' ({}), up to {} clubs",
            league_name, league_url, max_clubs
        );

        let Some(league_url) = http_url(league_url) else {
            tracing::warn!(target: "pipeline_task", "League URL '{}' is not a valid http(s) URL", league_url);
            return Ok(Vec::new());
        };

        let directory_domain = self
            .config
            .directory_domain
            .clone()
            .or_else(|| site_domain(&league_url));

        let mut clubs = scan_directory(
            &self.fetcher,
            &league_url,
            &self.config.club_path_marker,
            directory_domain.as_deref(),
        )
        .await;
        clubs.truncate(max_clubs);

        self.progress.set_length(clubs.len() as u64);
        let mut records = Vec::with_capacity(clubs.len());

        for (index, club) in clubs.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                tracing::warn!(target: "pipeline_task",
                    "Run cancelled after {} of {} clubs", index, clubs.len()
                );
                break;
            }
            if let Some(deadline) = self.config.run_deadline {
                if started.elapsed() >= deadline {
                    tracing::warn!(target: "pipeline_task",
                        "Run deadline of {:?} reached after {} of {} clubs", deadline, index, clubs.len()
                    );
                    break;
                }
            }

            let pause = self.config.random_club_delay();
            tracing::debug!(target: "pipeline_task", "Sleeping {:?} before {}", pause, club.url);
            sleep(pause).await;

            let record = self
                .process_club(&league_name, club, directory_domain.as_deref())
                .await;
            self.progress.inc(1);
            records.push(record);
        }

        self.progress.finish_and_clear();
        tracing::info!(target: "pipeline_task",
            "Finished league '{}' in {:.2?}: {} records",
            league_name,
            started.elapsed(),
            records.len()
        );
        Ok(records)
    }

    async fn process_club(
        &self,
        league_name: &str,
        club: &ClubReference,
        directory_domain: Option<&str>,
    ) -> LeadRecord {
        let profile_rules = ProfileRules {
            heading: &self.config.heading_selector,
            country: &self.config.country_selector,
            official_site_labels: &self.config.official_site_labels,
            directory_domain,
        };
        let profile = extract_profile(&self.fetcher, &club.url, &profile_rules).await;

        let contacts = match profile.official_site.as_ref() {
            Some(site) => {
                let rules = ContactRules {
                    contact_hints: &self.config.contact_hints,
                    priority_keywords: &self.config.priority_keywords,
                    social_marker: &self.config.social_marker,
                };
                extract_contacts(&self.fetcher, site, rules).await
            }
            None => {
                tracing::info!(target: "pipeline_task", "No official site for {}", club.url);
                ContactBundle::default()
            }
        };

        LeadRecord::assemble(league_name, profile, contacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::test_support::StaticFetcher;
    use crate::models::PLACEHOLDER;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const LEAGUE: &str = "https://dir.test/league/serie-a";

    fn quiet_config() -> Config {
        Config {
            sleep_between_clubs: (0.0, 0.0),
            ..Config::default()
        }
    }

    fn listing(slugs: &[&str]) -> String {
        slugs
            .iter()
            .map(|slug| format!(r#"<a href="/club/{slug}">{slug}</a>"#))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn club_page(name: &str, site: &str) -> String {
        format!(
            r#"<h1>{name}</h1><a href="/country/br">Brasil</a>
               <a href="{site}">Official website</a>"#
        )
    }

    #[tokio::test]
    async fn test_missing_league_url_fails_before_network() {
        let pipeline = LeadPipeline::new(StaticFetcher::new(), quiet_config());

        for missing in [None, Some(""), Some("   ")] {
            let result = pipeline.run(Some("Serie A"), missing, Some(5)).await;
            assert!(matches!(result, Err(AppError::MissingInput(_))));
        }
        assert!(pipeline.fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_league_url_yields_nothing() {
        let pipeline = LeadPipeline::new(StaticFetcher::new(), quiet_config());
        let records = pipeline.run(None, Some("not a url"), None).await.unwrap();
        assert!(records.is_empty());
        assert!(pipeline.fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_truncates_to_max_clubs_in_order() {
        let fetcher = StaticFetcher::new()
            .with_page(LEAGUE, &listing(&["a", "b", "c", "d", "e"]))
            .with_page("https://dir.test/club/a", "<h1>A</h1>")
            .with_page("https://dir.test/club/b", "<h1>B</h1>")
            .with_page("https://dir.test/club/c", "<h1>C</h1>");
        let pipeline = LeadPipeline::new(fetcher, quiet_config());

        let records = pipeline.run(Some("Serie A"), Some(LEAGUE), Some(2)).await.unwrap();

        let names: Vec<&str> = records.iter().map(|r| r.club_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(
            !pipeline
                .fetcher
                .requests()
                .contains(&"https://dir.test/club/c".to_string())
        );
    }

    #[tokio::test]
    async fn test_default_ceiling_is_twenty() {
        let slugs: Vec<String> = (0..25).map(|i| format!("c{i}")).collect();
        let slug_refs: Vec<&str> = slugs.iter().map(String::as_str).collect();
        let fetcher = StaticFetcher::new().with_page(LEAGUE, &listing(&slug_refs));
        let pipeline = LeadPipeline::new(fetcher, quiet_config());

        let records = pipeline.run(None, Some(LEAGUE), None).await.unwrap();

        assert_eq!(records.len(), 20);
        assert!(records.iter().all(|r| r.league == "Unknown League"));
    }

    #[tokio::test]
    async fn test_end_to_end_failed_club_does_not_block_others() {
        let fetcher = StaticFetcher::new()
            .with_page(LEAGUE, &listing(&["alpha", "broken", "gamma"]))
            .with_page(
                "https://dir.test/club/alpha",
                &club_page("Alpha FC", "https://alpha.test/"),
            )
            .with_page(
                "https://alpha.test/",
                r#"<a href="/contato">Fale</a><a href="https://instagram.com/alphafc">ig</a>"#,
            )
            .with_page(
                "https://alpha.test/contato",
                "info@alpha.test marketing [at] alpha [dot] test",
            )
            .with_page(
                "https://dir.test/club/gamma",
                &club_page("Gamma EC", "https://gamma.test/"),
            );
        let pipeline = LeadPipeline::new(fetcher, quiet_config());

        let records = pipeline
            .run(Some("Serie A"), Some(LEAGUE), None)
            .await
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0],
            LeadRecord {
                league: "Serie A".to_string(),
                club_name: "Alpha FC".to_string(),
                country: "Brasil".to_string(),
                official_website: "https://alpha.test/".to_string(),
                contact_page: "https://alpha.test/contato".to_string(),
                emails: "marketing@alpha.test, info@alpha.test".to_string(),
                social_handle: "https://instagram.com/alphafc".to_string(),
            }
        );
        assert_eq!(
            records[1],
            LeadRecord {
                league: "Serie A".to_string(),
                club_name: PLACEHOLDER.to_string(),
                country: PLACEHOLDER.to_string(),
                official_website: PLACEHOLDER.to_string(),
                contact_page: PLACEHOLDER.to_string(),
                emails: PLACEHOLDER.to_string(),
                social_handle: PLACEHOLDER.to_string(),
            }
        );
        assert_eq!(records[2].club_name, "Gamma EC");
        assert_eq!(records[2].official_website, "https://gamma.test/");
        assert_eq!(records[2].emails, PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_cancel_stops_between_clubs() {
        let fetcher = StaticFetcher::new().with_page(LEAGUE, &listing(&["a", "b"]));
        let pipeline = LeadPipeline::new(fetcher, quiet_config());
        let cancel = AtomicBool::new(true);

        let records = pipeline
            .run_until(None, Some(LEAGUE), None, &cancel)
            .await
            .unwrap();

        assert!(records.is_empty());
        assert_eq!(pipeline.fetcher.requests(), vec![LEAGUE]);
    }

    #[tokio::test]
    async fn test_zero_deadline_returns_partial_result() {
        let fetcher = StaticFetcher::new().with_page(LEAGUE, &listing(&["a", "b"]));
        let config = Config {
            run_deadline: Some(Duration::ZERO),
            ..quiet_config()
        };
        let pipeline = LeadPipeline::new(fetcher, config);

        let records = pipeline.run(None, Some(LEAGUE), None).await.unwrap();
        assert!(records.is_empty());
    }
}
