//! Defines the configuration settings for the club-scout application.

use anyhow::Context;
use clap::Args;
use scraper::Selector;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, Result};

/// Configuration overrides accepted on the command line or via environment.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct ConfigArgs {
    /// Path to configuration file (TOML format)
    #[arg(long, global = true, env = "CLUB_SCOUT_CONFIG")]
    pub config_file: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, global = true, env = "CLUB_SCOUT_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,

    /// Delay before the second fetch attempt (milliseconds)
    #[arg(long, global = true, env = "CLUB_SCOUT_RETRY_DELAY_MS")]
    pub retry_delay_ms: Option<u64>,

    /// Minimum sleep between clubs (seconds)
    #[arg(long, global = true, env = "CLUB_SCOUT_MIN_SLEEP")]
    pub min_sleep: Option<f32>,

    /// Maximum sleep between clubs (seconds)
    #[arg(long, global = true, env = "CLUB_SCOUT_MAX_SLEEP")]
    pub max_sleep: Option<f32>,

    /// Overall deadline for a single run (seconds)
    #[arg(long, global = true, env = "CLUB_SCOUT_RUN_DEADLINE")]
    pub run_deadline: Option<u64>,

    /// User agent string for HTTP requests
    #[arg(long, global = true, env = "CLUB_SCOUT_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Href fragment identifying club pages on the directory site
    #[arg(long, global = true, env = "CLUB_SCOUT_CLUB_PATH_MARKER")]
    pub club_path_marker: Option<String>,

    /// Domain of the directory site (derived from the league URL when absent)
    #[arg(long, global = true, env = "CLUB_SCOUT_DIRECTORY_DOMAIN")]
    pub directory_domain: Option<String>,

    /// Directory where exported lead sheets are written
    #[arg(long, global = true, env = "CLUB_SCOUT_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Base URL used to build download links
    #[arg(long, global = true, env = "CLUB_SCOUT_PUBLIC_BASE_URL")]
    pub public_base_url: Option<String>,
}

/// TOML Configuration file structure
#[derive(Deserialize, Debug, Default)]
struct ConfigFile {
    network: Option<NetworkConfig>,
    directory: Option<DirectoryConfig>,
    contacts: Option<ContactsConfig>,
    run: Option<RunConfig>,
    export: Option<ExportConfig>,
}

#[derive(Deserialize, Debug, Default)]
struct NetworkConfig {
    request_timeout: Option<u64>,
    retry_delay_ms: Option<u64>,
    max_fetch_attempts: Option<u32>,
    min_sleep: Option<f32>,
    max_sleep: Option<f32>,
    run_deadline: Option<u64>,
    user_agent: Option<String>,
    accept_language: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct DirectoryConfig {
    club_path_marker: Option<String>,
    directory_domain: Option<String>,
    heading_selector: Option<String>,
    country_selector: Option<String>,
    official_site_labels: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default)]
struct ContactsConfig {
    contact_hints: Option<Vec<String>>,
    priority_keywords: Option<Vec<String>>,
    social_marker: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct RunConfig {
    default_max_clubs: Option<usize>,
    default_league_name: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct ExportConfig {
    output_dir: Option<PathBuf>,
    public_base_url: Option<String>,
}

/// Application configuration settings.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    /// Timeout for individual HTTP requests.
    pub request_timeout: Duration,
    /// Pause before retrying a failed fetch.
    pub retry_delay: Duration,
    /// Total fetch attempts per URL.
    pub max_fetch_attempts: u32,
    /// Minimum and maximum sleep between clubs (seconds).
    pub sleep_between_clubs: (f32, f32),
    /// Optional wall-clock budget for a whole run.
    pub run_deadline: Option<Duration>,
    /// User agent string to use for HTTP requests.
    pub user_agent: String,
    /// Accept-Language header sent with every request.
    pub accept_language: String,
    /// Href fragment identifying club detail pages on the directory site.
    pub club_path_marker: String,
    /// Domain of the directory site. Derived from the league URL when `None`.
    pub directory_domain: Option<String>,
    /// Raw selector for the club name heading.
    pub heading_selector_raw: String,
    /// Raw selector for the country anchor.
    pub country_selector_raw: String,
    /// Compiled heading selector.
    pub heading_selector: Selector,
    /// Compiled country selector.
    pub country_selector: Selector,
    /// Anchor text fragments marking a link as the club's official site.
    pub official_site_labels: Vec<String>,
    /// Multilingual keywords that identify a contact page.
    pub contact_hints: Vec<String>,
    /// Local-part keywords used to rank emails, highest priority first.
    pub priority_keywords: Vec<String>,
    /// Href fragment that identifies the social profile link.
    pub social_marker: String,
    /// Club ceiling used when a run does not specify one.
    pub default_max_clubs: usize,
    /// League name used when a run does not specify one.
    pub default_league_name: String,
    /// Directory where exported lead sheets are written.
    pub output_dir: PathBuf,
    /// Base URL used to build download links.
    pub public_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        let contact_hints = [
            "contact",
            "contato",
            "kontakt",
            "kontakte",
            "contacto",
            "impressum",
            "contatti",
            "fale",
            "about",
        ];

        let priority_keywords = [
            "marketing",
            "media",
            "midia",
            "press",
            "imprensa",
            "comunicacao",
            "communication",
            "assessoria",
            "commercial",
            "comercial",
            "secretaria",
            "administrativo",
            "admin",
            "geral",
            "info",
            "contato",
            "contact",
        ];

        Config {
            request_timeout: Duration::from_secs(10),
            retry_delay: Duration::from_millis(1200),
            max_fetch_attempts: 2,
            sleep_between_clubs: (0.6, 1.2),
            run_deadline: None,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36".to_string(),
            accept_language: "en-US,en;q=0.9,pt-BR;q=0.8".to_string(),
            club_path_marker: "/club/".to_string(),
            directory_domain: None,
            heading_selector_raw: "h1".to_string(),
            country_selector_raw: "a[href*='country']".to_string(),
            heading_selector: Selector::parse("h1").expect("Built-in heading selector is valid"),
            country_selector: Selector::parse("a[href*='country']")
                .expect("Built-in country selector is valid"),
            official_site_labels: ["website", "official", "site"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            contact_hints: contact_hints.iter().map(|s| s.to_string()).collect(),
            priority_keywords: priority_keywords.iter().map(|s| s.to_string()).collect(),
            social_marker: "instagram.com".to_string(),
            default_max_clubs: 20,
            default_league_name: "Unknown League".to_string(),
            output_dir: PathBuf::from("exports"),
            public_base_url: "http://localhost:10000".to_string(),
        }
    }
}

impl Config {
    /// Returns a uniformly random pause within the configured inter-club range.
    pub(crate) fn random_club_delay(&self) -> Duration {
        use rand::Rng;
        let (min, max) = self.sleep_between_clubs;
        if min >= max {
            return Duration::from_secs_f32(min.max(0.0));
        }
        let duration_secs = rand::thread_rng().gen_range(min..max);
        Duration::from_secs_f32(duration_secs)
    }
}

/// Load configuration from a TOML file
fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() {
        tracing::warn!("Configuration file {} not found, using defaults", file_path);
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    let config = parse_config_file(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;

    tracing::info!("Loaded configuration from {}", file_path);
    Ok(config)
}

fn parse_config_file(content: &str) -> std::result::Result<ConfigFile, toml::de::Error> {
    toml::from_str(content)
}

fn apply_file_config(config: &mut Config, file_config: &ConfigFile) {
    if let Some(network) = &file_config.network {
        if let Some(timeout) = network.request_timeout {
            config.request_timeout = Duration::from_secs(timeout);
        }
        if let Some(delay) = network.retry_delay_ms {
            config.retry_delay = Duration::from_millis(delay);
        }
        if let Some(attempts) = network.max_fetch_attempts {
            config.max_fetch_attempts = attempts;
        }
        if let Some(min_sleep) = network.min_sleep {
            config.sleep_between_clubs.0 = min_sleep;
        }
        if let Some(max_sleep) = network.max_sleep {
            config.sleep_between_clubs.1 = max_sleep;
        }
        if let Some(deadline) = network.run_deadline {
            config.run_deadline = Some(Duration::from_secs(deadline));
        }
        if let Some(user_agent) = &network.user_agent {
            config.user_agent = user_agent.clone();
        }
        if let Some(language) = &network.accept_language {
            config.accept_language = language.clone();
        }
    }

    if let Some(directory) = &file_config.directory {
        if let Some(marker) = &directory.club_path_marker {
            config.club_path_marker = marker.clone();
        }
        if let Some(domain) = &directory.directory_domain {
            config.directory_domain = Some(domain.clone());
        }
        if let Some(selector) = &directory.heading_selector {
            config.heading_selector_raw = selector.clone();
        }
        if let Some(selector) = &directory.country_selector {
            config.country_selector_raw = selector.clone();
        }
        if let Some(labels) = &directory.official_site_labels {
            config.official_site_labels = labels.clone();
        }
    }

    if let Some(contacts) = &file_config.contacts {
        if let Some(hints) = &contacts.contact_hints {
            config.contact_hints = hints.clone();
        }
        if let Some(keywords) = &contacts.priority_keywords {
            config.priority_keywords = keywords.clone();
        }
        if let Some(marker) = &contacts.social_marker {
            config.social_marker = marker.clone();
        }
    }

    if let Some(run) = &file_config.run {
        if let Some(max_clubs) = run.default_max_clubs {
            config.default_max_clubs = max_clubs;
        }
        if let Some(name) = &run.default_league_name {
            config.default_league_name = name.clone();
        }
    }

    if let Some(export) = &file_config.export {
        if let Some(dir) = &export.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(base) = &export.public_base_url {
            config.public_base_url = base.clone();
        }
    }
}

/// Apply command line arguments to the Config instance
fn apply_cli_args(config: &mut Config, args: &ConfigArgs) {
    if let Some(timeout) = args.request_timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }

    if let Some(delay) = args.retry_delay_ms {
        config.retry_delay = Duration::from_millis(delay);
    }

    if let Some(min_sleep) = args.min_sleep {
        config.sleep_between_clubs.0 = min_sleep;
    }

    if let Some(max_sleep) = args.max_sleep {
        config.sleep_between_clubs.1 = max_sleep;
    }

    if let Some(deadline) = args.run_deadline {
        config.run_deadline = Some(Duration::from_secs(deadline));
    }

    if let Some(ref agent) = args.user_agent {
        config.user_agent = agent.clone();
    }

    if let Some(ref marker) = args.club_path_marker {
        config.club_path_marker = marker.clone();
    }

    if let Some(ref domain) = args.directory_domain {
        config.directory_domain = Some(domain.clone());
    }

    if let Some(ref dir) = args.output_dir {
        config.output_dir = dir.clone();
    }

    if let Some(ref base) = args.public_base_url {
        config.public_base_url = base.clone();
    }
}

fn compile_selector(raw: &str, what: &str) -> Result<Selector> {
    Selector::parse(raw)
        .map_err(|e| AppError::Config(format!("Invalid {} selector '{}': {:?}", what, raw, e)))
}

fn validate_config(config: &mut Config) -> Result<()> {
    if config.sleep_between_clubs.0 < 0.0 {
        config.sleep_between_clubs.0 = 0.0;
        tracing::warn!("Min sleep was negative. Setting to 0.");
    }

    if config.sleep_between_clubs.0 > config.sleep_between_clubs.1 {
        config.sleep_between_clubs.1 = config.sleep_between_clubs.0;
        tracing::warn!(
            "Min sleep was greater than max sleep. Setting both to {}",
            config.sleep_between_clubs.0
        );
    }

    if config.max_fetch_attempts == 0 {
        config.max_fetch_attempts = 1;
        tracing::warn!("Fetch attempts was set to 0. Setting to 1.");
    }

    if config.club_path_marker.trim().is_empty() {
        return Err(AppError::Config(
            "club_path_marker must not be empty".to_string(),
        ));
    }

    for list in [
        &mut config.contact_hints,
        &mut config.priority_keywords,
        &mut config.official_site_labels,
    ] {
        for entry in list.iter_mut() {
            *entry = entry.trim().to_lowercase();
        }
        list.retain(|entry| !entry.is_empty());
    }

    config.social_marker = config.social_marker.trim().to_lowercase();
    if config.social_marker.is_empty() {
        return Err(AppError::Config("social_marker must not be empty".to_string()));
    }

    config.public_base_url = config.public_base_url.trim_end_matches('/').to_string();

    config.heading_selector = compile_selector(&config.heading_selector_raw, "heading")?;
    config.country_selector = compile_selector(&config.country_selector_raw, "country")?;

    Ok(())
}

/// Builds the final configuration: defaults, then a TOML file, then CLI/env overrides.
pub(crate) fn build_config(args: &ConfigArgs) -> anyhow::Result<Config> {
    let mut config = Config::default();

    if let Some(ref file_path) = args.config_file {
        let file_config = load_config_file(file_path)?;
        apply_file_config(&mut config, &file_config);
    } else {
        for path in ["./club-scout.toml", "./config.toml"].iter() {
            if Path::new(path).exists() {
                match load_config_file(path) {
                    Ok(file_config) => {
                        apply_file_config(&mut config, &file_config);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load configuration from {}: {}", path, e);
                    }
                }
            }
        }
    }

    apply_cli_args(&mut config, args);

    validate_config(&mut config)?;

    tracing::debug!("Final configuration: {:?}", config);

    Ok(config)
}
