use anyhow::Result;
use clap::{Parser, Subcommand};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod contacts;
mod directory;
mod error;
mod export;
mod fetcher;
mod links;
mod locator;
mod models;
mod normalize;
mod pipeline;
mod profile;
mod strategy;

use fetcher::{FetchSettings, HttpFetcher};
use pipeline::LeadPipeline;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: config::ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect club contact leads for one league and export them as CSV
    Run {
        /// URL of the league listing page on the directory site
        #[arg(long, env = "CLUB_SCOUT_LEAGUE_URL")]
        league_url: Option<String>,

        /// Display name of the league
        #[arg(long, env = "CLUB_SCOUT_LEAGUE_NAME")]
        league_name: Option<String>,

        /// Maximum number of clubs to process
        #[arg(short, long)]
        max_clubs: Option<usize>,

        /// Also print the leads as JSON to stdout
        #[arg(long, default_value_t = false)]
        stdout: bool,
    },
    /// Start the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 10000, env = "CLUB_SCOUT_PORT")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = config::build_config(&cli.config)?;
    let fetcher = HttpFetcher::new(FetchSettings::from(&config))?;

    match cli.command {
        Commands::Run {
            league_url,
            league_name,
            max_clubs,
            stdout,
        } => {
            let pipeline = LeadPipeline::new(fetcher, config);
            run_league(pipeline, league_name, league_url, max_clubs, stdout).await?;
        }
        Commands::Serve { port } => {
            info!("Starting API server on port {}", port);
            api::start_api_server(LeadPipeline::new(fetcher, config), port).await;
        }
    }

    Ok(())
}

async fn run_league(
    pipeline: LeadPipeline<HttpFetcher>,
    league_name: Option<String>,
    league_url: Option<String>,
    max_clubs: Option<usize>,
    stdout: bool,
) -> Result<()> {
    let progress_bar = indicatif::ProgressBar::new(0);
    progress_bar.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );
    let pipeline = pipeline.with_progress(progress_bar);

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        let interrupted = || async { tokio::signal::ctrl_c().await.is_ok() };
        if watch_interrupts(interrupted, &cancel_on_signal).await {
            std::process::exit(130);
        }
    });

    let league_name = pipeline.league_name_or_default(league_name.as_deref());
    let records = pipeline
        .run_until(
            Some(&league_name),
            league_url.as_deref(),
            max_clubs,
            &cancel,
        )
        .await?;

    let path = export::export_leads(&records, &league_name, &pipeline.config().output_dir)?;
    info!(
        "Processed {} clubs for league {}. Leads written to {}",
        records.len(),
        league_name,
        path.display()
    );

    if stdout {
        println!("{}", serde_json::to_string_pretty(&records)?);
    }

    Ok(())
}

/// The first interrupt asks the run to stop after the current club. Returns
/// `true` when a second one arrives and the process should exit right away.
async fn watch_interrupts<S, Fut>(mut interrupted: S, cancel: &AtomicBool) -> bool
where
    S: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    if !interrupted().await {
        return false;
    }
    tracing::warn!("Interrupt received; stopping after the current club (press Ctrl-C again to exit)");
    cancel.store(true, Ordering::Relaxed);

    if !interrupted().await {
        return false;
    }
    tracing::warn!("Second interrupt received; exiting");
    true
}
