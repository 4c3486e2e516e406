//! # AI News Relay
//!
//! Polls a handful of AI-industry news sources, keeps a history of links it
//! has already handled, translates new items to Korean with Gemini and posts
//! them to a Discord webhook.
//!
//! ## Usage
//!
//! ```sh
//! DISCORD_WEBHOOK_URL=... GEMINI_API_KEY=... ai_news_relay
//! ```
//!
//! ## Architecture
//!
//! One sequential run per invocation:
//! 1. **Collecting**: every source in [`scrapers::default_sources`] is fetched
//!    and parsed (RSS/Atom feed or HTML news cards); failures yield nothing
//! 2. **Gating**: entries whose link is already in the history are dropped
//! 3. **Translating**: title and summary go through Gemini, degrading to the
//!    original text with a marker on failure
//! 4. **Recording**: the history file is rewritten before delivery
//! 5. **Delivering**: one Discord embed per item
//!
//! Only a history read/write failure makes the process exit non-zero.

use clap::Parser;
use std::error::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod error;
mod history;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod translate;
mod utils;

use cli::{Cli, Config};
use outputs::discord::DiscordWebhook;
use scrapers::fetch::HttpFetcher;
use translate::GeminiTranslator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; the environment may already be populated.
    let dotenv = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) => debug!(error = %e, "No .env loaded"),
    }

    let start_time = std::time::Instant::now();
    info!("Starting AI news check");

    let config = Config::from(Cli::parse());
    debug!(
        history_file = %config.history_file.display(),
        timeout = ?config.request_timeout,
        dry_run = config.dry_run,
        "Parsed configuration"
    );

    let fetcher = HttpFetcher::new(config.request_timeout)?;
    let translator = GeminiTranslator::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.request_timeout,
    )?;
    let webhook = DiscordWebhook::new(config.webhook_url.clone(), config.request_timeout)?;
    if !webhook.is_configured() {
        warn!("DISCORD_WEBHOOK_URL not set; new items will be recorded but not sent");
    }

    let sources = scrapers::default_sources();
    let summary = pipeline::run(&config, &fetcher, &sources, &translator, &webhook).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        fetched = summary.fetched,
        new = summary.new,
        delivered = summary.delivered,
        skipped_deliveries = summary.skipped_deliveries,
        failed_deliveries = summary.failed_deliveries,
        "Execution complete"
    );

    Ok(())
}
