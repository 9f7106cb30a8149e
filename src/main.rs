//! # JobScout
//!
//! An HTTP service that finds entry-level job openings for a fixed catalog of
//! careers by scraping several job boards, deduplicating the results and
//! caching them per query.
//!
//! ## Features
//!
//! - Scrapes LinkedIn and Indeed México with one shared HTTP session per search
//! - Retries each source with exponential backoff and jitter; a failing source
//!   never fails the search
//! - Deduplicates listings by (title, company) across sources
//! - Caches results per (career, location, experience) for ten minutes
//! - Serves a JSON API and the static frontend
//!
//! ## Usage
//!
//! ```sh
//! PORT=5000 jobscout --config ./jobscout.yaml
//! curl 'http://localhost:5000/api/scrape?career=mecanica&location=CDMX&experience=ambos'
//! ```
//!
//! ## Architecture
//!
//! 1. **Routing**: [`server`] validates query parameters and shapes responses
//! 2. **Orchestration**: [`engine`] consults the cache and drives the sources
//! 3. **Resilience**: [`retry`] wraps every source attempt
//! 4. **Extraction**: [`scrapers`] fetch and parse the job boards

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cache;
mod cli;
mod config;
mod engine;
mod error;
mod models;
mod retry;
mod scrapers;
mod server;
mod utils;

use cache::ResultCache;
use cli::Cli;
use config::EngineConfig;
use engine::ScrapingEngine;
use scrapers::{HttpSessionFactory, default_sources};
use server::AppState;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    // --- Tracing init ---
    let default_level = if args.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(environment = %args.environment, "jobscout starting up");
    debug!(?args, "Parsed CLI arguments");

    let config = EngineConfig::load(args.config.as_deref()).await?;

    // ---- Engine ----
    let cache = Arc::new(ResultCache::new(config.cache_ttl()));
    let factory = HttpSessionFactory::new(config.request_timeout());
    let sources = default_sources(config.max_results_per_source);
    let engine = ScrapingEngine::new(factory, sources, cache, &config);
    info!(
        sources = ?engine.source_ids(),
        cache_ttl_secs = config.cache_ttl_secs,
        max_retries = config.max_retries,
        concurrent = config.concurrent_sources,
        "Scraping engine ready"
    );

    // ---- HTTP ----
    let state = Arc::new(AppState {
        engine: Arc::new(engine),
        environment: args.environment.clone(),
    });
    let app = server::router(state, &args.static_dir);

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port)).await?;
    info!(
        addr = %listener.local_addr()?,
        static_dir = %args.static_dir,
        "Listening"
    );
    axum::serve(listener, app).await?;

    info!("Server stopped");
    Ok(())
}
