//! The scraping engine: cache-fronted, multi-source job search.
//!
//! A search runs through these stages:
//! 1. **Validate**: the career must exist in the catalog
//! 2. **Cache lookup**: a fresh cached result is returned as is
//! 3. **Session**: one session is opened and shared by every source
//! 4. **Fetch**: each source runs through [`retry_with_backoff`]; a source that
//!    exhausts its retries or misses the search deadline contributes nothing
//! 5. **Merge, dedupe, shuffle**: results are concatenated in registration
//!    order, duplicates by (title, company) dropped, the rest shuffled
//! 6. **Cache store**: the final sequence is cached with the default TTL
//!
//! Only an unknown career and a failure to open the session are errors. A
//! search where every source failed succeeds with an empty result.

use crate::cache::{CacheStats, ResultCache, fingerprint};
use crate::config::EngineConfig;
use crate::error::{ExtractionError, SearchError};
use crate::models::{Listing, SearchQuery};
use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::scrapers::{SessionFactory, SourceExtractor};
use crate::utils::{polite_pause, truncate_for_log};
use futures::FutureExt;
use futures::future::join_all;
use itertools::Itertools;
use rand::rng;
use rand::seq::SliceRandom;
use std::panic::{AssertUnwindSafe, resume_unwind};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{error, info, instrument, warn};

/// Coordinates sources, retries and the result cache.
pub struct ScrapingEngine<F: SessionFactory> {
    factory: F,
    sources: Vec<Box<dyn SourceExtractor<F::Session>>>,
    cache: Arc<ResultCache<Vec<Listing>>>,
    retry: RetryPolicy,
    source_pause: (Duration, Duration),
    search_deadline: Duration,
    concurrent: bool,
}

impl<F: SessionFactory> ScrapingEngine<F> {
    /// Build an engine.
    ///
    /// # Arguments
    ///
    /// * `factory` - Opens the session shared by all sources of a search
    /// * `sources` - Extractors, queried and merged in this order
    /// * `cache` - Result cache, possibly shared with other engines
    /// * `config` - Retry, pacing, deadline and scheduling settings
    pub fn new(
        factory: F,
        sources: Vec<Box<dyn SourceExtractor<F::Session>>>,
        cache: Arc<ResultCache<Vec<Listing>>>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            factory,
            sources,
            cache,
            retry: config.retry_policy(),
            source_pause: config.source_pause(),
            search_deadline: config.search_deadline(),
            concurrent: config.concurrent_sources,
        }
    }

    /// Override the overall budget for the fetch phase of one search.
    pub fn with_search_deadline(mut self, deadline: Duration) -> Self {
        self.search_deadline = deadline;
        self
    }

    /// Ids of the registered sources, in registration order.
    pub fn source_ids(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.id().to_string()).collect()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Search one career, validating the raw request parameters first.
    ///
    /// # Errors
    ///
    /// [`SearchError::InvalidQuery`] for an unknown career, before the cache
    /// is touched. [`SearchError::Session`] when the session cannot be opened.
    #[instrument(level = "info", skip(self))]
    pub async fn search(
        &self,
        category: &str,
        location: &str,
        experience: &str,
    ) -> Result<Vec<Listing>, SearchError> {
        let query = SearchQuery::parse(category, location, experience)?;
        self.search_query(&query).await
    }

    /// Search an already validated query.
    pub async fn search_query(&self, query: &SearchQuery) -> Result<Vec<Listing>, SearchError> {
        let key = fingerprint(query);
        if let Some(cached) = self.cache.get(&key) {
            info!(count = cached.len(), category = %query.category, "Serving cached search");
            return Ok(cached);
        }

        let keyword = query.category.primary_keyword();
        info!(
            category = %query.category,
            icon = query.category.icon(),
            %keyword,
            location = %query.location,
            experience = %query.experience,
            "Starting search"
        );
        let t0 = Instant::now();

        let session = self.factory.open().await?;
        let outcome = AssertUnwindSafe(self.fetch_all(&session, keyword, query))
            .catch_unwind()
            .await;
        self.factory.close(session).await;
        let per_source = match outcome {
            Ok(per_source) => per_source,
            Err(panic) => {
                error!(category = %query.category, "A source panicked; session released");
                resume_unwind(panic);
            }
        };

        let fetched: usize = per_source.iter().map(Vec::len).sum();
        let mut listings = merge_and_dedupe(per_source);
        listings.shuffle(&mut rng());

        info!(
            fetched,
            unique = listings.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Search complete"
        );
        self.cache.set(&key, listings.clone());
        Ok(listings)
    }

    /// Results of every source, indexed like `self.sources`.
    async fn fetch_all(
        &self,
        session: &F::Session,
        keyword: &str,
        query: &SearchQuery,
    ) -> Vec<Vec<Listing>> {
        let deadline = Instant::now() + self.search_deadline;

        if self.concurrent {
            // join_all yields in input order, not completion order.
            return join_all(
                self.sources
                    .iter()
                    .map(|source| self.fetch_source(source.as_ref(), session, keyword, query, deadline)),
            )
            .await;
        }

        let mut results = Vec::with_capacity(self.sources.len());
        for (i, source) in self.sources.iter().enumerate() {
            if i > 0 && Instant::now() < deadline {
                polite_pause(self.source_pause.0, self.source_pause.1).await;
            }
            results.push(
                self.fetch_source(source.as_ref(), session, keyword, query, deadline)
                    .await,
            );
        }
        results
    }

    async fn fetch_source(
        &self,
        source: &dyn SourceExtractor<F::Session>,
        session: &F::Session,
        keyword: &str,
        query: &SearchQuery,
        deadline: Instant,
    ) -> Vec<Listing> {
        let id = source.id();
        if Instant::now() >= deadline {
            warn!(source = %id, "Search deadline reached; skipping source");
            return Vec::new();
        }

        let attempts = retry_with_backoff(&self.retry, id, || {
            source.extract(session, keyword, &query.location, query.experience)
        });

        match timeout_at(deadline, attempts).await {
            Ok(Ok(listings)) => {
                info!(source = %id, count = listings.len(), "Source finished");
                listings
            }
            Ok(Err(e)) => {
                error!(
                    source = %id,
                    error = %truncate_for_log(&e.to_string(), 200),
                    "Source failed; continuing without it"
                );
                Vec::new()
            }
            Err(_) => {
                let e = ExtractionError::DeadlineExceeded(self.search_deadline);
                warn!(source = %id, error = %e, "Source abandoned; continuing without it");
                Vec::new()
            }
        }
    }
}

/// Concatenate per-source results and keep the first listing per
/// case-insensitive (title, company).
pub fn merge_and_dedupe(per_source: Vec<Vec<Listing>>) -> Vec<Listing> {
    per_source
        .into_iter()
        .flatten()
        .unique_by(Listing::dedup_key)
        .collect()
}
