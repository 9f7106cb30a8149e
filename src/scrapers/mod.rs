//! Job board scrapers and the scraping session they share.
//!
//! Every source implements [`SourceExtractor`]: given the shared session, a
//! keyword, a location and an experience filter it returns at most a handful
//! of [`Listing`]s, or fails. The engine treats extractors as opaque and only
//! relies on them being safe to retry and bounded in time.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | LinkedIn | [`linkedin`] | HTML scraping | Public job search page, newest first |
//! | Indeed México | [`indeed`] | HTML scraping | `mx.indeed.com`, newest first |
//!
//! # Sessions
//!
//! One session is opened per search and shared by every source. The
//! production session is an [`HttpSession`]: a reqwest client with a desktop
//! user agent picked at random per session, Mexican Spanish language headers
//! and a request timeout that bounds every page load.

pub mod indeed;
pub mod linkedin;

use crate::error::{ExtractionError, SessionError};
use crate::models::{Experience, Listing};
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use rand::rng;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Conventional cap on listings returned per source and search.
pub const DEFAULT_MAX_RESULTS: usize = 8;

/// Desktop browsers the HTTP session pretends to be.
pub const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0",
];

/// A pluggable listing source.
#[async_trait]
pub trait SourceExtractor<S>: Send + Sync
where
    S: Send + Sync,
{
    /// Short identifier stamped on every listing from this source.
    fn id(&self) -> &str;

    /// Fetch listings for one keyword.
    ///
    /// Implementations must be idempotent enough to be retried and must
    /// enforce their own per-request timeout.
    async fn extract(
        &self,
        session: &S,
        keyword: &str,
        location: &str,
        experience: Experience,
    ) -> Result<Vec<Listing>, ExtractionError>;
}

/// Opens and releases the session shared by all sources of one search.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: Send + Sync + 'static;

    /// Acquire a fresh session. A factory that fails halfway must release
    /// whatever it already acquired before returning the error.
    async fn open(&self) -> Result<Self::Session, SessionError>;

    /// Release a session. Called exactly once per successful `open`.
    async fn close(&self, session: Self::Session);
}

/// HTTP-backed scraping session.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: reqwest::Client,
    user_agent: &'static str,
}

impl HttpSession {
    pub fn user_agent(&self) -> &'static str {
        self.user_agent
    }

    /// GET `url` and return the body of a successful response.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_html(&self, url: &str) -> Result<String, ExtractionError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ExtractionError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ExtractionError::from_reqwest(url, e))?;
        if body.trim().is_empty() {
            return Err(ExtractionError::Parse(format!("empty page from {url}")));
        }
        debug!(bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

/// Builds one [`HttpSession`] per search.
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    request_timeout: Duration,
}

impl HttpSessionFactory {
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    type Session = HttpSession;

    async fn open(&self) -> Result<HttpSession, SessionError> {
        let user_agent = *USER_AGENTS.choose(&mut rng()).unwrap_or(&USER_AGENTS[0]);

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("es-MX,es;q=0.9,en;q=0.8"),
        );

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(self.request_timeout)
            .build()?;

        info!(%user_agent, timeout_secs = self.request_timeout.as_secs(), "Opened HTTP session");
        Ok(HttpSession { client, user_agent })
    }

    async fn close(&self, session: HttpSession) {
        debug!(user_agent = %session.user_agent(), "Closed HTTP session");
        drop(session);
    }
}

/// The production sources, in registration order.
pub fn default_sources(max_results: usize) -> Vec<Box<dyn SourceExtractor<HttpSession>>> {
    vec![
        Box::new(linkedin::LinkedIn::new(max_results)),
        Box::new(indeed::Indeed::new(max_results)),
    ]
}

/// Text of the first element under `card` matching `selector`, cleaned.
pub(crate) fn first_text(card: scraper::ElementRef<'_>, selector: &scraper::Selector) -> String {
    card.select(selector)
        .next()
        .map(|e| crate::utils::clean_text(&e.text().collect::<String>()))
        .unwrap_or_default()
}

/// `href` of the first element under `card` matching `selector`.
pub(crate) fn first_href(card: scraper::ElementRef<'_>, selector: &scraper::Selector) -> String {
    card.select(selector)
        .find_map(|e| e.value().attr("href"))
        .unwrap_or_default()
        .to_string()
}
