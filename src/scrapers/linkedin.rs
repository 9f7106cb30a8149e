//! LinkedIn job search scraper.
//!
//! Uses the public job search page, which renders the first batch of results
//! server-side as `div.base-card` elements. No login is involved.
//!
//! # URL Pattern
//!
//! ```text
//! https://www.linkedin.com/jobs/search/?keywords=<kw>&location=<loc>[&f_E=..]&sortBy=DD
//! ```
//!
//! `f_E=1` selects internships, `f_E=2` entry level, `f_E=1%2C2` both.

use super::{HttpSession, SourceExtractor, first_href, first_text};
use crate::error::ExtractionError;
use crate::models::{Experience, Listing};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use urlencoding::encode;

const BASE_URL: &str = "https://www.linkedin.com";

static CARD: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.base-card, div.job-search-card").expect("card selector"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h3").expect("title selector"));
static COMPANY: Lazy<Selector> = Lazy::new(|| Selector::parse("h4").expect("company selector"));
static LOCATION: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("span.job-search-card__location").expect("location selector")
});
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("link selector"));

/// LinkedIn source.
#[derive(Debug, Clone)]
pub struct LinkedIn {
    max_results: usize,
}

impl LinkedIn {
    pub fn new(max_results: usize) -> Self {
        Self { max_results }
    }
}

fn experience_filter(experience: Experience) -> &'static str {
    match experience {
        Experience::Internship => "&f_E=1",
        Experience::NewGraduate => "&f_E=2",
        Experience::Both => "&f_E=1%2C2",
    }
}

/// Search page URL for one keyword.
pub fn search_url(keyword: &str, location: &str, experience: Experience) -> String {
    format!(
        "{BASE_URL}/jobs/search/?keywords={}&location={}{}&sortBy=DD",
        encode(keyword),
        encode(location),
        experience_filter(experience)
    )
}

/// Parse job cards out of a LinkedIn search page.
///
/// Cards without a title or a company are skipped. A card without a location
/// inherits `fallback_location`.
pub fn parse_listings(
    html: &str,
    fallback_location: &str,
    experience: Experience,
    max_results: usize,
) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let level = match experience {
        Experience::Internship => "Prácticas",
        _ => "Entry Level",
    };

    document
        .select(&CARD)
        .take(max_results)
        .filter_map(|card| {
            let title = first_text(card, &TITLE);
            let company = first_text(card, &COMPANY);
            if title.is_empty() || company.is_empty() {
                debug!("Skipping LinkedIn card without title or company");
                return None;
            }
            let location = first_text(card, &LOCATION);
            let location = if location.is_empty() {
                fallback_location
            } else {
                location.as_str()
            };
            let link = first_href(card, &LINK);
            Some(
                Listing::new(&title, &company, location, &link, BASE_URL, "linkedin")
                    .with_experience_level(level),
            )
        })
        .collect()
}

#[async_trait]
impl SourceExtractor<HttpSession> for LinkedIn {
    fn id(&self) -> &str {
        "linkedin"
    }

    #[instrument(level = "info", skip(self, session))]
    async fn extract(
        &self,
        session: &HttpSession,
        keyword: &str,
        location: &str,
        experience: Experience,
    ) -> Result<Vec<Listing>, ExtractionError> {
        let url = search_url(keyword, location, experience);
        let html = session.fetch_html(&url).await?;
        let listings = parse_listings(&html, location, experience, self.max_results);
        info!(count = listings.len(), "Scraped LinkedIn listings");
        Ok(listings)
    }
}
