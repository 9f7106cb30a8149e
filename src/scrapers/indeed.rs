//! Indeed México job search scraper.
//!
//! Scrapes `mx.indeed.com/jobs`, sorted by date. Result cards come in two
//! layouts (`div.job_seen_beacon` and the older `td.resultContent`), so every
//! field selector lists both variants.

use super::{HttpSession, SourceExtractor, first_href, first_text};
use crate::error::ExtractionError;
use crate::models::{Experience, Listing};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use urlencoding::encode;

const BASE_URL: &str = "https://mx.indeed.com";

static CARD: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.job_seen_beacon, td.resultContent").expect("card selector")
});
static TITLE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h2.jobTitle span[title], h2.jobTitle a").expect("title selector")
});
static COMPANY: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("[data-testid='company-name'], span.companyName").expect("company selector")
});
static LOCATION: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("[data-testid='text-location'], div.companyLocation")
        .expect("location selector")
});
static LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[id^='job_'], a.jcs-JobTitle").expect("link selector"));

/// Indeed México source.
#[derive(Debug, Clone)]
pub struct Indeed {
    max_results: usize,
}

impl Indeed {
    pub fn new(max_results: usize) -> Self {
        Self { max_results }
    }
}

// Indeed has a single entry-level bucket for both internships and graduates.
fn experience_filter(experience: Experience) -> &'static str {
    match experience {
        Experience::Internship | Experience::NewGraduate => "&explvl=entry_level",
        Experience::Both => "",
    }
}

/// Search page URL for one keyword.
pub fn search_url(keyword: &str, location: &str, experience: Experience) -> String {
    format!(
        "{BASE_URL}/jobs?q={}&l={}{}&sort=date",
        encode(keyword),
        encode(location),
        experience_filter(experience)
    )
}

/// Parse job cards out of an Indeed results page.
pub fn parse_listings(html: &str, fallback_location: &str, max_results: usize) -> Vec<Listing> {
    let document = Html::parse_document(html);

    document
        .select(&CARD)
        .take(max_results)
        .filter_map(|card| {
            let title = first_text(card, &TITLE);
            let company = first_text(card, &COMPANY);
            if title.is_empty() || company.is_empty() {
                debug!("Skipping Indeed card without title or company");
                return None;
            }
            let location = first_text(card, &LOCATION);
            let location = if location.is_empty() {
                fallback_location
            } else {
                location.as_str()
            };
            let link = first_href(card, &LINK);
            Some(Listing::new(&title, &company, location, &link, BASE_URL, "indeed"))
        })
        .collect()
}

#[async_trait]
impl SourceExtractor<HttpSession> for Indeed {
    fn id(&self) -> &str {
        "indeed"
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
        let listings = parse_listings(&html, location, self.max_results);
        info!(count = listings.len(), "Scraped Indeed listings");
        Ok(listings)
    }
}
