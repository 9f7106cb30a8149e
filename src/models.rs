//! Data models for job listings, careers and search queries.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Listing`]: A normalized job record produced by a source extractor
//! - [`Category`]: The fixed catalog of careers that can be searched
//! - [`Experience`]: The experience-level filter passed to every source
//! - [`SearchQuery`]: A validated (category, location, experience) triple
//!
//! Category and experience ids are the Spanish slugs the frontend sends
//! (`mecanica`, `practicas`, `ambos`, ...), so they double as the wire format.

use crate::error::SearchError;
use crate::utils::{clean_text, clean_url};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Label used when a source does not report an experience level.
pub const UNSPECIFIED_EXPERIENCE: &str = "unspecified";

/// Location searched when the caller does not provide one.
pub const DEFAULT_LOCATION: &str = "México";

/// A normalized job listing.
///
/// Listings are immutable value objects: every field is cleaned once in
/// [`Listing::new`] and only exposed through accessors afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Listing {
    title: String,
    company: String,
    location: String,
    link: String,
    source: String,
    experience_level: String,
}

impl Listing {
    /// Build a listing from raw scraped text.
    ///
    /// # Arguments
    ///
    /// * `title`, `company`, `location` - Raw text, whitespace is collapsed
    /// * `link` - Absolute or root-relative URL of the posting
    /// * `base` - Origin used to resolve a root-relative `link`
    /// * `source` - Identifier of the source that produced the listing
    pub fn new(
        title: &str,
        company: &str,
        location: &str,
        link: &str,
        base: &str,
        source: &str,
    ) -> Self {
        Self {
            title: clean_text(title),
            company: clean_text(company),
            location: clean_text(location),
            link: clean_url(link, base),
            source: source.to_string(),
            experience_level: UNSPECIFIED_EXPERIENCE.to_string(),
        }
    }

    /// Return a copy labelled with the given experience level.
    pub fn with_experience_level(mut self, level: &str) -> Self {
        self.experience_level = clean_text(level);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn experience_level(&self) -> &str {
        &self.experience_level
    }

    /// Identity used for deduplication: lowercased (title, company).
    pub fn dedup_key(&self) -> (String, String) {
        (self.title.to_lowercase(), self.company.to_lowercase())
    }
}

/// A career that can be searched.
///
/// The catalog is closed: adding a career means adding a variant here along
/// with its keywords and icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Mecatronica,
    Industrial,
    Mecanica,
    TecnologiasComputacionales,
    Civil,
    Biotecnologia,
    Finanzas,
    Administracion,
    TransformacionNegocios,
    NegociosInternacionales,
    Mercadotecnia,
    Arquitectura,
    Derecho,
}

impl Category {
    /// Every category, in catalog order.
    pub const ALL: [Category; 13] = [
        Category::Mecatronica,
        Category::Industrial,
        Category::Mecanica,
        Category::TecnologiasComputacionales,
        Category::Civil,
        Category::Biotecnologia,
        Category::Finanzas,
        Category::Administracion,
        Category::TransformacionNegocios,
        Category::NegociosInternacionales,
        Category::Mercadotecnia,
        Category::Arquitectura,
        Category::Derecho,
    ];

    /// Stable id used in URLs and cache keys.
    pub fn id(self) -> &'static str {
        match self {
            Category::Mecatronica => "mecatronica",
            Category::Industrial => "industrial",
            Category::Mecanica => "mecanica",
            Category::TecnologiasComputacionales => "tecnologias_computacionales",
            Category::Civil => "civil",
            Category::Biotecnologia => "biotecnologia",
            Category::Finanzas => "finanzas",
            Category::Administracion => "administracion",
            Category::TransformacionNegocios => "transformacion_negocios",
            Category::NegociosInternacionales => "negocios_internacionales",
            Category::Mercadotecnia => "mercadotecnia",
            Category::Arquitectura => "arquitectura",
            Category::Derecho => "derecho",
        }
    }

    /// Search keywords, most specific first.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Category::Mecatronica => &[
                "ingeniero mecatrónico",
                "automatización industrial",
                "robótica",
                "PLC",
            ],
            Category::Industrial => &[
                "ingeniero industrial",
                "mejora continua",
                "lean manufacturing",
                "six sigma",
            ],
            Category::Mecanica => &["ingeniero mecánico", "diseño mecánico", "CAD", "manufactura"],
            Category::TecnologiasComputacionales => &[
                "desarrollador software",
                "programador",
                "full stack",
                "backend developer",
            ],
            Category::Civil => &[
                "ingeniero civil",
                "construcción",
                "estructuras",
                "residente de obra",
            ],
            Category::Biotecnologia => &[
                "biotecnólogo",
                "laboratorio",
                "microbiología",
                "calidad alimentos",
            ],
            Category::Finanzas => &[
                "analista financiero",
                "finanzas corporativas",
                "tesorería",
                "FP&A",
            ],
            Category::Administracion => &["administrador empresas", "gestión proyectos", "coordinador"],
            Category::TransformacionNegocios => &[
                "business analyst",
                "consultor negocios",
                "transformación digital",
            ],
            Category::NegociosInternacionales => &[
                "comercio exterior",
                "logística internacional",
                "aduanas",
            ],
            Category::Mercadotecnia => &[
                "marketing digital",
                "community manager",
                "growth marketing",
                "SEO",
            ],
            Category::Arquitectura => &["arquitecto", "diseño arquitectónico", "BIM", "Revit"],
            Category::Derecho => &["abogado", "legal", "jurídico", "corporativo"],
        }
    }

    /// The keyword actually sent to the sources.
    pub fn primary_keyword(self) -> &'static str {
        self.keywords()[0]
    }

    pub fn icon(self) -> &'static str {
        match self {
            Category::Mecatronica => "🤖",
            Category::Industrial => "🏭",
            Category::Mecanica => "⚙️",
            Category::TecnologiasComputacionales => "💻",
            Category::Civil => "🏗️",
            Category::Biotecnologia => "🧬",
            Category::Finanzas => "📊",
            Category::Administracion => "📋",
            Category::TransformacionNegocios => "🚀",
            Category::NegociosInternacionales => "🌎",
            Category::Mercadotecnia => "📱",
            Category::Arquitectura => "🏛️",
            Category::Derecho => "⚖️",
        }
    }

    /// Ids of every category, in catalog order.
    pub fn ids() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.id()).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Category {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.id() == wanted)
            .ok_or_else(|| SearchError::InvalidQuery {
                category: wanted.to_string(),
                available: Self::ids(),
            })
    }
}

/// Experience-level filter applied by the sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Experience {
    #[serde(rename = "practicas")]
    Internship,
    #[serde(rename = "recien_egresado")]
    NewGraduate,
    /// No source-side filter.
    #[default]
    #[serde(rename = "ambos")]
    Both,
}

impl Experience {
    pub fn id(self) -> &'static str {
        match self {
            Experience::Internship => "practicas",
            Experience::NewGraduate => "recien_egresado",
            Experience::Both => "ambos",
        }
    }

    /// Parse a user supplied value, falling back to [`Experience::Both`].
    ///
    /// An unknown experience is never a hard error: it only means the
    /// sources are queried without an experience filter.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "practicas" | "prácticas" | "internship" => Experience::Internship,
            "recien_egresado" | "new_graduate" | "new-graduate" => Experience::NewGraduate,
            "ambos" | "both" | "" => Experience::Both,
            other => {
                warn!(experience = %other, "Unknown experience filter; searching without one");
                Experience::Both
            }
        }
    }
}

impl fmt::Display for Experience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A validated search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub category: Category,
    pub location: String,
    pub experience: Experience,
}

impl SearchQuery {
    /// Validate raw request parameters.
    ///
    /// Fails with [`SearchError::InvalidQuery`] for an unknown category. A
    /// blank location becomes [`DEFAULT_LOCATION`].
    pub fn parse(category: &str, location: &str, experience: &str) -> Result<Self, SearchError> {
        let category = category.parse::<Category>()?;
        let location = clean_text(location);
        Ok(Self {
            category,
            location: if location.is_empty() {
                DEFAULT_LOCATION.to_string()
            } else {
                location
            },
            experience: Experience::parse_lenient(experience),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_creation_normalizes_fields() {
        let listing = Listing::new(
            "  Ingeniero   de Diseño ",
            "Acme\n  Corp",
            " CDMX ",
            "/jobs/view/123?trk=abc#top",
            "https://www.linkedin.com",
            "linkedin",
        );

        assert_eq!(listing.title(), "Ingeniero de Diseño");
        assert_eq!(listing.company(), "Acme Corp");
        assert_eq!(listing.location(), "CDMX");
        assert_eq!(listing.link(), "https://www.linkedin.com/jobs/view/123");
        assert_eq!(listing.source(), "linkedin");
        assert_eq!(listing.experience_level(), UNSPECIFIED_EXPERIENCE);
    }

    #[test]
    fn test_listing_with_experience_level() {
        let listing = Listing::new("A", "B", "C", "", "", "indeed").with_experience_level("Entry Level");
        assert_eq!(listing.experience_level(), "Entry Level");
    }

    #[test]
    fn test_dedup_key_is_case_insensitive() {
        let a = Listing::new("Analista FP&A", "Banco Uno", "", "", "", "linkedin");
        let b = Listing::new("analista fp&a", "BANCO UNO", "", "", "", "indeed");
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_listing_serialization() {
        let listing = Listing::new("Dev", "Co", "GDL", "https://x.mx/a", "", "indeed");
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["title"], "Dev");
        assert_eq!(json["experience_level"], "unspecified");
        assert_eq!(json["link"], "https://x.mx/a");
    }

    #[test]
    fn test_category_round_trips_through_id() {
        for category in Category::ALL {
            assert_eq!(category.id().parse::<Category>().unwrap(), category);
            assert!(!category.keywords().is_empty());
        }
    }

    #[test]
    fn test_category_serde_matches_id() {
        let json = serde_json::to_string(&Category::TecnologiasComputacionales).unwrap();
        assert_eq!(json, "\"tecnologias_computacionales\"");
    }

    #[test]
    fn test_unknown_category_is_invalid_query() {
        match "astronomia".parse::<Category>() {
            Err(SearchError::InvalidQuery { category, available }) => {
                assert_eq!(category, "astronomia");
                assert_eq!(available.len(), 13);
            }
            other => panic!("expected InvalidQuery, got {other:?}"),
        }
    }

    #[test]
    fn test_primary_keyword() {
        assert_eq!(Category::Mecanica.primary_keyword(), "ingeniero mecánico");
    }

    #[test]
    fn test_experience_parse_lenient() {
        assert_eq!(Experience::parse_lenient("practicas"), Experience::Internship);
        assert_eq!(Experience::parse_lenient("internship"), Experience::Internship);
        assert_eq!(Experience::parse_lenient("new-graduate"), Experience::NewGraduate);
        assert_eq!(Experience::parse_lenient("Ambos"), Experience::Both);
        assert_eq!(Experience::parse_lenient("senior"), Experience::Both);
    }

    #[test]
    fn test_search_query_defaults_location() {
        let query = SearchQuery::parse("civil", "   ", "ambos").unwrap();
        assert_eq!(query.location, DEFAULT_LOCATION);
        assert_eq!(query.category, Category::Civil);
        assert_eq!(query.experience, Experience::Both);
    }
}
