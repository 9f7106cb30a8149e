//! HTTP API in front of the scraping engine.
//!
//! # Routes
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /api` | Service name, version and environment |
//! | `GET /api/scrape?career=&location=&experience=` | Run (or serve a cached) search |
//! | `GET /api/careers` | Career catalog with keywords and icon |
//! | `GET /api/stats` | Cache statistics and registered sources |
//! | `GET /api/health` | Liveness probe |
//!
//! Anything else is served from the static frontend directory.

use crate::engine::ScrapingEngine;
use crate::error::SearchError;
use crate::models::{Category, DEFAULT_LOCATION, Experience};
use crate::scrapers::SessionFactory;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::any::Any as PanicPayload;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared state of all handlers.
pub struct AppState<F: SessionFactory> {
    pub engine: Arc<ScrapingEngine<F>>,
    pub environment: String,
}

/// Query string of `/api/scrape`.
#[derive(Debug, Deserialize)]
pub struct ScrapeParams {
    career: Option<String>,
    location: Option<String>,
    experience: Option<String>,
}

/// Build the application router.
pub fn router<F>(state: Arc<AppState<F>>, static_dir: &str) -> Router
where
    F: SessionFactory + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/api", get(api_info::<F>))
        .route("/api/scrape", get(scrape::<F>))
        .route("/api/careers", get(careers))
        .route("/api/stats", get(stats::<F>))
        .route("/api/health", get(health))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Turn a panic inside a handler into a JSON 500 instead of a dropped
/// connection.
fn panic_response(payload: Box<dyn PanicPayload + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "Request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": format!("Error interno del servidor: {detail}") })),
    )
        .into_response()
}

async fn api_info<F: SessionFactory + 'static>(State(state): State<Arc<AppState<F>>>) -> Json<Value> {
    Json(json!({
        "name": "JobScout API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "online",
        "environment": state.environment,
    }))
}

async fn scrape<F: SessionFactory + 'static>(
    State(state): State<Arc<AppState<F>>>,
    Query(params): Query<ScrapeParams>,
) -> Response {
    let Some(career) = params.career.filter(|c| !c.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "El parámetro 'career' es requerido" })),
        )
            .into_response();
    };
    let location = params
        .location
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string());
    let experience = params
        .experience
        .unwrap_or_else(|| Experience::Both.id().to_string());

    match state.engine.search(&career, &location, &experience).await {
        Ok(jobs) => {
            info!(%career, total = jobs.len(), "Answered scrape request");
            Json(json!({
                "success": true,
                "query": {
                    "career": career,
                    "location": location,
                    "experience": experience,
                },
                "total": jobs.len(),
                "jobs": jobs,
            }))
            .into_response()
        }
        Err(SearchError::InvalidQuery { category, available }) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": format!("Carrera '{category}' no válida"),
                "available": available,
            })),
        )
            .into_response(),
        Err(e) => {
            error!(%career, error = %e, "Scrape request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn careers() -> Json<Value> {
    let catalog: Map<String, Value> = Category::ALL
        .iter()
        .map(|c| {
            (
                c.id().to_string(),
                json!({ "keywords": c.keywords(), "icon": c.icon() }),
            )
        })
        .collect();
    Json(Value::Object(catalog))
}

async fn stats<F: SessionFactory + 'static>(State(state): State<Arc<AppState<F>>>) -> Json<Value> {
    Json(json!({
        "cache": state.engine.cache_stats(),
        "sources": state.engine.source_ids(),
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Local::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResultCache;
    use crate::config::EngineConfig;
    use crate::error::{ExtractionError, SessionError};
    use crate::models::Listing;
    use crate::scrapers::SourceExtractor;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    struct NoopFactory {
        fail: bool,
    }

    #[async_trait]
    impl SessionFactory for NoopFactory {
        type Session = ();

        async fn open(&self) -> Result<(), SessionError> {
            if self.fail {
                Err(SessionError::Launch("chromium missing".into()))
            } else {
                Ok(())
            }
        }

        async fn close(&self, _session: ()) {}
    }

    struct OneJob;

    #[async_trait]
    impl SourceExtractor<()> for OneJob {
        fn id(&self) -> &str {
            "board"
        }

        async fn extract(
            &self,
            _session: &(),
            keyword: &str,
            location: &str,
            _experience: Experience,
        ) -> Result<Vec<Listing>, ExtractionError> {
            Ok(vec![Listing::new(keyword, "Acme", location, "https://board.test/1?x=1", "", "board")])
        }
    }

    struct Explodes;

    #[async_trait]
    impl SourceExtractor<()> for Explodes {
        fn id(&self) -> &str {
            "explodes"
        }

        async fn extract(
            &self,
            _session: &(),
            _keyword: &str,
            _location: &str,
            _experience: Experience,
        ) -> Result<Vec<Listing>, ExtractionError> {
            panic!("selector exploded")
        }
    }

    fn app(fail: bool) -> Router {
        app_with(fail, Box::new(OneJob))
    }

    fn app_with(fail: bool, source: Box<dyn SourceExtractor<()>>) -> Router {
        let config = EngineConfig {
            source_pause_min_ms: 0,
            source_pause_max_ms: 0,
            ..EngineConfig::default()
        };
        let engine = ScrapingEngine::new(
            NoopFactory { fail },
            vec![source],
            Arc::new(ResultCache::new(config.cache_ttl())),
            &config,
        );
        let state = Arc::new(AppState {
            engine: Arc::new(engine),
            environment: "test".to_string(),
        });
        router(state, "static")
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_scrape_success() {
        let (status, body) =
            get_json(app(false), "/api/scrape?career=mecanica&location=CDMX&experience=ambos").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["total"], 1);
        assert_eq!(body["query"]["career"], "mecanica");
        assert_eq!(body["jobs"][0]["title"], "ingeniero mecánico");
        assert_eq!(body["jobs"][0]["location"], "CDMX");
        assert_eq!(body["jobs"][0]["link"], "https://board.test/1");
    }

    #[tokio::test]
    async fn test_scrape_defaults() {
        let (status, body) = get_json(app(false), "/api/scrape?career=civil").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["query"]["location"], "México");
        assert_eq!(body["query"]["experience"], "ambos");
    }

    #[tokio::test]
    async fn test_scrape_requires_career() {
        let (status, body) = get_json(app(false), "/api/scrape").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("career"));
        assert!(body.get("available").is_none());
    }

    #[tokio::test]
    async fn test_scrape_unknown_career_lists_available() {
        let (status, body) = get_json(app(false), "/api/scrape?career=astronomia").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["available"].as_array().unwrap().len(), 13);
    }

    #[tokio::test]
    async fn test_scrape_session_failure_is_500() {
        let (status, body) = get_json(app(true), "/api/scrape?career=derecho").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("chromium missing"));
    }

    #[tokio::test]
    async fn test_scrape_panicking_source_is_500() {
        let (status, body) = get_json(app_with(false, Box::new(Explodes)), "/api/scrape?career=civil").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("selector exploded"));

        let (status, _) = get_json(app_with(false, Box::new(Explodes)), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_careers_catalog() {
        let (status, body) = get_json(app(false), "/api/careers").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_object().unwrap().len(), 13);
        assert_eq!(body["mecatronica"]["icon"], "🤖");
        assert_eq!(body["derecho"]["keywords"][0], "abogado");
    }

    #[tokio::test]
    async fn test_stats_reports_cache_and_sources() {
        let (_, body) = get_json(app(false), "/api/stats").await;
        assert_eq!(body["sources"], json!(["board"]));
        assert_eq!(body["cache"]["entries"], 0);
        assert_eq!(body["cache"]["hit_rate"], 0.0);
    }

    #[tokio::test]
    async fn test_health_and_info() {
        let (status, body) = get_json(app(false), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());

        let (_, body) = get_json(app(false), "/api").await;
        assert_eq!(body["name"], "JobScout API");
        assert_eq!(body["environment"], "test");
    }
}
