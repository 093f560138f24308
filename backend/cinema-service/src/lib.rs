pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod search;
pub mod services;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{ModerationSettings, SearchSettings};
use crate::db::{CatalogStore, ModerationStore};
use crate::search::SearchService;
use crate::services::{ModerationService, ReportService, ReviewService};

#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchService>,
    pub reviews: Arc<ReviewService>,
    pub reports: Arc<ReportService>,
    pub moderation: Arc<ModerationService>,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        moderation: Arc<dyn ModerationStore>,
        search_settings: SearchSettings,
        moderation_settings: ModerationSettings,
        jwt_secret: &str,
    ) -> Self {
        Self {
            search: Arc::new(SearchService::new(catalog.clone(), search_settings)),
            reviews: Arc::new(ReviewService::new(catalog)),
            reports: Arc::new(ReportService::new(moderation.clone())),
            moderation: Arc::new(ModerationService::new(moderation, moderation_settings)),
            jwt_secret: Arc::from(jwt_secret),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .nest("/api/v1", api::routes())
        .layer(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics_endpoint() -> String {
    metrics::render()
}
