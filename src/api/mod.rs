pub mod commissions;
pub mod health;
pub mod postback;

use crate::db::Repository;
use crate::orchestration::PostbackPipeline;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub pipeline: PostbackPipeline,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, pipeline: PostbackPipeline) -> Self {
        Self { repo, pipeline }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route(
            "/webhook/:house_identifier/:event_type",
            get(postback::handle_postback),
        )
        .route("/v1/commissions", get(commissions::get_commissions))
        .layer(cors)
        .with_state(state)
}
