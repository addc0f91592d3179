use std::sync::Arc;

use axum::{routing::get, Router};

use availability_cell::SchedulingContext;

use crate::handlers;

pub fn provider_routes(state: Arc<SchedulingContext>) -> Router {
    Router::new()
        .route("/providers/search", get(handlers::search_providers))
        .route("/providers/recommend", get(handlers::recommend_providers))
        .with_state(state)
}
