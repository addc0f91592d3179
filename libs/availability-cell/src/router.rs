use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::SchedulingContext;

pub fn availability_routes(state: Arc<SchedulingContext>) -> Router {
    let public_routes = Router::new()
        .route("/providers/{provider_id}/time-slots", get(handlers::get_time_slots))
        .route(
            "/providers/{provider_id}/available-slots-check",
            post(handlers::check_available_slots),
        )
        .route("/providers/{provider_id}/smart-time-slots", get(handlers::get_smart_time_slots))
        .route("/providers/{provider_id}/availability", get(handlers::get_provider_availability));

    let protected_routes = Router::new()
        .route("/availability/batch", post(handlers::replace_availability))
        .route("/blocked-slots", post(handlers::create_blocked_slot))
        .route("/blocked-slots/{block_id}", delete(handlers::delete_blocked_slot))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
