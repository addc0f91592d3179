use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use appointment_cell::AppointmentState;
use availability_cell::router::availability_routes;
use availability_cell::SchedulingContext;
use provider_cell::router::provider_routes;

pub fn create_router(scheduling: Arc<SchedulingContext>, appointments: Arc<AppointmentState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Slotwise scheduling API is running!" }))
        .merge(availability_routes(scheduling.clone()))
        .merge(provider_routes(scheduling))
        .merge(appointment_routes(appointments))
}
