use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::AppointmentState;
use availability_cell::SchedulingContext;
use notification_cell::{BroadcastNotifier, LogMailer};
use shared_config::AppConfig;
use shared_database::{FixtureData, InMemoryStore, SchedulingStore, SupabaseStore, TimedStore};

/// Fixture mode is an explicit switch; a Supabase outage never falls back to it.
fn build_store(config: &AppConfig) -> Result<Arc<dyn SchedulingStore>, Box<dyn Error>> {
    let timeout = config.store_timeout();

    if config.fixture_mode {
        let data = match &config.fixture_path {
            Some(path) => {
                info!("Loading scheduling fixtures from {}", path);
                serde_json::from_str::<FixtureData>(&std::fs::read_to_string(path)?)?
            }
            None => {
                warn!("FIXTURE_MODE is set without FIXTURE_PATH; starting with an empty store");
                FixtureData::default()
            }
        };
        return Ok(Arc::new(TimedStore::new(InMemoryStore::from_fixture(data), timeout)));
    }

    if !config.is_configured() {
        return Err("Supabase is not configured; set SUPABASE_URL and keys or FIXTURE_MODE=true".into());
    }
    Ok(Arc::new(TimedStore::new(SupabaseStore::new(config), timeout)))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Slotwise scheduling API");

    let config = Arc::new(AppConfig::from_env());
    let store = build_store(&config)?;

    let scheduling = SchedulingContext::new(config.clone(), store);
    let appointments = AppointmentState::new(
        scheduling.clone(),
        Arc::new(BroadcastNotifier::new()),
        Arc::new(LogMailer::new()),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router::create_router(Arc::new(scheduling), Arc::new(appointments))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
