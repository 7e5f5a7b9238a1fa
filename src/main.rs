//! Mealsmith - budget-aware meal planning backend.
//!
//! # Configuration
//!
//! Everything comes from environment variables, with development-friendly
//! defaults:
//!
//! - `MEALSMITH_PORT` - HTTP port (default: 3000)
//! - `MEALSMITH_DATABASE_URL` - SQLite connection string
//! - `MEALSMITH_AUTH_URL` - hosted auth service; unset means the bearer
//!   token is used as the user id (development only)
//! - `MEALSMITH_PLANNER_URL` - hosted plan generator; unset disables
//!   `POST /plans/generate`
//! - `MEALSMITH_TRANSLATOR_URL` / `MEALSMITH_TRANSLATOR_API_KEY` - LLM
//!   translation endpoint; unset means plans are served in English

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use mealsmith::api::{AppState, router};
use mealsmith::auth::AuthClient;
use mealsmith::planner::PlannerClient;
use mealsmith::storage::Storage;
use mealsmith::translation::{TranslationCache, TranslationClient};

/// Default port if not specified via environment variable.
const DEFAULT_PORT: u16 = 3000;

/// Default database path if not specified via environment variable.
const DEFAULT_DB_PATH: &str = "sqlite:mealsmith.db?mode=rwc";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("mealsmith=info".parse()?))
        .init();

    // Load configuration from environment
    let port: u16 = env::var("MEALSMITH_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let db_url = env::var("MEALSMITH_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

    info!(port, db_url = %db_url, "Starting Mealsmith server");

    // Initialize storage
    let storage = Storage::new(&db_url).await?;
    info!("Database initialized");

    // External collaborators: each one is optional and degrades per api.rs.
    let auth = match env::var("MEALSMITH_AUTH_URL") {
        Ok(url) => Some(AuthClient::new(&url)),
        Err(_) => {
            warn!("MEALSMITH_AUTH_URL not set; treating bearer tokens as user ids");
            None
        }
    };
    let planner = env::var("MEALSMITH_PLANNER_URL")
        .ok()
        .map(|url| PlannerClient::new(&url));
    if planner.is_none() {
        warn!("MEALSMITH_PLANNER_URL not set; plan generation is disabled");
    }
    let translator = env::var("MEALSMITH_TRANSLATOR_URL")
        .ok()
        .map(|url| TranslationClient::new(&url, env::var("MEALSMITH_TRANSLATOR_API_KEY").ok()));
    if translator.is_none() {
        warn!("MEALSMITH_TRANSLATOR_URL not set; content is served untranslated");
    }

    // Create application state
    let state = AppState {
        storage,
        auth,
        planner,
        translator,
        translation_cache: Arc::new(TranslationCache::new()),
    };

    // Build router
    let app = router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Mealsmith is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
