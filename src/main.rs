use anyhow::Result;
use axum::Router;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;

mod config;
mod error;
mod logging;
mod models;
mod routes;
mod services;

use models::Session;
use services::gemini::GeminiClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::load()?;

    // The AI client is optional: a missing or placeholder GEMINI_API_KEY
    // disables search and generation while file analysis keeps working.
    let ai = match &config.gemini_api_key {
        Some(key) => Some(GeminiClient::new(key.clone(), config.gemini_base_url.clone())),
        None => {
            tracing::warn!(
                "GEMINI_API_KEY not set or still the placeholder; AI features are disabled"
            );
            None
        }
    };

    // Build our application state
    let state = Arc::new(AppState::new(config, ai));

    // Build our application with a route
    let app = Router::new().merge(routes::router()).with_state(state);

    // Run it
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// Application state
pub struct AppState {
    pub config: config::Config,
    pub ai: Option<GeminiClient>,
    pub session: Mutex<Session>,
}

impl AppState {
    fn new(config: config::Config, ai: Option<GeminiClient>) -> Self {
        Self {
            config,
            ai,
            session: Mutex::new(Session::default()),
        }
    }
}
