//! Parley Gateway server binary.

use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use clap::Parser;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use parley_gateway::config::ServerConfig;
use parley_gateway::routes;
use parley_gateway::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "parley-gateway", version, about = "Voice-agent LLM gateway")]
struct Cli {
    /// Override the PORT environment variable
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = ServerConfig::from_env().context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    let address = config.address();
    let cors = build_cors(&config);
    let state = AppState::new(config).context("Failed to build application state")?;

    let mut app = routes::create_app(state);
    if let Some(cors) = cors {
        app = app.layer(cors);
    }

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!(%address, "Parley Gateway listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// CORS layer from configuration. Absent configuration means no CORS
/// headers; the WebSocket endpoint does not need them.
fn build_cors(config: &ServerConfig) -> Option<CorsLayer> {
    let origins = config.cors_allowed_origins.as_deref()?;

    if origins.trim() == "*" {
        return Some(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let parsed: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = o, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(parsed))
            .allow_methods(Any)
            .allow_headers(Any),
    )
}
