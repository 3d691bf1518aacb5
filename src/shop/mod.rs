// Shop agent: answers chat with the canister's skin catalog.
mod agent;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use hq4l_agents::shared::canister::{CatalogSource, DfxCatalogSource};
use hq4l_agents::shared::chat::{
    handle_acknowledgement, handle_envelope, AcknowledgementEnvelope, ChatEnvelope, ChatExchange,
};
use hq4l_agents::shared::config::CanisterConfig;

pub use agent::ShopAgent;

pub const SERVICE_NAME: &str = "hq4l-shop";

pub fn create_router(agent: Arc<ShopAgent>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/ack", post(chat_ack))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(agent)
}

async fn chat(
    State(agent): State<Arc<ShopAgent>>,
    Json(envelope): Json<ChatEnvelope>,
) -> Json<ChatExchange> {
    Json(handle_envelope(agent.as_ref(), envelope).await)
}

async fn chat_ack(Json(envelope): Json<AcknowledgementEnvelope>) -> StatusCode {
    handle_acknowledgement(&envelope);
    StatusCode::ACCEPTED
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": SERVICE_NAME}))
}

pub async fn run(config: CanisterConfig, addr: SocketAddr) -> Result<()> {
    let source = DfxCatalogSource::new(&config);
    info!("Starting HQ4L Shop Agent...");
    info!("   - Canister ID: {}", config.canister_id);
    info!("   - Shop query: {}", source.manual_command());

    let agent = Arc::new(ShopAgent::new(Arc::new(source)));
    let app = create_router(agent);

    info!("Binding to: {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Shop agent ready at http://{}/chat", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("received shutdown signal; exiting");
        })
        .await?;
    Ok(())
}
