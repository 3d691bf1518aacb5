// Quest agent: quest generation over REST and chat, backed by Gemini.
mod agent;
mod error;

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
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use hq4l_agents::shared::chat::{
    handle_acknowledgement, handle_envelope, AcknowledgementEnvelope, ChatEnvelope, ChatExchange,
};
use hq4l_agents::shared::gemini::QuestModel;
use hq4l_agents::shared::quest::{QuestBatch, QuestInput, QuestRequest, QuestResponse, QuestSeed};

pub use agent::QuestAgent;
use error::{ApiError, ApiResult};

pub const SERVICE_NAME: &str = "quest-generator-api";

pub fn create_router(agent: Arc<QuestAgent>) -> Router {
    Router::new()
        .route("/quest", post(quest))
        .route("/quest/generate", post(quest_generate))
        .route("/generate-quest", post(generate_quest))
        .route("/chat", post(chat))
        .route("/chat/ack", post(chat_ack))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(agent)
}

async fn quest(
    State(agent): State<Arc<QuestAgent>>,
    Json(input): Json<QuestInput>,
) -> ApiResult<Json<QuestBatch>> {
    match agent.daily_quests(&input).await {
        Ok(batch) => Ok(Json(batch)),
        Err(e) => {
            error!("Error generating quests: {}", e);
            Err(e.into())
        }
    }
}

async fn quest_generate(
    State(agent): State<Arc<QuestAgent>>,
    Json(request): Json<QuestRequest>,
) -> ApiResult<Json<QuestResponse>> {
    if !request.is_generate() {
        return Err(ApiError::BadRequest(format!(
            "Unsupported action '{}', expected '{}'",
            request.action,
            QuestRequest::GENERATE
        )));
    }
    Ok(Json(agent.structured_quest().await?))
}

async fn generate_quest(
    State(agent): State<Arc<QuestAgent>>,
    body: Option<Json<QuestSeed>>,
) -> ApiResult<Json<Value>> {
    let seed = body.map(|Json(seed)| seed).unwrap_or_default();
    Ok(Json(agent.single_quest(&seed).await?))
}

async fn chat(
    State(agent): State<Arc<QuestAgent>>,
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

pub async fn run(model: Arc<dyn QuestModel>, addr: SocketAddr) -> Result<()> {
    info!("Starting Quest Generator API...");
    let app = create_router(Arc::new(QuestAgent::new(model)));

    info!("Binding to: {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Quest API ready at http://{}/quest", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("received shutdown signal; exiting");
        })
        .await?;
    Ok(())
}
