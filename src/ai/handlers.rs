use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{instrument, warn};

use crate::{error::AppError, extract::AppJson, state::AppState};

pub const PROMPT_PREFIX: &str = "You are a helpful assistant for a sensor monitoring system. \
     Given the following user question, generate a short natural language answer \
     without performing any real database queries. Question: ";

pub const FALLBACK_ANSWER: &str =
    "AI explanation is temporarily unavailable, but your question was received.";

pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ai-query", post(ai_query))
        .route("/api/ai-query-history/:username", get(ai_query_history))
}

#[derive(Debug, Deserialize)]
pub struct AiQueryRequest {
    pub question: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// No query is executed: `mongoQuery` and `result` are fixed placeholders.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiQueryResponse {
    pub question: String,
    pub mongo_query: Value,
    pub result: Vec<Value>,
    pub natural_answer: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<Value>,
}

/// Never fails because of the model; only an empty question is rejected.
pub async fn ask(state: &AppState, question: &str) -> Result<String, AppError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(AppError::BadRequest("Question is required".into()));
    }
    let prompt = format!("{PROMPT_PREFIX}{question}");
    match state.assistant.complete(&prompt).await {
        Ok(answer) => Ok(answer),
        Err(e) => {
            warn!(error = %e, "ai completion failed; using fallback answer");
            Ok(FALLBACK_ANSWER.to_string())
        }
    }
}

#[instrument(skip(state, payload), fields(username = payload.username.as_deref().unwrap_or("anonymous")))]
pub async fn ai_query(
    State(state): State<AppState>,
    AppJson(payload): AppJson<AiQueryRequest>,
) -> Result<Json<AiQueryResponse>, AppError> {
    let natural_answer = ask(&state, &payload.question).await?;
    Ok(Json(AiQueryResponse {
        question: payload.question.trim().to_string(),
        mongo_query: serde_json::json!({ "type": "info", "query": {} }),
        result: Vec::new(),
        natural_answer,
    }))
}

pub async fn ai_query_history(Path(_username): Path<String>) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        history: Vec::new(),
    })
}
