use std::time::Instant;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::chat::{answer_question, preview_chars};
use crate::errors::AppError;
use crate::models::Section;
use crate::roles::DEFAULT_ROLE;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: String,
    pub role: Option<String>,
    /// Prior turns from the client. Accepted for compatibility; answers are
    /// grounded on the résumé only, so history does not influence them.
    #[serde(default)]
    pub history: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub role: String,
    pub cached: bool,
    pub sections: Vec<Section>,
}

/// POST /chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let started = Instant::now();

    let question = req.question.trim();
    if question.is_empty() {
        warn!("Empty question received");
        return Err(AppError::Validation("Please provide your question.".to_string()));
    }

    let requested = req.role.as_deref().unwrap_or(DEFAULT_ROLE);
    let role = state.roles.resolve(requested);
    if role != requested {
        warn!(requested, resolved = %role, "Unknown role, using fallback");
    }
    if !req.history.is_empty() {
        debug!(turns = req.history.len(), "Ignoring chat history");
    }

    let outcome = answer_question(&state, question, &role).await;

    info!(
        question_preview = %preview_chars(question, 100),
        role = %role,
        latency_ms = started.elapsed().as_millis() as u64,
        cache_hit = outcome.cached,
        sections = ?outcome.sections,
        "Chat request"
    );

    Ok(Json(ChatResponse {
        answer: outcome.answer,
        role,
        cached: outcome.cached,
        sections: outcome.sections,
    }))
}
