//! Gemini proxy handler

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};

use crate::error::ServiceResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub text: String,
    pub model: String,
}

/// POST /api/gemini
pub async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> ServiceResult<Json<GenerateResponse>> {
    let client = state
        .gemini
        .as_ref()
        .ok_or_else(|| AppError::new(ErrorCode::GeminiNotConfigured))?;

    if payload.prompt.trim().is_empty() {
        return Err(AppError::with_message(ErrorCode::RequiredField, "prompt is required")
            .with_detail("field", "prompt")
            .into());
    }

    let text = client.generate(&payload.prompt).await?;
    Ok(Json(GenerateResponse {
        text,
        model: client.model().to_string(),
    }))
}
