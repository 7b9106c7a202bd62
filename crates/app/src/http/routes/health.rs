use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;
use feeltrack_core::domain::emotion::{DEFAULT_THRESHOLD, EMOTION_LABELS};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub model: ModelStatus,
}

#[derive(Debug, Serialize)]
pub struct ModelStatus {
    pub name: String,
    pub labels: usize,
    pub threshold: f32,
    pub max_batch_size: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "emotion classification api ready",
        model: ModelStatus {
            name: state.model.name().to_string(),
            labels: EMOTION_LABELS.len(),
            threshold: DEFAULT_THRESHOLD,
            max_batch_size: state.config.max_batch_size,
        },
    })
}
