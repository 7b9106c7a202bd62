use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::state::AppState;
use feeltrack_core::domain::emotion::{select_labels, EmotionPrediction, DEFAULT_THRESHOLD};
use feeltrack_core::domain::text::clean_text;
use feeltrack_infra::inference::{EmotionModel, InferenceError};

#[derive(Debug, Deserialize)]
pub struct BatchInput {
    pub texts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub results: Vec<EmotionPrediction>,
}

#[derive(Debug, Error)]
pub enum ClassifyApiError {
    #[error("empty text list")]
    EmptyBatch,
    #[error("too many texts (max {0})")]
    BatchTooLarge(usize),
    #[error("model failure: {0}")]
    Model(#[from] InferenceError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub async fn classify(
    State(state): State<AppState>,
    Json(payload): Json<BatchInput>,
) -> Result<Json<ClassifyResponse>, ClassifyApiError> {
    let response =
        classify_texts(state.model.as_ref(), &payload.texts, state.config.max_batch_size).await?;
    Ok(Json(response))
}

async fn classify_texts(
    model: &dyn EmotionModel,
    texts: &[String],
    max_batch_size: usize,
) -> Result<ClassifyResponse, ClassifyApiError> {
    if texts.is_empty() {
        return Err(ClassifyApiError::EmptyBatch);
    }
    if texts.len() > max_batch_size {
        return Err(ClassifyApiError::BatchTooLarge(max_batch_size));
    }
    let cleaned: Vec<String> = texts.iter().map(|text| clean_text(text)).collect();
    let scores = model.score(&cleaned).await?;
    let results: Vec<EmotionPrediction> = texts
        .iter()
        .zip(scores.iter())
        .map(|(text, row)| select_labels(text, row, DEFAULT_THRESHOLD))
        .collect();
    debug!(
        texts = texts.len(),
        labelled = results.iter().filter(|r| !r.predicted_labels.is_empty()).count(),
        "classified batch"
    );
    Ok(ClassifyResponse { results })
}

impl IntoResponse for ClassifyApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ClassifyApiError::EmptyBatch | ClassifyApiError::BatchTooLarge(_) => {
                StatusCode::BAD_REQUEST
            }
            ClassifyApiError::Model(_) => StatusCode::BAD_GATEWAY,
        };
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
