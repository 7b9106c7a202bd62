use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use feeltrack_core::domain::emotion::LabelScore;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A multilabel emotion classifier returning one independent probability per label.
#[async_trait]
pub trait EmotionModel: Send + Sync {
    fn name(&self) -> &str;

    async fn score(&self, texts: &[String]) -> Result<Vec<Vec<LabelScore>>, InferenceError>;
}

/// Client for a hosted text-classification endpoint (Hugging Face inference API shape).
#[derive(Debug, Clone)]
pub struct HubInferenceClient {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    model_name: String,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a [String],
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    function_to_apply: &'static str,
    top_k: Option<usize>,
}

impl HubInferenceClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: String,
        token: Option<String>,
        model_name: String,
    ) -> Self {
        Self {
            http,
            endpoint,
            token,
            model_name,
        }
    }
}

#[async_trait]
impl EmotionModel for HubInferenceClient {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn score(&self, texts: &[String]) -> Result<Vec<Vec<LabelScore>>, InferenceError> {
        let body = InferenceRequest {
            inputs: texts,
            parameters: InferenceParameters {
                function_to_apply: "sigmoid",
                top_k: None,
            },
        };
        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(token) = self.token.as_deref() {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let payload: Value = request.send().await?.error_for_status()?.json().await?;
        parse_scores(payload, texts.len())
    }
}

fn parse_scores(payload: Value, expected: usize) -> Result<Vec<Vec<LabelScore>>, InferenceError> {
    if let Some(message) = payload.get("error").and_then(Value::as_str) {
        return Err(InferenceError::InvalidResponse(message.to_string()));
    }
    // A single input may come back as a flat list of scores.
    let flat_single = expected == 1
        && payload
            .as_array()
            .and_then(|items| items.first())
            .is_some_and(Value::is_object);
    let nested = if flat_single {
        Value::Array(vec![payload])
    } else {
        payload
    };
    let scores: Vec<Vec<LabelScore>> = serde_json::from_value(nested)
        .map_err(|err| InferenceError::InvalidResponse(err.to_string()))?;
    if scores.len() != expected {
        return Err(InferenceError::InvalidResponse(format!(
            "expected {expected} score rows, got {}",
            scores.len()
        )));
    }
    Ok(scores)
}
