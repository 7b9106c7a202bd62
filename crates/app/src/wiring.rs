use std::sync::Arc;

use reqwest::Client;
use thiserror::Error;

use crate::config::AppConfig;
use crate::state::AppState;
use feeltrack_infra::inference::HubInferenceClient;

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub fn build_state(config: AppConfig) -> Result<AppState, WiringError> {
    let client = Client::builder().timeout(config.request_timeout).build()?;
    let model = HubInferenceClient::new(
        client.clone(),
        config.model_endpoint.clone(),
        config.model_token.clone(),
        config.model_name.clone(),
    );
    Ok(AppState {
        config: Arc::new(config),
        http_client: client,
        model: Arc::new(model),
    })
}
