use std::sync::Arc;

use reqwest::Client;

use crate::config::AppConfig;
use feeltrack_infra::inference::EmotionModel;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub http_client: Client,
    pub model: Arc<dyn EmotionModel>,
}
