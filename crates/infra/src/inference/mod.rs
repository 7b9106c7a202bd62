pub mod hub;

pub use hub::{EmotionModel, HubInferenceClient, InferenceError};
