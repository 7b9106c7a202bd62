use axum::Json;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use feeltrack_core::domain::emotion::{translated_distribution, TRAINING_DISTRIBUTION};

const DISTRIBUTION_NOTE: &str = "Counts are training examples per emotion; some emotions are under-represented.";

/// Label counts serialized as a JSON object, keeping the given order.
#[derive(Debug)]
pub struct LabelCounts(Vec<(&'static str, u32)>);

impl Serialize for LabelCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, count) in &self.0 {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub training_distribution_en: LabelCounts,
    pub training_distribution_es: LabelCounts,
    pub total_examples: u64,
    pub note: &'static str,
}

pub async fn label_statistics() -> Json<StatsResponse> {
    Json(build_stats())
}

fn build_stats() -> StatsResponse {
    let total_examples = TRAINING_DISTRIBUTION
        .iter()
        .map(|(_, count)| u64::from(*count))
        .sum();
    StatsResponse {
        training_distribution_en: LabelCounts(TRAINING_DISTRIBUTION.to_vec()),
        training_distribution_es: LabelCounts(translated_distribution()),
        total_examples,
        note: DISTRIBUTION_NOTE,
    }
}
