use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Labels with a probability strictly above this value are reported.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// GoEmotions labels in model output order, paired with their Spanish translation.
pub const EMOTION_LABELS: [(&str, &str); 28] = [
    ("admiration", "admiración"),
    ("amusement", "diversión"),
    ("anger", "ira"),
    ("annoyance", "molestia"),
    ("approval", "aprobación"),
    ("caring", "cuidado"),
    ("confusion", "confusión"),
    ("curiosity", "curiosidad"),
    ("desire", "deseo"),
    ("disappointment", "decepción"),
    ("disapproval", "desaprobación"),
    ("disgust", "asco"),
    ("embarrassment", "vergüenza"),
    ("excitement", "emoción"),
    ("fear", "miedo"),
    ("gratitude", "gratitud"),
    ("grief", "duelo"),
    ("joy", "alegría"),
    ("love", "amor"),
    ("nervousness", "nerviosismo"),
    ("optimism", "optimismo"),
    ("pride", "orgullo"),
    ("realization", "reconocimiento"),
    ("relief", "alivio"),
    ("remorse", "arrepentimiento"),
    ("sadness", "tristeza"),
    ("surprise", "sorpresa"),
    ("neutral", "neutral"),
];

/// Number of training examples per label, most frequent first.
pub const TRAINING_DISTRIBUTION: [(&str, u32); 28] = [
    ("neutral", 31446),
    ("approval", 13235),
    ("annoyance", 10024),
    ("admiration", 9912),
    ("disapproval", 8399),
    ("realization", 7248),
    ("disappointment", 6656),
    ("curiosity", 6203),
    ("optimism", 6199),
    ("joy", 5688),
    ("anger", 5644),
    ("confusion", 5311),
    ("gratitude", 5288),
    ("amusement", 5180),
    ("sadness", 4667),
    ("love", 4347),
    ("excitement", 4335),
    ("caring", 4330),
    ("disgust", 4053),
    ("surprise", 3823),
    ("desire", 2838),
    ("fear", 2136),
    ("embarrassment", 2003),
    ("remorse", 1663),
    ("nervousness", 1556),
    ("pride", 1127),
    ("relief", 1085),
    ("grief", 558),
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionPrediction {
    pub input: String,
    pub predicted_labels: Vec<String>,
    pub translated_labels: Vec<String>,
    pub probabilities: LabelProbabilities,
}

/// Selected label probabilities, serialized as a JSON object in model label order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelProbabilities(Vec<(String, f64)>);

impl LabelProbabilities {
    pub fn get(&self, label: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, probability)| *probability)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for LabelProbabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, probability) in &self.0 {
            map.serialize_entry(label, probability)?;
        }
        map.end()
    }
}

pub fn translate(label: &str) -> &str {
    EMOTION_LABELS
        .iter()
        .find(|(english, _)| *english == label)
        .map(|(_, spanish)| *spanish)
        .unwrap_or(label)
}

fn label_index(label: &str) -> usize {
    EMOTION_LABELS
        .iter()
        .position(|(english, _)| *english == label)
        .unwrap_or(usize::MAX)
}

/// Keeps every label scoring above `threshold`, ordered as the model emits them.
pub fn select_labels(input: &str, scores: &[LabelScore], threshold: f32) -> EmotionPrediction {
    let mut selected: Vec<&LabelScore> = scores
        .iter()
        .filter(|score| score.score > threshold)
        .collect();
    selected.sort_by_key(|score| label_index(&score.label));

    let predicted_labels: Vec<String> = selected.iter().map(|score| score.label.clone()).collect();
    let translated_labels = predicted_labels
        .iter()
        .map(|label| translate(label).to_string())
        .collect();
    let probabilities = LabelProbabilities(
        selected
            .iter()
            .map(|score| (score.label.clone(), round4(score.score)))
            .collect(),
    );

    EmotionPrediction {
        input: input.to_string(),
        predicted_labels,
        translated_labels,
        probabilities,
    }
}

fn round4(value: f32) -> f64 {
    (f64::from(value) * 10_000.0).round() / 10_000.0
}

/// Training distribution keyed by the translated label.
pub fn translated_distribution() -> Vec<(&'static str, u32)> {
    TRAINING_DISTRIBUTION
        .iter()
        .map(|&(label, count)| (translate(label), count))
        .collect()
}
