//! Answer payload types.

use serde::{Deserialize, Serialize};

/// Where an answer's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    KnowledgeBase,
    TrainingData,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KnowledgeBase => "knowledge_base",
            Self::TrainingData => "training_data",
        }
    }
}

impl std::fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response to a question.
///
/// `distance` and `matched_fact` are set exactly when the source is the
/// knowledge base. Build values through the constructors to keep that true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    /// Raw completion text
    pub answer: String,

    pub source: AnswerSource,

    /// Distance of the grounding fact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,

    /// Exact stored text the answer was grounded on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_fact: Option<String>,
}

impl AnswerResponse {
    pub fn from_knowledge_base(
        answer: impl Into<String>,
        matched_fact: impl Into<String>,
        distance: f32,
    ) -> Self {
        Self {
            answer: answer.into(),
            source: AnswerSource::KnowledgeBase,
            distance: Some(distance),
            matched_fact: Some(matched_fact.into()),
        }
    }

    pub fn from_training_data(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            source: AnswerSource::TrainingData,
            distance: None,
            matched_fact: None,
        }
    }
}
