//! Retrieval-augmented answering.
//!
//! Search, gate, prompt and complete: one question in, one `AnswerResponse` out.

pub mod ask;
pub mod gate;
pub mod types;

pub use ask::{AnswerComposer, AnswerPrompts};
pub use gate::{BestMatch, GateDecision, RetrievalGate, DEFAULT_DISTANCE_THRESHOLD};
pub use types::{AnswerResponse, AnswerSource};
