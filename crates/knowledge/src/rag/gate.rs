//! Retrieval-confidence gate.
//!
//! Decides whether the best search candidate is close enough to the question
//! to ground the answer in stored knowledge.

use crate::types::SearchHit;

/// Best-match distances strictly below this ground the answer.
pub const DEFAULT_DISTANCE_THRESHOLD: f32 = 0.9;

/// The candidate selected by the gate.
#[derive(Debug, Clone, PartialEq)]
pub struct BestMatch {
    pub text: String,
    pub distance: f32,
}

/// Outcome of evaluating one search result list.
#[derive(Debug, Clone, PartialEq)]
pub struct GateDecision {
    /// True when a valid candidate lies strictly under the threshold
    pub has_kb_fact: bool,

    /// Minimum-distance valid candidate, if any
    pub best: Option<BestMatch>,
}

impl GateDecision {
    /// Distance of the best candidate, or infinity when there is none.
    pub fn best_distance(&self) -> f32 {
        self.best.as_ref().map_or(f32::INFINITY, |b| b.distance)
    }

    /// The fact to ground the answer on. `None` unless the gate passed.
    pub fn grounding(&self) -> Option<&BestMatch> {
        if self.has_kb_fact {
            self.best.as_ref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetrievalGate {
    threshold: f32,
}

impl Default for RetrievalGate {
    fn default() -> Self {
        Self::new(DEFAULT_DISTANCE_THRESHOLD)
    }
}

impl RetrievalGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Select the best valid candidate and decide whether it grounds the answer.
    ///
    /// Candidates need not be sorted. Empty or whitespace-only texts and
    /// non-finite distances are skipped. Among equal distances the first
    /// candidate wins.
    pub fn evaluate(&self, candidates: &[SearchHit]) -> GateDecision {
        let best = select_best(candidates).map(|hit| BestMatch {
            text: hit.text.clone(),
            distance: hit.distance,
        });
        let has_kb_fact = best
            .as_ref()
            .is_some_and(|b| b.distance < self.threshold);

        let decision = GateDecision { has_kb_fact, best };
        tracing::debug!(
            candidates = candidates.len(),
            best_distance = decision.best_distance(),
            threshold = self.threshold,
            has_kb_fact,
            "Retrieval gate decision"
        );
        decision
    }
}

/// First candidate with the minimum distance among valid candidates.
fn select_best(candidates: &[SearchHit]) -> Option<&SearchHit> {
    candidates
        .iter()
        .filter(|hit| !hit.text.trim().is_empty() && hit.distance.is_finite())
        .fold(None, |best: Option<&SearchHit>, hit| match best {
            Some(b) if b.distance <= hit.distance => Some(b),
            _ => Some(hit),
        })
}
