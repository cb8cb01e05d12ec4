use chrono::{DateTime, Utc};
use serde::Serialize;

/// Decision categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Approved,
    Rejected,
    ManualReview,
    ModelError,
}

impl DecisionKind {
    /// The only place outcome wording lives; both decision sources render through it.
    pub fn result_text(self) -> &'static str {
        match self {
            DecisionKind::Approved => "Approved (acceptable credit)",
            DecisionKind::Rejected => "Rejected (high risk)",
            DecisionKind::ManualReview => "Manual review required",
            DecisionKind::ModelError => "Model could not score this application",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DecisionKind::Approved => "approved",
            DecisionKind::Rejected => "rejected",
            DecisionKind::ManualReview => "manual_review",
            DecisionKind::ModelError => "model_error",
        }
    }
}

/// Which branch of the engine produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Model,
    Heuristic,
}

impl DecisionSource {
    pub fn label(self) -> &'static str {
        match self {
            DecisionSource::Model => "model",
            DecisionSource::Heuristic => "heuristic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionOutcome {
    pub kind: DecisionKind,
    pub source: DecisionSource,
    pub raw_label: Option<i64>,
    pub score: Option<f64>,
    pub reason: String,
    pub model_revision: Option<String>,
    pub schema_revision: String,
    pub evaluated_at: DateTime<Utc>,
}

impl DecisionOutcome {
    pub fn result_text(&self) -> &'static str {
        self.kind.result_text()
    }

    pub fn is_model_error(&self) -> bool {
        self.kind == DecisionKind::ModelError
    }
}
