mod heuristic;
mod polarity;

pub use heuristic::{HeuristicPolicy, DEFAULT_APPROVAL_CUTOFF};
pub use polarity::{decision_for_label, APPROVED_LABEL, REJECTED_LABEL};

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use super::attributes::ValidatedAttributes;
use super::mapper::FeatureVector;
use super::model::{CreditModel, InferenceError, ModelStatus, Prediction};
use super::outcome::{DecisionKind, DecisionOutcome, DecisionSource};

/// Branch chosen once, when the engine is built.
#[derive(Clone)]
enum Branch {
    Model(Arc<dyn CreditModel>),
    Heuristic {
        policy: HeuristicPolicy,
        absence_reason: String,
    },
}

/// Turns a feature vector into a decision with exactly one inference attempt.
#[derive(Clone)]
pub struct DecisionEngine {
    branch: Branch,
}

/// Summary of the engine's operating mode for status endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EngineMode {
    Model {
        revision: String,
    },
    Heuristic {
        approval_cutoff: f64,
        absence_reason: String,
    },
}

impl DecisionEngine {
    pub fn from_status(status: ModelStatus, policy: HeuristicPolicy) -> Self {
        let branch = match status {
            ModelStatus::Present(model) => Branch::Model(model),
            ModelStatus::Absent { reason } => Branch::Heuristic {
                policy,
                absence_reason: reason,
            },
        };
        Self { branch }
    }

    pub fn with_model(model: Arc<dyn CreditModel>) -> Self {
        Self {
            branch: Branch::Model(model),
        }
    }

    pub fn heuristic(policy: HeuristicPolicy) -> Self {
        Self {
            branch: Branch::Heuristic {
                policy,
                absence_reason: "no model configured".to_string(),
            },
        }
    }

    pub fn model(&self) -> Option<&Arc<dyn CreditModel>> {
        match &self.branch {
            Branch::Model(model) => Some(model),
            Branch::Heuristic { .. } => None,
        }
    }

    pub fn mode(&self) -> EngineMode {
        match &self.branch {
            Branch::Model(model) => EngineMode::Model {
                revision: model.revision().to_string(),
            },
            Branch::Heuristic {
                policy,
                absence_reason,
            } => EngineMode::Heuristic {
                approval_cutoff: policy.approval_cutoff(),
                absence_reason: absence_reason.clone(),
            },
        }
    }

    /// Never fails: inference faults come back as `ModelError` outcomes.
    pub fn decide(
        &self,
        attributes: &ValidatedAttributes,
        features: &FeatureVector,
    ) -> DecisionOutcome {
        match &self.branch {
            Branch::Model(model) => self.decide_with_model(model.as_ref(), features),
            Branch::Heuristic { policy, .. } => {
                let (kind, reason) = policy.evaluate(attributes);
                DecisionOutcome {
                    kind,
                    source: DecisionSource::Heuristic,
                    raw_label: None,
                    score: None,
                    reason,
                    model_revision: None,
                    schema_revision: features.schema_revision().to_string(),
                    evaluated_at: Utc::now(),
                }
            }
        }
    }

    fn decide_with_model(
        &self,
        model: &dyn CreditModel,
        features: &FeatureVector,
    ) -> DecisionOutcome {
        let revision = model.revision().to_string();
        let outcome = |kind, prediction: Option<Prediction>, reason: String| DecisionOutcome {
            kind,
            source: DecisionSource::Model,
            raw_label: prediction.map(|p| p.label),
            score: prediction.and_then(|p| p.score),
            reason,
            model_revision: Some(revision.clone()),
            schema_revision: features.schema_revision().to_string(),
            evaluated_at: Utc::now(),
        };

        match guarded_predict(model, features) {
            Ok(prediction) => match decision_for_label(prediction.label) {
                Some(kind) => outcome(
                    kind,
                    Some(prediction),
                    format!(
                        "model {} returned label {}",
                        model.revision(),
                        prediction.label
                    ),
                ),
                None => {
                    warn!(
                        model_revision = model.revision(),
                        label = prediction.label,
                        "model returned an unrecognized label"
                    );
                    outcome(
                        DecisionKind::ModelError,
                        Some(prediction),
                        format!("unrecognized model label {}", prediction.label),
                    )
                }
            },
            Err(err) => {
                warn!(
                    model_revision = model.revision(),
                    schema_revision = features.schema_revision(),
                    columns = features.len(),
                    error = %err,
                    "model inference failed"
                );
                outcome(DecisionKind::ModelError, None, err.to_string())
            }
        }
    }
}

fn guarded_predict(
    model: &dyn CreditModel,
    features: &FeatureVector,
) -> Result<Prediction, InferenceError> {
    panic::catch_unwind(AssertUnwindSafe(|| model.predict(features))).unwrap_or_else(|payload| {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|message| message.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "model panicked".to_string());
        Err(InferenceError::Internal(detail))
    })
}
