use serde::Serialize;

use crate::decisioning::attributes::{Attribute, ValidatedAttributes};
use crate::decisioning::outcome::DecisionKind;

/// Requested amounts strictly below this are approved when no model is loaded.
pub const DEFAULT_APPROVAL_CUTOFF: f64 = 10_000.0;

/// Deterministic stand-in used while no trained model is available.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeuristicPolicy {
    approval_cutoff: f64,
}

impl HeuristicPolicy {
    pub fn new(approval_cutoff: f64) -> Self {
        let approval_cutoff = if approval_cutoff.is_finite() && approval_cutoff > 0.0 {
            approval_cutoff
        } else {
            DEFAULT_APPROVAL_CUTOFF
        };
        Self { approval_cutoff }
    }

    pub fn approval_cutoff(&self) -> f64 {
        self.approval_cutoff
    }

    pub(crate) fn evaluate(&self, attributes: &ValidatedAttributes) -> (DecisionKind, String) {
        match attributes.get(Attribute::Amount) {
            Some(amount) if amount < self.approval_cutoff => (
                DecisionKind::Approved,
                format!(
                    "requested amount {amount} is below the {} fallback cutoff",
                    self.approval_cutoff
                ),
            ),
            Some(amount) => (
                DecisionKind::ManualReview,
                format!(
                    "requested amount {amount} is at or above the {} fallback cutoff",
                    self.approval_cutoff
                ),
            ),
            None => (
                DecisionKind::ManualReview,
                "no requested amount to apply the fallback rule to".to_string(),
            ),
        }
    }
}

impl Default for HeuristicPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_APPROVAL_CUTOFF)
    }
}
