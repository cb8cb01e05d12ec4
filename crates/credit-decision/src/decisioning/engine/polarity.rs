use crate::decisioning::outcome::DecisionKind;

/// Raw model label meaning "acceptable credit".
///
/// Models follow the loan-status convention: `1` marks a default (high risk), `0` a
/// loan that was repaid. Every artifact served by this crate must be trained with it.
pub const APPROVED_LABEL: i64 = 0;

/// Raw model label meaning "high risk".
pub const REJECTED_LABEL: i64 = 1;

/// Map a raw model label onto a decision. Unknown labels yield `None`.
pub fn decision_for_label(label: i64) -> Option<DecisionKind> {
    match label {
        APPROVED_LABEL => Some(DecisionKind::Approved),
        REJECTED_LABEL => Some(DecisionKind::Rejected),
        _ => None,
    }
}
