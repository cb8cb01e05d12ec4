//! Credit decisioning pipeline.
//!
//! Requests flow through four stages: the validator turns raw fields into typed
//! attributes, the mapper projects them onto the active schema's column layout, the
//! engine scores them with the loaded model (or the fallback rule when none loaded),
//! and the translator renders the outcome as a payload plus HTTP status.

pub mod attributes;
pub mod engine;
pub mod mapper;
pub mod model;
pub mod outcome;
pub mod router;
pub mod schema;
pub mod service;
pub mod translator;
pub mod validation;

#[cfg(test)]
mod tests;

pub use attributes::{ApplicantInput, Attribute, Constraint, NumericPolicy, ValidatedAttributes};
pub use engine::{
    decision_for_label, DecisionEngine, EngineMode, HeuristicPolicy, APPROVED_LABEL,
    DEFAULT_APPROVAL_CUTOFF, REJECTED_LABEL,
};
pub use mapper::{map_features, FeatureVector, SchemaMismatch};
pub use model::{
    load_model, CreditModel, InferenceError, LogisticModel, ModelArtifactError, ModelStatus,
    Prediction,
};
pub use outcome::{DecisionKind, DecisionOutcome, DecisionSource};
pub use router::credit_router;
pub use schema::{FeatureColumn, FeatureSchema, SchemaError, DEFAULT_SCHEMA_REVISION};
pub use service::{CreditDecisionService, DecisionError, ServiceStatus};
pub use translator::{DecisionResponse, StatusClass};
pub use validation::{validate, ValidationError, ValidationKind};
