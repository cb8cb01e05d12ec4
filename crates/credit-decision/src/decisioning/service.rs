use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::config::DecisioningConfig;

use super::attributes::ApplicantInput;
use super::engine::{DecisionEngine, EngineMode, HeuristicPolicy};
use super::mapper::{map_features, SchemaMismatch};
use super::model::{load_model, CreditModel, ModelStatus};
use super::outcome::DecisionOutcome;
use super::schema::{FeatureSchema, SchemaError};
use super::validation::{validate, ValidationError};

/// Request pipeline: validate, map, decide. Built once at start-up and shared
/// read-only across requests.
pub struct CreditDecisionService {
    schema: Arc<FeatureSchema>,
    engine: DecisionEngine,
    pairing_fault: Option<SchemaMismatch>,
}

impl CreditDecisionService {
    pub fn new(schema: Arc<FeatureSchema>, model: ModelStatus, policy: HeuristicPolicy) -> Self {
        Self::with_engine(schema, DecisionEngine::from_status(model, policy))
    }

    /// Load the configured schema and attempt the one-shot model load.
    ///
    /// A broken schema aborts start-up; a missing or unreadable model does not.
    pub fn from_config(config: &DecisioningConfig) -> Result<Self, SchemaError> {
        let schema = match &config.schema_path {
            Some(path) => FeatureSchema::from_path(path)?,
            None => FeatureSchema::builtin(&config.schema_revision)?,
        };
        info!(
            revision = schema.revision(),
            columns = ?schema.column_names(),
            "feature schema loaded"
        );

        let model = load_model(&config.model_path);
        Ok(Self::new(Arc::new(schema), model, config.heuristic_policy()))
    }

    pub fn with_engine(schema: Arc<FeatureSchema>, engine: DecisionEngine) -> Self {
        let pairing_fault = engine
            .model()
            .and_then(|model| check_pairing(&schema, model.as_ref()));

        if let Some(fault) = &pairing_fault {
            error!(
                target: "credit_decision::schema",
                error = %fault,
                "model and feature schema disagree; scored requests will be refused"
            );
        }

        Self {
            schema,
            engine,
            pairing_fault,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn pairing_fault(&self) -> Option<&SchemaMismatch> {
        self.pairing_fault.as_ref()
    }

    /// Run one request through the pipeline.
    ///
    /// Validation always runs first, so a client fault is reported even while the
    /// model and schema are mispaired.
    pub fn decide(&self, input: &ApplicantInput) -> Result<DecisionOutcome, DecisionError> {
        let attributes = validate(input, &self.schema).map_err(|err| {
            info!(
                kind = ?err.kind(),
                field = err.field(),
                revision = self.schema.revision(),
                "rejected applicant input"
            );
            err
        })?;

        if let Some(fault) = &self.pairing_fault {
            return Err(self.schema_fault(fault.clone()));
        }

        let features =
            map_features(&attributes, &self.schema).map_err(|fault| self.schema_fault(fault))?;

        let outcome = self.engine.decide(&attributes, &features);
        info!(
            source = outcome.source.label(),
            decision = outcome.kind.label(),
            raw_label = ?outcome.raw_label,
            schema_revision = %outcome.schema_revision,
            "credit decision issued"
        );
        Ok(outcome)
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            engine: self.engine.mode(),
            schema_revision: self.schema.revision().to_string(),
            columns: self.schema.column_names(),
            pairing_fault: self.pairing_fault.as_ref().map(ToString::to_string),
        }
    }

    fn schema_fault(&self, fault: SchemaMismatch) -> DecisionError {
        error!(
            target: "credit_decision::schema",
            error = %fault,
            revision = self.schema.revision(),
            "schema mismatch while building features"
        );
        DecisionError::SchemaMismatch(fault)
    }
}

fn check_pairing(schema: &FeatureSchema, model: &dyn CreditModel) -> Option<SchemaMismatch> {
    let conflict = |detail: String| SchemaMismatch::ModelConflict {
        schema_revision: schema.revision().to_string(),
        model_revision: model.revision().to_string(),
        detail,
    };

    if model.revision() != schema.revision() {
        return Some(conflict("revision tags differ".to_string()));
    }

    match model.expected_columns() {
        Some(expected) if expected != schema.column_names().as_slice() => Some(conflict(format!(
            "model expects columns [{}], schema produces [{}]",
            expected.join(", "),
            schema.column_names().join(", ")
        ))),
        _ => None,
    }
}

/// Failures that stop a request before a decision is made.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecisionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    SchemaMismatch(#[from] SchemaMismatch),
}

/// Operating snapshot for the model status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatus {
    pub engine: EngineMode,
    pub schema_revision: String,
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairing_fault: Option<String>,
}
