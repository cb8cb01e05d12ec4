use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::decisioning::attributes::ApplicantInput;
use crate::decisioning::engine::{DecisionEngine, HeuristicPolicy, DEFAULT_APPROVAL_CUTOFF};
use crate::decisioning::mapper::FeatureVector;
use crate::decisioning::model::{CreditModel, InferenceError, Prediction};
use crate::decisioning::schema::FeatureSchema;
use crate::decisioning::service::CreditDecisionService;

pub(super) fn loan_schema() -> Arc<FeatureSchema> {
    Arc::new(FeatureSchema::builtin("loan-v2").expect("loan-v2 schema"))
}

pub(super) fn credit_schema() -> Arc<FeatureSchema> {
    Arc::new(FeatureSchema::builtin("credit-v1").expect("credit-v1 schema"))
}

pub(super) fn schema_with_optional_age() -> Arc<FeatureSchema> {
    let raw = r#"{
        "revision": "loan-v3",
        "columns": [
            { "attribute": "amount", "column": "loan_amnt" },
            { "attribute": "income", "column": "person_income" },
            { "attribute": "age", "column": "person_age", "required": false, "default": 0.0 }
        ]
    }"#;
    Arc::new(FeatureSchema::from_reader(raw.as_bytes()).expect("loan-v3 schema"))
}

pub(super) fn input(value: Value) -> ApplicantInput {
    match value {
        Value::Object(fields) => ApplicantInput::from(fields),
        other => panic!("test input must be an object, got {other}"),
    }
}

pub(super) fn heuristic_service(schema: Arc<FeatureSchema>) -> CreditDecisionService {
    CreditDecisionService::with_engine(
        schema,
        DecisionEngine::heuristic(HeuristicPolicy::new(DEFAULT_APPROVAL_CUTOFF)),
    )
}

pub(super) fn model_service<M: CreditModel + 'static>(
    schema: Arc<FeatureSchema>,
    model: Arc<M>,
) -> CreditDecisionService {
    CreditDecisionService::with_engine(schema, DecisionEngine::with_model(model))
}

/// Returns a fixed label and counts how often it was asked.
pub(super) struct FixedModel {
    revision: String,
    label: i64,
    calls: AtomicUsize,
}

impl FixedModel {
    pub(super) fn new(revision: &str, label: i64) -> Self {
        Self {
            revision: revision.to_string(),
            label,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CreditModel for FixedModel {
    fn predict(&self, _features: &FeatureVector) -> Result<Prediction, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Prediction {
            label: self.label,
            score: Some(0.42),
        })
    }

    fn revision(&self) -> &str {
        &self.revision
    }
}

/// Trained on a fixed column count but records no column names, so drift only shows
/// up at inference time.
pub(super) struct FixedWidthModel {
    revision: String,
    width: usize,
}

impl FixedWidthModel {
    pub(super) fn new(revision: &str, width: usize) -> Self {
        Self {
            revision: revision.to_string(),
            width,
        }
    }
}

impl CreditModel for FixedWidthModel {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, InferenceError> {
        if features.len() != self.width {
            return Err(InferenceError::ColumnCount {
                expected: self.width,
                actual: features.len(),
            });
        }
        Ok(Prediction {
            label: 0,
            score: None,
        })
    }

    fn revision(&self) -> &str {
        &self.revision
    }
}

pub(super) struct PanickingModel;

impl CreditModel for PanickingModel {
    fn predict(&self, _features: &FeatureVector) -> Result<Prediction, InferenceError> {
        panic!("tensor shape mismatch")
    }

    fn revision(&self) -> &str {
        "loan-v2"
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
