//! Pre-trained predictors and the one-shot start-up load.

mod logistic;

pub use logistic::{LogisticModel, ModelArtifactError, StandardScaler};

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::mapper::FeatureVector;

/// Raw output of one inference call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub label: i64,
    /// Model confidence for the high-risk class, when the model exposes one.
    pub score: Option<f64>,
}

/// Read-only predictor shared across requests.
pub trait CreditModel: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, InferenceError>;

    /// Revision tag the model was trained against.
    fn revision(&self) -> &str;

    /// Column layout the model was trained with, if it records one.
    fn expected_columns(&self) -> Option<&[String]> {
        None
    }
}

/// Per-request inference fault.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("expected {expected} feature columns, received {actual}")]
    ColumnCount { expected: usize, actual: usize },
    #[error("feature column '{column}' is not a finite number")]
    NonFinite { column: String },
    #[error("model failure: {0}")]
    Internal(String),
}

/// Outcome of the start-up model load.
#[derive(Clone)]
pub enum ModelStatus {
    Present(Arc<dyn CreditModel>),
    Absent { reason: String },
}

impl ModelStatus {
    pub fn present<M: CreditModel + 'static>(model: M) -> Self {
        ModelStatus::Present(Arc::new(model))
    }

    pub fn absent(reason: impl Into<String>) -> Self {
        ModelStatus::Absent {
            reason: reason.into(),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, ModelStatus::Present(_))
    }
}

impl fmt::Debug for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelStatus::Present(model) => f
                .debug_struct("Present")
                .field("revision", &model.revision())
                .finish(),
            ModelStatus::Absent { reason } => {
                f.debug_struct("Absent").field("reason", reason).finish()
            }
        }
    }
}

/// Attempt to load the model artifact once. Every failure resolves to `Absent`.
pub fn load_model(path: impl AsRef<Path>) -> ModelStatus {
    let path = path.as_ref();
    match LogisticModel::from_path(path) {
        Ok(model) => {
            info!(
                path = %path.display(),
                revision = model.revision(),
                columns = model.columns().len(),
                "credit model loaded"
            );
            ModelStatus::present(model)
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "credit model unavailable; heuristic fallback active"
            );
            ModelStatus::absent(err.to_string())
        }
    }
}
