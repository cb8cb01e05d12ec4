use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::mapper::SchemaMismatch;
use super::outcome::{DecisionKind, DecisionOutcome, DecisionSource};
use super::service::DecisionError;
use super::validation::{ValidationError, ValidationKind};

/// Coarse classification monitoring keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Success,
    ClientError,
    ModelError,
    ServerError,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionBody {
    pub result: &'static str,
    pub status: StatusClass,
    pub decision: DecisionKind,
    pub source: DecisionSource,
    pub reason: String,
    pub raw_label: Option<i64>,
    pub score: Option<f64>,
    pub model_revision: Option<String>,
    pub schema_revision: String,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Malformed,
    Missing,
    OutOfRange,
    SchemaMismatch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub result: String,
    pub status: StatusClass,
    pub error: ErrorDetail,
}

/// User-facing payload paired with its HTTP status.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionResponse {
    Decided(StatusCode, DecisionBody),
    Failed(StatusCode, ErrorBody),
}

impl DecisionResponse {
    pub fn from_outcome(outcome: DecisionOutcome) -> Self {
        let (status, class) = match outcome.kind {
            DecisionKind::Approved | DecisionKind::Rejected | DecisionKind::ManualReview => {
                (StatusCode::OK, StatusClass::Success)
            }
            DecisionKind::ModelError => (StatusCode::SERVICE_UNAVAILABLE, StatusClass::ModelError),
        };

        DecisionResponse::Decided(
            status,
            DecisionBody {
                result: outcome.kind.result_text(),
                status: class,
                decision: outcome.kind,
                source: outcome.source,
                reason: outcome.reason,
                raw_label: outcome.raw_label,
                score: outcome.score,
                model_revision: outcome.model_revision,
                schema_revision: outcome.schema_revision,
                evaluated_at: outcome.evaluated_at,
            },
        )
    }

    pub fn from_error(error: &DecisionError) -> Self {
        match error {
            DecisionError::Validation(err) => Self::from_validation(err),
            DecisionError::SchemaMismatch(fault) => Self::from_schema_mismatch(fault),
        }
    }

    pub fn from_validation(err: &ValidationError) -> Self {
        let (status, kind) = match err.kind() {
            ValidationKind::Malformed => (StatusCode::BAD_REQUEST, ErrorKind::Malformed),
            ValidationKind::Missing => (StatusCode::BAD_REQUEST, ErrorKind::Missing),
            ValidationKind::OutOfRange => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorKind::OutOfRange)
            }
        };

        DecisionResponse::Failed(
            status,
            ErrorBody {
                result: format!("Invalid input: {err}"),
                status: StatusClass::ClientError,
                error: ErrorDetail {
                    kind,
                    field: Some(err.field().to_string()),
                    value: err.value(),
                    detail: err.to_string(),
                },
            },
        )
    }

    pub fn from_schema_mismatch(fault: &SchemaMismatch) -> Self {
        DecisionResponse::Failed(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody {
                result: "Credit decisioning is misconfigured; please try again later".to_string(),
                status: StatusClass::ServerError,
                error: ErrorDetail {
                    kind: ErrorKind::SchemaMismatch,
                    field: None,
                    value: None,
                    detail: fault.to_string(),
                },
            },
        )
    }

    /// The request body was not a JSON object at all.
    pub fn unreadable_body(detail: impl Into<String>) -> Self {
        Self::from_validation(&ValidationError::malformed("body", detail))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DecisionResponse::Decided(status, _) | DecisionResponse::Failed(status, _) => *status,
        }
    }

    pub fn status_class(&self) -> StatusClass {
        match self {
            DecisionResponse::Decided(_, body) => body.status,
            DecisionResponse::Failed(_, body) => body.status,
        }
    }

    pub fn result(&self) -> &str {
        match self {
            DecisionResponse::Decided(_, body) => body.result,
            DecisionResponse::Failed(_, body) => &body.result,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let value = match self {
            DecisionResponse::Decided(_, body) => serde_json::to_value(body),
            DecisionResponse::Failed(_, body) => serde_json::to_value(body),
        };
        value.unwrap_or_else(|err| serde_json::json!({ "result": err.to_string() }))
    }
}

impl From<Result<DecisionOutcome, DecisionError>> for DecisionResponse {
    fn from(result: Result<DecisionOutcome, DecisionError>) -> Self {
        match result {
            Ok(outcome) => Self::from_outcome(outcome),
            Err(err) => Self::from_error(&err),
        }
    }
}

impl IntoResponse for DecisionResponse {
    fn into_response(self) -> Response {
        match self {
            DecisionResponse::Decided(status, body) => (status, Json(body)).into_response(),
            DecisionResponse::Failed(status, body) => (status, Json(body)).into_response(),
        }
    }
}
