use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

use super::attributes::ApplicantInput;
use super::service::CreditDecisionService;
use super::translator::DecisionResponse;

/// Router builder exposing the decision and model status endpoints.
pub fn credit_router(service: Arc<CreditDecisionService>) -> Router {
    Router::new()
        .route("/predict_credit", post(decision_handler))
        .route("/api/v1/credit/decisions", post(decision_handler))
        .route("/api/v1/credit/model", get(model_status_handler))
        .with_state(service)
}

pub(crate) async fn decision_handler(
    State(service): State<Arc<CreditDecisionService>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let input = match payload {
        Ok(Json(Value::Object(fields))) => ApplicantInput::from(fields),
        Ok(Json(_)) => {
            return DecisionResponse::unreadable_body("expected a JSON object").into_response()
        }
        Err(rejection) => {
            return DecisionResponse::unreadable_body(rejection.body_text()).into_response()
        }
    };

    DecisionResponse::from(service.decide(&input)).into_response()
}

pub(crate) async fn model_status_handler(
    State(service): State<Arc<CreditDecisionService>>,
) -> Response {
    (StatusCode::OK, Json(service.status())).into_response()
}
