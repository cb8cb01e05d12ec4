use super::common::*;
use serde_json::json;
use std::sync::Arc;

use crate::decisioning::engine::{
    decision_for_label, DecisionEngine, EngineMode, HeuristicPolicy, APPROVED_LABEL,
    DEFAULT_APPROVAL_CUTOFF, REJECTED_LABEL,
};
use crate::decisioning::mapper::{map_features, FeatureVector};
use crate::decisioning::model::ModelStatus;
use crate::decisioning::outcome::{DecisionKind, DecisionSource};
use crate::decisioning::validation::validate;

fn fixed(label: i64) -> DecisionEngine {
    DecisionEngine::with_model(Arc::new(FixedModel::new("loan-v2", label)))
}

fn decide_amount(engine: &DecisionEngine, amount: f64) -> DecisionKind {
    let schema = loan_schema();
    let attributes = validate(
        &input(json!({ "amount": amount, "rate": 5.0, "income": 30000 })),
        &schema,
    )
    .expect("valid");
    let vector = map_features(&attributes, &schema).expect("maps");
    engine.decide(&attributes, &vector).kind
}

#[test]
fn heuristic_flips_exactly_at_the_cutoff() {
    let engine = DecisionEngine::heuristic(HeuristicPolicy::default());
    let cutoff = DEFAULT_APPROVAL_CUTOFF;

    assert_eq!(decide_amount(&engine, cutoff - 1.0), DecisionKind::Approved);
    assert_eq!(decide_amount(&engine, cutoff), DecisionKind::ManualReview);
    assert_eq!(decide_amount(&engine, cutoff + 1.0), DecisionKind::ManualReview);
}

#[test]
fn heuristic_is_deterministic_for_equal_amounts() {
    let engine = DecisionEngine::heuristic(HeuristicPolicy::default());
    for amount in [1.0, 4200.0, 9999.0, 10000.0, 250000.0] {
        assert_eq!(decide_amount(&engine, amount), decide_amount(&engine, amount));
    }
}

#[test]
fn heuristic_honors_a_configured_cutoff() {
    let engine = DecisionEngine::heuristic(HeuristicPolicy::new(2500.0));
    assert_eq!(decide_amount(&engine, 2499.0), DecisionKind::Approved);
    assert_eq!(decide_amount(&engine, 2500.0), DecisionKind::ManualReview);
}

#[test]
fn invalid_cutoff_falls_back_to_default() {
    assert_eq!(
        HeuristicPolicy::new(f64::NAN).approval_cutoff(),
        DEFAULT_APPROVAL_CUTOFF
    );
    assert_eq!(
        HeuristicPolicy::new(-10.0).approval_cutoff(),
        DEFAULT_APPROVAL_CUTOFF
    );
}

#[test]
fn heuristic_without_amount_asks_for_review() {
    let schema = loan_schema();
    let attributes = crate::decisioning::attributes::ValidatedAttributes::new("loan-v2");
    let vector = FeatureVector::from_parts("loan-v2", schema.column_names(), vec![]);

    let engine = DecisionEngine::heuristic(HeuristicPolicy::default());
    let outcome = engine.decide(&attributes, &vector);

    assert_eq!(outcome.kind, DecisionKind::ManualReview);
    assert_eq!(outcome.source, DecisionSource::Heuristic);
}

#[test]
fn heuristic_outcomes_are_tagged_and_carry_no_model_signal() {
    let schema = loan_schema();
    let attributes = validate(
        &input(json!({ "amount": 5000, "rate": 10.0, "income": 40000 })),
        &schema,
    )
    .expect("valid");
    let vector = map_features(&attributes, &schema).expect("maps");

    let engine = DecisionEngine::heuristic(HeuristicPolicy::default());
    let outcome = engine.decide(&attributes, &vector);

    assert_eq!(outcome.source, DecisionSource::Heuristic);
    assert_eq!(outcome.raw_label, None);
    assert_eq!(outcome.model_revision, None);
    assert_eq!(outcome.schema_revision, "loan-v2");
}

#[test]
fn absent_model_selects_heuristic_branch_with_reason() {
    let engine = DecisionEngine::from_status(
        ModelStatus::absent("models/loan_model.json not found"),
        HeuristicPolicy::default(),
    );

    match engine.mode() {
        EngineMode::Heuristic {
            approval_cutoff,
            absence_reason,
        } => {
            assert_eq!(approval_cutoff, DEFAULT_APPROVAL_CUTOFF);
            assert!(absence_reason.contains("not found"));
        }
        other => panic!("expected heuristic mode, got {other:?}"),
    }
    assert!(engine.model().is_none());
}

#[test]
fn polarity_table_is_single_sourced() {
    assert_eq!(decision_for_label(APPROVED_LABEL), Some(DecisionKind::Approved));
    assert_eq!(decision_for_label(REJECTED_LABEL), Some(DecisionKind::Rejected));
    assert_eq!(decision_for_label(7), None);
}

#[test]
fn model_labels_map_through_polarity() {
    let approve = fixed(APPROVED_LABEL);
    let reject = fixed(REJECTED_LABEL);

    assert_eq!(decide_amount(&approve, 50000.0), DecisionKind::Approved);
    assert_eq!(decide_amount(&reject, 500.0), DecisionKind::Rejected);
}

#[test]
fn approved_text_is_identical_across_sources() {
    let schema = loan_schema();
    let attributes = validate(
        &input(json!({ "amount": 5000, "rate": 10.0, "income": 40000 })),
        &schema,
    )
    .expect("valid");
    let vector = map_features(&attributes, &schema).expect("maps");

    let from_model = fixed(APPROVED_LABEL).decide(&attributes, &vector);
    let from_rule =
        DecisionEngine::heuristic(HeuristicPolicy::default()).decide(&attributes, &vector);

    assert_eq!(from_model.source, DecisionSource::Model);
    assert_eq!(from_rule.source, DecisionSource::Heuristic);
    assert_eq!(from_model.kind, from_rule.kind);
    assert_eq!(from_model.result_text(), from_rule.result_text());
    assert_eq!(from_model.raw_label, Some(APPROVED_LABEL));
}

#[test]
fn unknown_label_becomes_model_error() {
    let engine = fixed(3);
    assert_eq!(decide_amount(&engine, 5000.0), DecisionKind::ModelError);
}

#[test]
fn inference_fault_becomes_model_error() {
    let schema = loan_schema();
    let engine = DecisionEngine::with_model(Arc::new(FixedWidthModel::new("loan-v2", 2)));
    let attributes = validate(
        &input(json!({ "amount": 5000, "rate": 10.0, "income": 40000 })),
        &schema,
    )
    .expect("valid");
    let vector = map_features(&attributes, &schema).expect("maps");

    let outcome = engine.decide(&attributes, &vector);

    assert!(outcome.is_model_error());
    assert_eq!(outcome.source, DecisionSource::Model);
    assert!(outcome.reason.contains("expected 2 feature columns, received 3"));
}

#[test]
fn panicking_model_becomes_model_error() {
    let engine = DecisionEngine::with_model(Arc::new(PanickingModel));
    let schema = loan_schema();
    let attributes = validate(
        &input(json!({ "amount": 5000, "rate": 10.0, "income": 40000 })),
        &schema,
    )
    .expect("valid");
    let vector = map_features(&attributes, &schema).expect("maps");

    let outcome = engine.decide(&attributes, &vector);

    assert_eq!(outcome.kind, DecisionKind::ModelError);
    assert!(outcome.reason.contains("tensor shape mismatch"));
}

#[test]
fn model_is_called_once_per_decision() {
    let model = Arc::new(FixedModel::new("loan-v2", APPROVED_LABEL));
    let engine = DecisionEngine::with_model(model.clone());

    decide_amount(&engine, 5000.0);

    assert_eq!(model.calls(), 1);
}
