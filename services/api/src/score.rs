use crate::infra::parse_field;
use clap::Args;
use credit_decision::config::{AppConfig, DecisioningConfig};
use credit_decision::decisioning::{
    ApplicantInput, CreditDecisionService, DecisionResponse, EngineMode, FeatureSchema,
};
use credit_decision::error::AppError;
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct ScoreArgs {
    /// JSON file holding the applicant fields
    #[arg(long)]
    pub(crate) input: Option<PathBuf>,
    /// Individual applicant field as key=value (repeatable, overrides --input)
    #[arg(long = "field", value_parser = parse_field)]
    pub(crate) fields: Vec<(String, Value)>,
    /// Model artifact to load instead of the configured one
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
    /// Feature schema file to use instead of the configured one
    #[arg(long)]
    pub(crate) schema: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SchemaArgs {
    /// Feature schema file to print instead of the configured one
    #[arg(long)]
    pub(crate) schema: Option<PathBuf>,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        input,
        fields,
        model,
        schema,
    } = args;

    let mut config = AppConfig::load()?.decisioning;
    if let Some(path) = model {
        config.model_path = path;
    }
    if schema.is_some() {
        config.schema_path = schema;
    }

    let mut payload = match input {
        Some(path) => read_input(path)?,
        None => Map::new(),
    };
    payload.extend(fields);
    if payload.is_empty() {
        return Err(AppError::Input(
            "provide --input FILE or at least one --field key=value".to_string(),
        ));
    }

    let service = CreditDecisionService::from_config(&config)?;
    println!("Credit decision");
    match service.engine().mode() {
        EngineMode::Model { revision } => println!("Decision mode: model ({revision})"),
        EngineMode::Heuristic {
            approval_cutoff,
            absence_reason,
        } => println!(
            "Decision mode: heuristic fallback (cutoff {approval_cutoff}; {absence_reason})"
        ),
    }
    println!("Schema revision: {}", service.schema().revision());

    let result = service.decide(&ApplicantInput::from(payload));
    let response = DecisionResponse::from(result.clone());
    println!("HTTP status: {}", response.status_code());
    match serde_json::to_string_pretty(&response.to_json()) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("Response payload unavailable: {err}"),
    }

    result.map(|_| ()).map_err(AppError::from)
}

pub(crate) fn run_schema(args: SchemaArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?.decisioning;
    if args.schema.is_some() {
        config.schema_path = args.schema;
    }

    let schema = load_schema(&config)?;
    match serde_json::to_string_pretty(&schema) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("Schema unavailable: {err}"),
    }

    let builtin: Vec<&str> = FeatureSchema::builtin_revisions().collect();
    println!("Built-in revisions: {}", builtin.join(", "));
    Ok(())
}

fn load_schema(config: &DecisioningConfig) -> Result<FeatureSchema, AppError> {
    let schema = match &config.schema_path {
        Some(path) => FeatureSchema::from_path(path)?,
        None => FeatureSchema::builtin(&config.schema_revision)?,
    };
    Ok(schema)
}

fn read_input(path: PathBuf) -> Result<Map<String, Value>, AppError> {
    let raw = fs::read_to_string(&path)?;
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(AppError::Input(format!(
            "{} must contain a JSON object",
            path.display()
        ))),
        Err(err) => Err(AppError::Input(format!("{}: {err}", path.display()))),
    }
}
