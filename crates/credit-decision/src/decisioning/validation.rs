use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::attributes::{ApplicantInput, Attribute, NumericPolicy, ValidatedAttributes};
use super::schema::FeatureSchema;

/// Client-side input faults, raised before any model is consulted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("field '{field}' is malformed: {detail}")]
    Malformed { field: String, detail: String },
    #[error("field '{field}' is required")]
    Missing { field: String },
    #[error("field '{field}' is out of range ({value}): {detail}")]
    OutOfRange {
        field: String,
        value: f64,
        detail: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    Malformed,
    Missing,
    OutOfRange,
}

impl ValidationError {
    pub fn kind(&self) -> ValidationKind {
        match self {
            ValidationError::Malformed { .. } => ValidationKind::Malformed,
            ValidationError::Missing { .. } => ValidationKind::Missing,
            ValidationError::OutOfRange { .. } => ValidationKind::OutOfRange,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            ValidationError::Malformed { field, .. }
            | ValidationError::Missing { field }
            | ValidationError::OutOfRange { field, .. } => field,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            ValidationError::OutOfRange { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub(crate) fn malformed(field: impl Into<String>, detail: impl Into<String>) -> Self {
        ValidationError::Malformed {
            field: field.into(),
            detail: detail.into(),
        }
    }
}

/// Parse and range-check every attribute the schema declares.
///
/// Columns are checked in schema order and the first fault wins. Keys the schema does
/// not declare are ignored.
pub fn validate(
    input: &ApplicantInput,
    schema: &FeatureSchema,
) -> Result<ValidatedAttributes, ValidationError> {
    let mut attributes = ValidatedAttributes::new(schema.revision());

    for column in schema.columns() {
        let attribute = column.attribute;
        match input.lookup(attribute) {
            Some((key, raw)) => {
                if let Some(value) = parse_value(key, raw, attribute)? {
                    check_range(key, value, attribute)?;
                    attributes.insert(attribute, value);
                } else if column.required {
                    return Err(ValidationError::Missing {
                        field: attribute.key().to_string(),
                    });
                }
            }
            None if column.required => {
                return Err(ValidationError::Missing {
                    field: attribute.key().to_string(),
                });
            }
            None => {}
        }
    }

    for key in input.keys() {
        if !is_declared_key(schema, key) {
            debug!(
                field = key,
                revision = schema.revision(),
                "ignoring undeclared field"
            );
        }
    }

    Ok(attributes)
}

/// `Ok(None)` means the field was sent but carries no value (`null` or blank text).
fn parse_value(
    key: &str,
    raw: &Value,
    attribute: Attribute,
) -> Result<Option<f64>, ValidationError> {
    let value = match raw {
        Value::Null => return Ok(None),
        Value::Number(number) => {
            let integer = number
                .as_i64()
                .map(i128::from)
                .or_else(|| number.as_u64().map(i128::from));
            let value = number
                .as_f64()
                .ok_or_else(|| ValidationError::malformed(key, "number is not representable"))?;
            exact_integer(key, integer, value)?
        }
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            let value = trimmed.parse::<f64>().map_err(|_| {
                ValidationError::malformed(key, format!("'{trimmed}' is not a number"))
            })?;
            exact_integer(key, trimmed.parse::<i128>().ok(), value)?
        }
        Value::Bool(_) => return Err(unexpected_type(key, "a boolean")),
        Value::Array(_) => return Err(unexpected_type(key, "a list")),
        Value::Object(_) => return Err(unexpected_type(key, "an object")),
    };

    if !value.is_finite() {
        return Err(ValidationError::malformed(key, "number must be finite"));
    }

    if attribute.policy() == NumericPolicy::WholeNumber && value.fract() != 0.0 {
        return Err(ValidationError::malformed(
            key,
            format!("{value} is not a whole number"),
        ));
    }

    Ok(Some(value))
}

/// Integers beyond f64's exact range would be silently rounded; refuse them instead.
fn exact_integer(
    key: &str,
    integer: Option<i128>,
    value: f64,
) -> Result<f64, ValidationError> {
    match integer {
        Some(integer) if value as i128 != integer => Err(ValidationError::malformed(
            key,
            format!("{integer} cannot be represented exactly"),
        )),
        _ => Ok(value),
    }
}

fn unexpected_type(key: &str, found: &str) -> ValidationError {
    ValidationError::malformed(key, format!("expected a number, got {found}"))
}

fn check_range(key: &str, value: f64, attribute: Attribute) -> Result<(), ValidationError> {
    let constraint = attribute.constraint();
    if constraint.admits(value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field: key.to_string(),
            value,
            detail: constraint.describe(),
        })
    }
}

fn is_declared_key(schema: &FeatureSchema, key: &str) -> bool {
    schema.columns().iter().any(|column| {
        column.attribute.key() == key || column.attribute.aliases().contains(&key)
    })
}
