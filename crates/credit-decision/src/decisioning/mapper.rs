use serde::Serialize;

use super::attributes::{Attribute, ValidatedAttributes};
use super::schema::FeatureSchema;

/// Ordered model input produced from one schema revision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    schema_revision: String,
    columns: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Build a vector directly, bypassing a schema. Column and value counts may
    /// disagree; models must check what they are handed.
    pub fn from_parts(
        schema_revision: impl Into<String>,
        columns: Vec<String>,
        values: Vec<f64>,
    ) -> Self {
        Self {
            schema_revision: schema_revision.into(),
            columns,
            values,
        }
    }

    pub fn schema_revision(&self) -> &str {
        &self.schema_revision
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Configuration-consistency faults between the schema, the validated attributes and
/// the loaded model. Never the caller's fault.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaMismatch {
    #[error("schema '{revision}' requires attribute '{attribute}' for column '{column}' but it was not validated")]
    MissingAttribute {
        revision: String,
        attribute: Attribute,
        column: String,
    },
    #[error("attributes were validated against schema '{validated}' but the active schema is '{active}'")]
    RevisionConflict { validated: String, active: String },
    #[error("model '{model_revision}' cannot be paired with schema '{schema_revision}': {detail}")]
    ModelConflict {
        schema_revision: String,
        model_revision: String,
        detail: String,
    },
}

/// Project validated attributes onto the schema's column layout.
pub fn map_features(
    attributes: &ValidatedAttributes,
    schema: &FeatureSchema,
) -> Result<FeatureVector, SchemaMismatch> {
    if attributes.schema_revision() != schema.revision() {
        return Err(SchemaMismatch::RevisionConflict {
            validated: attributes.schema_revision().to_string(),
            active: schema.revision().to_string(),
        });
    }

    let mut values = Vec::with_capacity(schema.len());
    for column in schema.columns() {
        let value = match (attributes.get(column.attribute), column.default) {
            (Some(value), _) => value,
            (None, Some(default)) if !column.required => default,
            _ => {
                return Err(SchemaMismatch::MissingAttribute {
                    revision: schema.revision().to_string(),
                    attribute: column.attribute,
                    column: column.column.clone(),
                })
            }
        };
        values.push(value);
    }

    Ok(FeatureVector {
        schema_revision: schema.revision().to_string(),
        columns: schema.column_names(),
        values,
    })
}
