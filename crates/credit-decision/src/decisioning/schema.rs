//! Feature schemas: which attributes a model revision consumes, under which column
//! names, and in which order.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::attributes::Attribute;

/// Revision served when no schema file is configured.
pub const DEFAULT_SCHEMA_REVISION: &str = "loan-v2";

const BUILTIN_SCHEMAS: [(&str, &str); 3] = [
    ("loan-v2", include_str!("../../schemas/loan-v2.json")),
    ("loan-v1", include_str!("../../schemas/loan-v1.json")),
    ("credit-v1", include_str!("../../schemas/credit-v1.json")),
];

/// One projected column of the feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub attribute: Attribute,
    pub column: String,
    #[serde(default = "required_by_default")]
    pub required: bool,
    /// Value used when an optional attribute is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<f64>,
}

fn required_by_default() -> bool {
    true
}

/// Ordered feature layout for one model revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFeatureSchema")]
pub struct FeatureSchema {
    revision: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    columns: Vec<FeatureColumn>,
}

#[derive(Deserialize)]
struct RawFeatureSchema {
    revision: String,
    #[serde(default)]
    description: Option<String>,
    columns: Vec<FeatureColumn>,
}

impl TryFrom<RawFeatureSchema> for FeatureSchema {
    type Error = SchemaError;

    fn try_from(raw: RawFeatureSchema) -> Result<Self, Self::Error> {
        Self::new(raw.revision, raw.columns).map(|schema| Self {
            description: raw.description,
            ..schema
        })
    }
}

impl FeatureSchema {
    pub fn new(
        revision: impl Into<String>,
        columns: Vec<FeatureColumn>,
    ) -> Result<Self, SchemaError> {
        let revision = revision.into();
        if revision.trim().is_empty() {
            return Err(SchemaError::EmptyRevision);
        }
        if columns.is_empty() {
            return Err(SchemaError::NoColumns { revision });
        }

        let mut attributes = BTreeSet::new();
        let mut names = BTreeSet::new();
        for column in &columns {
            if column.column.trim().is_empty() {
                return Err(SchemaError::BlankColumnName {
                    attribute: column.attribute,
                });
            }
            if !attributes.insert(column.attribute) {
                return Err(SchemaError::DuplicateAttribute {
                    attribute: column.attribute,
                });
            }
            if !names.insert(column.column.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    column: column.column.clone(),
                });
            }
            if !column.required && !column.default.is_some_and(f64::is_finite) {
                return Err(SchemaError::OptionalWithoutDefault {
                    attribute: column.attribute,
                });
            }
        }

        Ok(Self {
            revision,
            description: None,
            columns,
        })
    }

    /// One of the revisions shipped with the service.
    pub fn builtin(revision: &str) -> Result<Self, SchemaError> {
        let (_, raw) = BUILTIN_SCHEMAS
            .iter()
            .find(|(name, _)| *name == revision)
            .ok_or_else(|| SchemaError::UnknownRevision(revision.to_string()))?;
        Self::from_reader(raw.as_bytes())
    }

    pub fn builtin_revisions() -> impl Iterator<Item = &'static str> {
        BUILTIN_SCHEMAS.iter().map(|(name, _)| *name)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SchemaError> {
        serde_json::from_reader(reader).map_err(SchemaError::Parse)
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| column.column.clone())
            .collect()
    }

    pub fn declares(&self, attribute: Attribute) -> bool {
        self.columns
            .iter()
            .any(|column| column.attribute == attribute)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Raised when a schema cannot be loaded or is internally inconsistent.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("unknown built-in schema revision '{0}'")]
    UnknownRevision(String),
    #[error("schema revision must not be blank")]
    EmptyRevision,
    #[error("schema '{revision}' declares no columns")]
    NoColumns { revision: String },
    #[error("column for attribute '{attribute}' has a blank name")]
    BlankColumnName { attribute: Attribute },
    #[error("attribute '{attribute}' is mapped more than once")]
    DuplicateAttribute { attribute: Attribute },
    #[error("column '{column}' is declared more than once")]
    DuplicateColumn { column: String },
    #[error("optional attribute '{attribute}' must declare a finite default")]
    OptionalWithoutDefault { attribute: Attribute },
    #[error("unable to read schema {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid schema document: {0}")]
    Parse(#[source] serde_json::Error),
}
