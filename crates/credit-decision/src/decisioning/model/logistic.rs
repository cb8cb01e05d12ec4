use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{CreditModel, InferenceError, Prediction};
use crate::decisioning::engine::{APPROVED_LABEL, REJECTED_LABEL};
use crate::decisioning::mapper::FeatureVector;

/// Per-column standardisation applied before the linear term.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Logistic-regression default model stored as a JSON artifact.
///
/// The probability is that of the high-risk class; at or above `threshold` the model
/// emits `REJECTED_LABEL`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawArtifact")]
pub struct LogisticModel {
    revision: String,
    columns: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
    scaler: Option<StandardScaler>,
    threshold: f64,
}

#[derive(Deserialize)]
struct RawArtifact {
    revision: String,
    columns: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
    #[serde(default)]
    scaler: Option<StandardScaler>,
    #[serde(default = "default_threshold")]
    threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

impl TryFrom<RawArtifact> for LogisticModel {
    type Error = ModelArtifactError;

    fn try_from(raw: RawArtifact) -> Result<Self, Self::Error> {
        if raw.columns.is_empty() {
            return Err(ModelArtifactError::Inconsistent(
                "artifact declares no columns".to_string(),
            ));
        }
        if raw.coefficients.len() != raw.columns.len() {
            return Err(ModelArtifactError::Inconsistent(format!(
                "{} coefficients for {} columns",
                raw.coefficients.len(),
                raw.columns.len()
            )));
        }
        if let Some(scaler) = &raw.scaler {
            if scaler.mean.len() != raw.columns.len() || scaler.scale.len() != raw.columns.len() {
                return Err(ModelArtifactError::Inconsistent(
                    "scaler length does not match columns".to_string(),
                ));
            }
            if scaler.scale.iter().any(|scale| *scale == 0.0 || !scale.is_finite()) {
                return Err(ModelArtifactError::Inconsistent(
                    "scaler contains a zero or non-finite scale".to_string(),
                ));
            }
        }
        if !(raw.threshold > 0.0 && raw.threshold < 1.0) {
            return Err(ModelArtifactError::Inconsistent(format!(
                "threshold {} must lie strictly between 0 and 1",
                raw.threshold
            )));
        }
        if !raw.intercept.is_finite() || raw.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelArtifactError::Inconsistent(
                "weights must be finite".to_string(),
            ));
        }

        Ok(Self {
            revision: raw.revision,
            columns: raw.columns,
            coefficients: raw.coefficients,
            intercept: raw.intercept,
            scaler: raw.scaler,
            threshold: raw.threshold,
        })
    }
}

impl LogisticModel {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelArtifactError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ModelArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelArtifactError> {
        serde_json::from_reader(reader).map_err(ModelArtifactError::Parse)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn probability(&self, values: &[f64]) -> f64 {
        let z = values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let scaled = match &self.scaler {
                    Some(scaler) => (value - scaler.mean[index]) / scaler.scale[index],
                    None => *value,
                };
                scaled * self.coefficients[index]
            })
            .sum::<f64>()
            + self.intercept;
        1.0 / (1.0 + (-z).exp())
    }
}

impl CreditModel for LogisticModel {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, InferenceError> {
        let values = features.values();
        if values.len() != self.coefficients.len() {
            return Err(InferenceError::ColumnCount {
                expected: self.coefficients.len(),
                actual: values.len(),
            });
        }
        if let Some(index) = values.iter().position(|value| !value.is_finite()) {
            return Err(InferenceError::NonFinite {
                column: self.columns[index].clone(),
            });
        }

        let probability = self.probability(values);
        if !probability.is_finite() {
            return Err(InferenceError::Internal(
                "probability is not a finite number".to_string(),
            ));
        }

        let label = if probability >= self.threshold {
            REJECTED_LABEL
        } else {
            APPROVED_LABEL
        };

        Ok(Prediction {
            label,
            score: Some(probability),
        })
    }

    fn revision(&self) -> &str {
        &self.revision
    }

    fn expected_columns(&self) -> Option<&[String]> {
        Some(&self.columns)
    }
}

/// Reasons a model artifact could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ModelArtifactError {
    #[error("unable to open model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid model artifact: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("inconsistent model artifact: {0}")]
    Inconsistent(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTIFACT: &str = r#"{
        "revision": "loan-v2",
        "columns": ["loan_amnt", "loan_int_rate", "person_income"],
        "coefficients": [0.9, 0.6, -1.4],
        "intercept": -1.1,
        "scaler": { "mean": [9500.0, 11.0, 66000.0], "scale": [6300.0, 3.2, 52000.0] }
    }"#;

    fn vector(values: Vec<f64>) -> FeatureVector {
        FeatureVector::from_parts(
            "loan-v2",
            vec![
                "loan_amnt".to_string(),
                "loan_int_rate".to_string(),
                "person_income".to_string(),
            ],
            values,
        )
    }

    #[test]
    fn parses_artifact_with_default_threshold() {
        let model = LogisticModel::from_reader(ARTIFACT.as_bytes()).expect("artifact parses");
        assert_eq!(model.revision(), "loan-v2");
        assert_eq!(model.threshold(), 0.5);
        assert_eq!(model.expected_columns().map(<[String]>::len), Some(3));
    }

    #[test]
    fn small_loan_on_high_income_is_low_risk() {
        let model = LogisticModel::from_reader(ARTIFACT.as_bytes()).expect("artifact parses");
        let prediction = model
            .predict(&vector(vec![3000.0, 7.5, 120000.0]))
            .expect("scores");
        assert_eq!(prediction.label, APPROVED_LABEL);
        assert!(prediction.score.expect("probability") < 0.5);
    }

    #[test]
    fn large_expensive_loan_on_low_income_is_high_risk() {
        let model = LogisticModel::from_reader(ARTIFACT.as_bytes()).expect("artifact parses");
        let prediction = model
            .predict(&vector(vec![30000.0, 22.0, 18000.0]))
            .expect("scores");
        assert_eq!(prediction.label, REJECTED_LABEL);
    }

    #[test]
    fn wrong_column_count_is_an_inference_error() {
        let model = LogisticModel::from_reader(ARTIFACT.as_bytes()).expect("artifact parses");
        let err = model
            .predict(&vector(vec![3000.0, 7.5]))
            .expect_err("short vector rejected");
        assert_eq!(
            err,
            InferenceError::ColumnCount {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn mismatched_coefficients_are_rejected_at_load() {
        let raw = r#"{
            "revision": "x",
            "columns": ["a", "b"],
            "coefficients": [1.0],
            "intercept": 0.0
        }"#;
        let err = LogisticModel::from_reader(raw.as_bytes()).expect_err("inconsistent");
        assert!(err.to_string().contains("1 coefficients for 2 columns"));
    }

    #[test]
    fn missing_file_reports_io_error() {
        match LogisticModel::from_path("does/not/exist.json") {
            Err(ModelArtifactError::Io { path, .. }) => {
                assert_eq!(path, PathBuf::from("does/not/exist.json"))
            }
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
