use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Applicant attributes the service knows how to validate.
///
/// Each attribute carries its own domain constraint and numeric policy; a feature
/// schema chooses which of them a model revision consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Amount,
    Rate,
    Income,
    Duration,
    Age,
}

impl Attribute {
    pub const ALL: [Attribute; 5] = [
        Attribute::Amount,
        Attribute::Rate,
        Attribute::Income,
        Attribute::Duration,
        Attribute::Age,
    ];

    /// Canonical request key.
    pub fn key(self) -> &'static str {
        match self {
            Attribute::Amount => "amount",
            Attribute::Rate => "rate",
            Attribute::Income => "income",
            Attribute::Duration => "duration",
            Attribute::Age => "age",
        }
    }

    /// Legacy request keys still sent by older front ends.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Attribute::Amount => &["loan_amnt"],
            Attribute::Rate => &["loan_int_rate"],
            Attribute::Income => &["person_income"],
            Attribute::Duration | Attribute::Age => &[],
        }
    }

    pub fn constraint(self) -> Constraint {
        match self {
            Attribute::Rate => Constraint::NonNegative,
            Attribute::Amount | Attribute::Income | Attribute::Duration | Attribute::Age => {
                Constraint::Positive
            }
        }
    }

    /// Fractional amounts, incomes, durations and ages are rejected rather than truncated.
    pub fn policy(self) -> NumericPolicy {
        match self {
            Attribute::Rate => NumericPolicy::Decimal,
            Attribute::Amount | Attribute::Income | Attribute::Duration | Attribute::Age => {
                NumericPolicy::WholeNumber
            }
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Minimum domain constraint for an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    Positive,
    NonNegative,
}

impl Constraint {
    pub fn admits(self, value: f64) -> bool {
        match self {
            Constraint::Positive => value > 0.0,
            Constraint::NonNegative => value >= 0.0,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Constraint::Positive => "must be greater than 0",
            Constraint::NonNegative => "must be 0 or greater",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericPolicy {
    WholeNumber,
    Decimal,
}

/// Raw request body: field name to JSON value, untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicantInput {
    fields: Map<String, Value>,
}

impl ApplicantInput {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Look up an attribute by canonical key, then by alias.
    ///
    /// A key carrying `null` or blank text yields to a later key with a value; when
    /// every candidate is empty the first one sent is returned.
    pub fn lookup(&self, attribute: Attribute) -> Option<(&str, &Value)> {
        let mut empty = None;
        let candidates = std::iter::once(attribute.key())
            .chain(attribute.aliases().iter().copied())
            .filter_map(|key| self.fields.get_key_value(key));

        for (key, value) in candidates {
            if !is_empty_value(value) {
                return Some((key.as_str(), value));
            }
            empty.get_or_insert((key.as_str(), value));
        }
        empty
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for ApplicantInput {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

impl FromIterator<(String, Value)> for ApplicantInput {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

/// Typed attributes that passed validation against one schema revision.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedAttributes {
    schema_revision: String,
    values: BTreeMap<Attribute, f64>,
}

impl ValidatedAttributes {
    pub(crate) fn new(schema_revision: impl Into<String>) -> Self {
        Self {
            schema_revision: schema_revision.into(),
            values: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, attribute: Attribute, value: f64) {
        self.values.insert(attribute, value);
    }

    pub fn schema_revision(&self) -> &str {
        &self.schema_revision
    }

    pub fn get(&self, attribute: Attribute) -> Option<f64> {
        self.values.get(&attribute).copied()
    }

    pub fn contains(&self, attribute: Attribute) -> bool {
        self.values.contains_key(&attribute)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, f64)> + '_ {
        self.values.iter().map(|(attribute, value)| (*attribute, *value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_prefers_canonical_key_over_alias() {
        let input: ApplicantInput = [
            ("person_income".to_string(), json!(1)),
            ("income".to_string(), json!(2)),
        ]
        .into_iter()
        .collect();

        let (key, value) = input.lookup(Attribute::Income).expect("income present");
        assert_eq!(key, "income");
        assert_eq!(value, &json!(2));
    }

    #[test]
    fn lookup_falls_back_to_alias() {
        let input: ApplicantInput = [("loan_amnt".to_string(), json!("5000"))]
            .into_iter()
            .collect();

        let (key, _) = input.lookup(Attribute::Amount).expect("alias resolves");
        assert_eq!(key, "loan_amnt");
        assert!(input.lookup(Attribute::Age).is_none());
    }

    #[test]
    fn empty_canonical_key_yields_to_alias_with_value() {
        let input: ApplicantInput = [
            ("income".to_string(), json!(null)),
            ("person_income".to_string(), json!(30000)),
        ]
        .into_iter()
        .collect();

        let (key, value) = input.lookup(Attribute::Income).expect("alias resolves");
        assert_eq!(key, "person_income");
        assert_eq!(value, &json!(30000));
    }

    #[test]
    fn all_empty_candidates_return_the_canonical_key() {
        let input: ApplicantInput = [
            ("income".to_string(), json!("  ")),
            ("person_income".to_string(), json!(null)),
        ]
        .into_iter()
        .collect();

        let (key, _) = input.lookup(Attribute::Income).expect("key was sent");
        assert_eq!(key, "income");
    }

    #[test]
    fn constraints_split_rate_from_positive_fields() {
        assert!(Attribute::Rate.constraint().admits(0.0));
        assert!(!Attribute::Amount.constraint().admits(0.0));
        assert_eq!(Attribute::Rate.policy(), NumericPolicy::Decimal);
        assert_eq!(Attribute::Age.policy(), NumericPolicy::WholeNumber);
    }
}
