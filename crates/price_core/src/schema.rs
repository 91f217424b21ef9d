//! Fixed column schema and the category vocabulary builder
//!
//! A [`Schema`] is the ordered list of columns a model was trained against.
//! Column order is fixed at build time and persisted verbatim:
//!
//! 1. numeric pass-through columns, in caller-specified order;
//! 2. one-hot columns grouped by categorical attribute (caller-specified
//!    attribute order), values within an attribute in lexicographic byte
//!    order.
//!
//! One-hot columns are named `{attribute}_{value}` for display, but are
//! located by their `(attribute, value)` pair. That index is rebuilt whenever
//! a schema is constructed or deserialized and is never persisted.

use crate::errors::{PricingError, Result};
use crate::record::RawRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Current schema format version
pub const SCHEMA_VERSION: u32 = 1;

/// A single schema column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Column {
    /// Numeric attribute copied through unchanged
    Numeric { name: String },
    /// Indicator for one observed value of a categorical attribute
    OneHot { attribute: String, value: String },
}

impl Column {
    /// Column name as exposed to the model (`odometer`, `fuel_gas`, ...)
    pub fn name(&self) -> String {
        match self {
            Column::Numeric { name } => name.clone(),
            Column::OneHot { attribute, value } => one_hot_name(attribute, value),
        }
    }
}

/// Naming convention for one-hot columns
fn one_hot_name(attribute: &str, value: &str) -> String {
    format!("{attribute}_{value}")
}

/// Persisted form of a schema
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaRepr {
    version: u32,
    numeric: Vec<String>,
    categorical: Vec<String>,
    columns: Vec<Column>,
}

/// Immutable, ordered feature schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SchemaRepr", into = "SchemaRepr")]
pub struct Schema {
    numeric: Vec<String>,
    categorical: Vec<String>,
    columns: Vec<Column>,
    one_hot: HashMap<(String, String), usize>,
}

impl Schema {
    /// Build a schema from an explicit column list, validating ordering rules.
    pub fn new(numeric: Vec<String>, categorical: Vec<String>, columns: Vec<Column>) -> Result<Self> {
        check_attribute_names(&numeric, &categorical)?;

        if columns.len() < numeric.len() {
            return Err(PricingError::InvalidSchema(format!(
                "{} numeric attributes but only {} columns",
                numeric.len(),
                columns.len()
            )));
        }

        for (i, expected) in numeric.iter().enumerate() {
            match &columns[i] {
                Column::Numeric { name } if name == expected => {}
                other => {
                    return Err(PricingError::InvalidSchema(format!(
                        "column {i} should be numeric `{expected}`, found `{}`",
                        other.name()
                    )))
                }
            }
        }

        // One-hot block: attributes in declared order, values strictly increasing
        let mut attr_pos = 0usize;
        let mut last: Option<(&str, &str)> = None;
        for (i, column) in columns.iter().enumerate().skip(numeric.len()) {
            let (attribute, value) = match column {
                Column::OneHot { attribute, value } => (attribute.as_str(), value.as_str()),
                Column::Numeric { name } => {
                    return Err(PricingError::InvalidSchema(format!(
                        "numeric column `{name}` at position {i} follows one-hot columns"
                    )))
                }
            };

            while attr_pos < categorical.len() && categorical[attr_pos] != attribute {
                attr_pos += 1;
            }
            if attr_pos == categorical.len() {
                return Err(PricingError::InvalidSchema(format!(
                    "column {i} (`{}`) is out of attribute order or unknown",
                    column.name()
                )));
            }

            if let Some((prev_attr, prev_value)) = last {
                if prev_attr == attribute && prev_value >= value {
                    return Err(PricingError::InvalidSchema(format!(
                        "values of `{attribute}` are not strictly sorted at column {i}"
                    )));
                }
            }
            last = Some((attribute, value));
        }

        // Pairs are unique: attributes are distinct and values strictly sorted
        let one_hot = columns
            .iter()
            .enumerate()
            .filter_map(|(i, column)| match column {
                Column::OneHot { attribute, value } => Some(((attribute.clone(), value.clone()), i)),
                Column::Numeric { .. } => None,
            })
            .collect();

        Ok(Self {
            numeric,
            categorical,
            columns,
            one_hot,
        })
    }

    /// Convenience wrapper around [`VocabularyBuilder`]
    pub fn from_records<'a, I>(numeric: &[&str], categorical: &[&str], records: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a RawRecord>,
    {
        let mut builder = VocabularyBuilder::new(numeric, categorical);
        for record in records {
            builder.observe(record);
        }
        builder.build()
    }

    /// Number of columns (length of every encoded vector)
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Ordered column names
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Numeric attributes, which also occupy positions `0..numeric.len()`
    pub fn numeric_attributes(&self) -> &[String] {
        &self.numeric
    }

    pub fn categorical_attributes(&self) -> &[String] {
        &self.categorical
    }

    /// First column with the given display name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name() == name)
    }

    /// Position of the indicator column for `attribute == value`
    pub fn one_hot_position(&self, attribute: &str, value: &str) -> Option<usize> {
        self.one_hot
            .get(&(attribute.to_string(), value.to_string()))
            .copied()
    }

    /// Observed vocabulary of one categorical attribute, in column order
    pub fn vocabulary(&self, attribute: &str) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|c| match c {
                Column::OneHot { attribute: a, value } if a == attribute => Some(value.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl TryFrom<SchemaRepr> for Schema {
    type Error = PricingError;

    fn try_from(repr: SchemaRepr) -> Result<Self> {
        if repr.version != SCHEMA_VERSION {
            return Err(PricingError::InvalidSchema(format!(
                "unsupported schema version: {}",
                repr.version
            )));
        }
        Schema::new(repr.numeric, repr.categorical, repr.columns)
    }
}

impl From<Schema> for SchemaRepr {
    fn from(schema: Schema) -> Self {
        SchemaRepr {
            version: SCHEMA_VERSION,
            numeric: schema.numeric,
            categorical: schema.categorical,
            columns: schema.columns,
        }
    }
}

fn check_attribute_names(numeric: &[String], categorical: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for name in numeric.iter().chain(categorical) {
        if name.is_empty() {
            return Err(PricingError::InvalidSchema("empty attribute name".into()));
        }
        if !seen.insert(name.as_str()) {
            return Err(PricingError::InvalidSchema(format!(
                "attribute `{name}` declared more than once"
            )));
        }
    }
    Ok(())
}

/// Collects the distinct categorical values seen in a training table
#[derive(Debug, Clone)]
pub struct VocabularyBuilder {
    numeric: Vec<String>,
    categorical: Vec<String>,
    observed: Vec<BTreeSet<String>>,
    rows: usize,
}

impl VocabularyBuilder {
    pub fn new(numeric: &[&str], categorical: &[&str]) -> Self {
        Self {
            numeric: numeric.iter().map(|s| s.to_string()).collect(),
            categorical: categorical.iter().map(|s| s.to_string()).collect(),
            observed: vec![BTreeSet::new(); categorical.len()],
            rows: 0,
        }
    }

    /// Record the categorical values of one training row.
    ///
    /// Empty strings and attributes supplied as numbers are not vocabulary.
    pub fn observe(&mut self, record: &RawRecord) {
        self.rows += 1;
        for (attribute, values) in self.categorical.iter().zip(self.observed.iter_mut()) {
            if let Some(value) = record.category(attribute) {
                if !value.is_empty() && !values.contains(value) {
                    values.insert(value.to_string());
                }
            }
        }
    }

    /// Freeze the observed vocabulary into a schema
    pub fn build(self) -> Result<Schema> {
        let mut columns: Vec<Column> = self
            .numeric
            .iter()
            .map(|name| Column::Numeric { name: name.clone() })
            .collect();

        for (attribute, values) in self.categorical.iter().zip(self.observed) {
            tracing::debug!(attribute = %attribute, values = values.len(), "vocabulary");
            columns.extend(values.into_iter().map(|value| Column::OneHot {
                attribute: attribute.clone(),
                value,
            }));
        }

        let schema = Schema::new(self.numeric, self.categorical, columns)?;
        tracing::info!(
            rows = self.rows,
            columns = schema.len(),
            "built feature schema"
        );
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(manufacturer: &str) -> RawRecord {
        RawRecord::new()
            .with_category("manufacturer", manufacturer)
            .with_numeric("odometer", 1)
            .with_numeric("car_age", 1)
    }

    #[test]
    fn test_column_order() {
        let rows = vec![record("toyota"), record("ford"), record("toyota")];
        let schema =
            Schema::from_records(&["odometer", "car_age"], &["manufacturer"], &rows).unwrap();

        assert_eq!(
            schema.column_names(),
            vec!["odometer", "car_age", "manufacturer_ford", "manufacturer_toyota"]
        );
        assert_eq!(schema.position("manufacturer_toyota"), Some(3));
        assert_eq!(schema.one_hot_position("manufacturer", "ford"), Some(2));
        assert_eq!(schema.one_hot_position("manufacturer", "tesla"), None);
        assert_eq!(schema.vocabulary("manufacturer"), vec!["ford", "toyota"]);
    }

    #[test]
    fn test_row_order_does_not_matter() {
        let a = vec![record("b"), record("a"), record("c")];
        let b = vec![record("c"), record("b"), record("a")];
        let s1 = Schema::from_records(&["odometer"], &["manufacturer"], &a).unwrap();
        let s2 = Schema::from_records(&["odometer"], &["manufacturer"], &b).unwrap();

        assert_eq!(s1, s2);
        assert_eq!(
            serde_json::to_string(&s1).unwrap(),
            serde_json::to_string(&s2).unwrap()
        );
    }

    #[test]
    fn test_empty_values_are_not_vocabulary() {
        let rows = vec![record(""), record("ford")];
        let schema = Schema::from_records(&[], &["manufacturer"], &rows).unwrap();
        assert_eq!(schema.column_names(), vec!["manufacturer_ford"]);
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        let builder = VocabularyBuilder::new(&["odometer"], &["odometer"]);
        assert!(matches!(builder.build(), Err(PricingError::InvalidSchema(_))));
    }

    #[test]
    fn test_serde_roundtrip_rebuilds_index() {
        let rows = vec![record("ford"), record("toyota")];
        let schema = Schema::from_records(&["odometer"], &["manufacturer"], &rows).unwrap();

        let json = serde_json::to_string(&schema).unwrap();
        assert!(!json.contains("\"one_hot\":"));

        let back: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema);
        assert_eq!(back.position("manufacturer_toyota"), Some(2));
        assert_eq!(back.one_hot_position("manufacturer", "toyota"), Some(2));
    }

    #[test]
    fn test_underscored_names_do_not_collide() {
        // `a` + `b_c` and `a_b` + `c` share the display name `a_b_c`
        let rows = vec![
            RawRecord::new().with_category("a", "b_c"),
            RawRecord::new().with_category("a_b", "c"),
        ];
        let schema = Schema::from_records(&[], &["a", "a_b"], &rows).unwrap();

        assert_eq!(schema.column_names(), vec!["a_b_c", "a_b_c"]);
        assert_eq!(schema.one_hot_position("a", "b_c"), Some(0));
        assert_eq!(schema.one_hot_position("a_b", "c"), Some(1));
        assert_eq!(schema.one_hot_position("a", "b"), None);

        let back: Schema = serde_json::from_str(&serde_json::to_string(&schema).unwrap()).unwrap();
        assert_eq!(back.one_hot_position("a_b", "c"), Some(1));
    }

    #[test]
    fn test_numeric_values_are_not_vocabulary() {
        let rows = vec![
            RawRecord::new().with_numeric("manufacturer", 7),
            RawRecord::new().with_category("manufacturer", "ford"),
        ];
        let schema = Schema::from_records(&[], &["manufacturer"], &rows).unwrap();
        assert_eq!(schema.vocabulary("manufacturer"), vec!["ford"]);
    }

    #[test]
    fn test_unsorted_columns_rejected() {
        let columns = vec![
            Column::OneHot {
                attribute: "fuel".into(),
                value: "gas".into(),
            },
            Column::OneHot {
                attribute: "fuel".into(),
                value: "diesel".into(),
            },
        ];
        let err = Schema::new(vec![], vec!["fuel".into()], columns).unwrap_err();
        assert!(matches!(err, PricingError::InvalidSchema(_)));
    }

    #[test]
    fn test_numeric_columns_must_lead() {
        let columns = vec![Column::OneHot {
            attribute: "fuel".into(),
            value: "gas".into(),
        }];
        let err = Schema::new(vec!["odometer".into()], vec!["fuel".into()], columns).unwrap_err();
        assert!(matches!(err, PricingError::InvalidSchema(_)));
    }
}
