//! Raw vehicle records as supplied by the cleaning stage or an operator
//!
//! A record maps attribute names to either whole-unit numeric values
//! (miles, years) or free-form categorical strings. No vocabulary is
//! enforced here; that is the schema's job.

use crate::errors::{PricingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Numeric(i64),
    Categorical(String),
}

impl FeatureValue {
    pub fn as_numeric(&self) -> Option<i64> {
        match self {
            FeatureValue::Numeric(v) => Some(*v),
            FeatureValue::Categorical(_) => None,
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            FeatureValue::Categorical(s) => Some(s.as_str()),
            FeatureValue::Numeric(_) => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Numeric(v) => write!(f, "{v}"),
            FeatureValue::Categorical(s) => f.write_str(s),
        }
    }
}

/// Attribute name -> value mapping for one vehicle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    values: BTreeMap<String, FeatureValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style numeric setter
    pub fn with_numeric(mut self, attribute: impl Into<String>, value: i64) -> Self {
        self.set_numeric(attribute, value);
        self
    }

    /// Builder-style categorical setter
    pub fn with_category(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_category(attribute, value);
        self
    }

    pub fn set_numeric(&mut self, attribute: impl Into<String>, value: i64) {
        self.values
            .insert(attribute.into(), FeatureValue::Numeric(value));
    }

    pub fn set_category(&mut self, attribute: impl Into<String>, value: impl Into<String>) {
        self.values
            .insert(attribute.into(), FeatureValue::Categorical(value.into()));
    }

    pub fn get(&self, attribute: &str) -> Option<&FeatureValue> {
        self.values.get(attribute)
    }

    pub fn numeric(&self, attribute: &str) -> Option<i64> {
        self.values.get(attribute).and_then(FeatureValue::as_numeric)
    }

    pub fn category(&self, attribute: &str) -> Option<&str> {
        self.values.get(attribute).and_then(FeatureValue::as_category)
    }

    pub fn remove(&mut self, attribute: &str) -> Option<FeatureValue> {
        self.values.remove(attribute)
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.values.contains_key(attribute)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Replace a model-year attribute with an age attribute.
    ///
    /// Leaves the record untouched when the age is already present or the
    /// year is absent. Returns `NonNumericFeature` for a non-numeric year.
    pub fn derive_age(
        &mut self,
        year_attribute: &str,
        age_attribute: &str,
        reference_year: i64,
    ) -> Result<()> {
        if self.contains(age_attribute) {
            return Ok(());
        }
        match self.remove(year_attribute) {
            None => Ok(()),
            Some(FeatureValue::Numeric(year)) => {
                self.set_numeric(age_attribute, car_age(reference_year, year));
                Ok(())
            }
            Some(FeatureValue::Categorical(_)) => {
                Err(PricingError::NonNumericFeature(year_attribute.to_string()))
            }
        }
    }

    /// Parse a `key=value, key=value` line.
    ///
    /// Attributes listed in `numeric` are parsed with [`parse_numeric`];
    /// everything else is kept as a categorical string. Empty values are
    /// skipped.
    pub fn parse_assignments(line: &str, numeric: &[&str]) -> Result<Self> {
        let mut record = RawRecord::new();

        for part in line.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part.split_once('=').ok_or_else(|| {
                PricingError::InvalidRecord(format!("expected key=value, got `{part}`"))
            })?;
            let key = key.trim();
            let value = value.trim();

            if key.is_empty() {
                return Err(PricingError::InvalidRecord(format!(
                    "empty attribute name in `{part}`"
                )));
            }
            if value.is_empty() {
                continue;
            }

            if numeric.contains(&key) {
                let parsed = parse_numeric(value)
                    .ok_or_else(|| PricingError::NonNumericFeature(key.to_string()))?;
                record.set_numeric(key, parsed);
            } else {
                record.set_category(key, value);
            }
        }

        Ok(record)
    }
}

impl FromIterator<(String, FeatureValue)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (String, FeatureValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Parse a whole-unit numeric cell, rounding decimals to the nearest integer.
///
/// Returns `None` for empty, non-finite or out-of-range input.
pub fn parse_numeric(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    let v = raw.parse::<f64>().ok()?;
    if !v.is_finite() || v.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(v.round() as i64)
}

/// Age of a vehicle in whole years relative to `reference_year`
pub fn car_age(reference_year: i64, year: i64) -> i64 {
    reference_year.saturating_sub(year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_accessors() {
        let record = RawRecord::new()
            .with_category("manufacturer", "ford")
            .with_numeric("odometer", 50_000);

        assert_eq!(record.len(), 2);
        assert_eq!(record.category("manufacturer"), Some("ford"));
        assert_eq!(record.numeric("odometer"), Some(50_000));
        assert_eq!(record.numeric("manufacturer"), None);
        assert_eq!(record.category("odometer"), None);
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric("50000"), Some(50_000));
        assert_eq!(parse_numeric(" 50000.4 "), Some(50_000));
        assert_eq!(parse_numeric("50000.5"), Some(50_001));
        assert_eq!(parse_numeric("-3"), Some(-3));
        assert_eq!(parse_numeric(""), None);
        assert_eq!(parse_numeric("abc"), None);
        assert_eq!(parse_numeric("NaN"), None);
        assert_eq!(parse_numeric("inf"), None);
    }

    #[test]
    fn test_parse_assignments() {
        let record = RawRecord::parse_assignments(
            "manufacturer=ford, cylinders=4 cylinders, odometer=50000, fuel=",
            &["odometer", "car_age"],
        )
        .unwrap();

        assert_eq!(record.category("manufacturer"), Some("ford"));
        assert_eq!(record.category("cylinders"), Some("4 cylinders"));
        assert_eq!(record.numeric("odometer"), Some(50_000));
        assert!(!record.contains("fuel"));
    }

    #[test]
    fn test_parse_assignments_rejects_garbage() {
        let err = RawRecord::parse_assignments("manufacturer", &[]).unwrap_err();
        assert!(matches!(err, PricingError::InvalidRecord(_)));

        let err = RawRecord::parse_assignments("odometer=lots", &["odometer"]).unwrap_err();
        assert!(matches!(err, PricingError::NonNumericFeature(ref a) if a == "odometer"));
    }

    #[test]
    fn test_derive_age() {
        let mut record = RawRecord::new().with_numeric("year", 2018);
        record.derive_age("year", "car_age", 2026).unwrap();
        assert_eq!(record.numeric("car_age"), Some(8));
        assert!(!record.contains("year"));

        // Explicit age wins over year
        let mut record = RawRecord::new()
            .with_numeric("year", 2018)
            .with_numeric("car_age", 3);
        record.derive_age("year", "car_age", 2026).unwrap();
        assert_eq!(record.numeric("car_age"), Some(3));

        let mut record = RawRecord::new().with_category("year", "new");
        assert!(record.derive_age("year", "car_age", 2026).is_err());
    }

    #[test]
    fn test_serde_shape() {
        let record = RawRecord::new()
            .with_category("fuel", "gas")
            .with_numeric("odometer", 10);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"fuel":"gas","odometer":10}"#);

        let back: RawRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
