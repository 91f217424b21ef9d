//! Schema-positioned feature encoding
//!
//! Every vector produced here has exactly `schema.len()` entries in schema
//! order. Numeric columns copy the record's value; one-hot columns hold
//! `1` for the record's category and `0` otherwise. Categories the schema
//! has never seen leave their whole block at zero.

use crate::errors::{PricingError, Result};
use crate::record::{FeatureValue, RawRecord};
use crate::schema::Schema;

/// Fixed-width encoded row (integer units, indicators are 0/1)
pub type EncodedVector = Vec<i64>;

/// Encode one record against a schema
pub fn encode(record: &RawRecord, schema: &Schema) -> Result<EncodedVector> {
    let mut vector = vec![0i64; schema.len()];

    // Numeric attributes occupy the leading positions in declaration order
    for (pos, attribute) in schema.numeric_attributes().iter().enumerate() {
        vector[pos] = match record.get(attribute) {
            Some(FeatureValue::Numeric(v)) => *v,
            Some(FeatureValue::Categorical(_)) => {
                return Err(PricingError::NonNumericFeature(attribute.clone()))
            }
            None => return Err(PricingError::MissingFeature(attribute.clone())),
        };
    }

    for attribute in schema.categorical_attributes() {
        // Numbers supplied for a categorical attribute are never vocabulary
        let Some(value) = record.category(attribute) else {
            continue;
        };
        if let Some(pos) = schema.one_hot_position(attribute, value) {
            vector[pos] = 1;
        } else {
            tracing::trace!(attribute = %attribute, value = %value, "unseen category");
        }
    }

    Ok(vector)
}

/// Encode a finite table, stopping at the first failing row
pub fn encode_batch<'a, I>(records: I, schema: &Schema) -> Result<Vec<EncodedVector>>
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    records
        .into_iter()
        .enumerate()
        .map(|(row, record)| {
            encode(record, schema).map_err(|err| {
                tracing::warn!(row, error = %err, "failed to encode row");
                err
            })
        })
        .collect()
}
