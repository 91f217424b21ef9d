//! Encoding contract tests
//!
//! Checks the invariants that keep training-time and serving-time feature
//! vectors aligned.

use carprice_core::{encode, PricingError, RawRecord, Schema};
use proptest::prelude::*;

const NUMERIC: [&str; 2] = ["odometer", "car_age"];
const CATEGORICAL: [&str; 2] = ["manufacturer", "fuel"];

fn training_rows() -> Vec<RawRecord> {
    vec![
        RawRecord::new()
            .with_category("manufacturer", "toyota")
            .with_category("fuel", "gas")
            .with_numeric("odometer", 42_000)
            .with_numeric("car_age", 3),
        RawRecord::new()
            .with_category("manufacturer", "ford")
            .with_category("fuel", "diesel")
            .with_numeric("odometer", 120_000)
            .with_numeric("car_age", 11),
        RawRecord::new()
            .with_category("manufacturer", "ford")
            .with_category("fuel", "gas")
            .with_numeric("odometer", 80_000)
            .with_numeric("car_age", 7),
    ]
}

fn schema() -> Schema {
    Schema::from_records(&NUMERIC, &CATEGORICAL, &training_rows()).unwrap()
}

#[test]
fn two_row_scenario() {
    let rows = vec![
        RawRecord::new()
            .with_category("manufacturer", "ford")
            .with_numeric("odometer", 60_000)
            .with_numeric("car_age", 9),
        RawRecord::new()
            .with_category("manufacturer", "toyota")
            .with_numeric("odometer", 20_000)
            .with_numeric("car_age", 2),
    ];
    let schema = Schema::from_records(&NUMERIC, &["manufacturer"], &rows).unwrap();
    assert_eq!(
        schema.column_names(),
        vec!["odometer", "car_age", "manufacturer_ford", "manufacturer_toyota"]
    );

    let ford = RawRecord::new()
        .with_category("manufacturer", "ford")
        .with_numeric("odometer", 50_000)
        .with_numeric("car_age", 8);
    assert_eq!(encode(&ford, &schema).unwrap(), vec![50_000, 8, 1, 0]);

    let tesla = RawRecord::new()
        .with_category("manufacturer", "tesla")
        .with_numeric("odometer", 50_000)
        .with_numeric("car_age", 8);
    assert_eq!(encode(&tesla, &schema).unwrap(), vec![50_000, 8, 0, 0]);
}

#[test]
fn schema_json_is_reproducible() {
    let first = serde_json::to_vec(&schema()).unwrap();
    let mut reversed = training_rows();
    reversed.reverse();
    let second =
        serde_json::to_vec(&Schema::from_records(&NUMERIC, &CATEGORICAL, &reversed).unwrap())
            .unwrap();
    assert_eq!(first, second);
}

#[test]
fn reloaded_schema_encodes_identically() {
    let schema = schema();
    let reloaded: Schema = serde_json::from_str(&serde_json::to_string(&schema).unwrap()).unwrap();

    for row in training_rows() {
        assert_eq!(encode(&row, &schema).unwrap(), encode(&row, &reloaded).unwrap());
    }
}

#[test]
fn missing_numeric_is_an_error() {
    let record = RawRecord::new()
        .with_category("manufacturer", "ford")
        .with_numeric("car_age", 8);
    assert!(matches!(
        encode(&record, &schema()),
        Err(PricingError::MissingFeature(ref attr)) if attr == "odometer"
    ));
}

fn arbitrary_record() -> impl Strategy<Value = RawRecord> {
    (
        proptest::option::of("[a-z]{0,8}"),
        proptest::option::of(prop_oneof![Just("gas".to_string()), "[a-z]{1,6}"]),
        any::<i64>(),
        -5i64..60,
    )
        .prop_map(|(manufacturer, fuel, odometer, age)| {
            let mut record = RawRecord::new()
                .with_numeric("odometer", odometer)
                .with_numeric("car_age", age);
            if let Some(m) = manufacturer {
                record.set_category("manufacturer", m);
            }
            if let Some(f) = fuel {
                record.set_category("fuel", f);
            }
            record
        })
}

proptest! {
    #[test]
    fn encoded_width_matches_schema(record in arbitrary_record()) {
        let schema = schema();
        let vector = encode(&record, &schema).unwrap();
        prop_assert_eq!(vector.len(), schema.len());
    }

    #[test]
    fn encoding_is_idempotent(record in arbitrary_record()) {
        let schema = schema();
        prop_assert_eq!(encode(&record, &schema).unwrap(), encode(&record, &schema).unwrap());
    }

    #[test]
    fn one_hot_blocks_have_at_most_one_bit(record in arbitrary_record()) {
        let schema = schema();
        let vector = encode(&record, &schema).unwrap();

        for attribute in schema.categorical_attributes() {
            let vocabulary = schema.vocabulary(attribute);
            let hot: i64 = vocabulary
                .iter()
                .map(|value| vector[schema.one_hot_position(attribute, value).unwrap()])
                .sum();
            let known = record
                .category(attribute)
                .map(|v| vocabulary.contains(&v))
                .unwrap_or(false);
            prop_assert_eq!(hot, if known { 1 } else { 0 });
        }
    }
}
