//! Interactive estimation session
//!
//! Reads one `key=value, key=value` record per line and answers with a price
//! or an error message. A bad line never ends the session; `quit`, `exit` or
//! end of input does.

use crate::format::format_price;
use carprice_core::{PredictorState, RawRecord, Result};
use std::io::{self, BufRead, Write};
use tracing::debug;

pub const YEAR_ATTRIBUTE: &str = "year";
pub const AGE_ATTRIBUTE: &str = "car_age";

/// Outcome counts of a session
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub predicted: usize,
    pub failed: usize,
}

/// Parse one input line against the loaded schema.
///
/// The schema's numeric attributes and `year` are read as numbers; a `year`
/// becomes `car_age` relative to `reference_year` unless an age is given.
pub fn parse_line(line: &str, state: &PredictorState, reference_year: i64) -> Result<RawRecord> {
    let mut numeric: Vec<&str> = state
        .schema()
        .numeric_attributes()
        .iter()
        .map(String::as_str)
        .collect();
    numeric.push(YEAR_ATTRIBUTE);

    let mut record = RawRecord::parse_assignments(line, &numeric)?;
    record.derive_age(YEAR_ATTRIBUTE, AGE_ATTRIBUTE, reference_year)?;
    Ok(record)
}

pub fn run_session<R, W>(
    state: &PredictorState,
    reference_year: i64,
    input: R,
    mut output: W,
) -> io::Result<SessionStats>
where
    R: BufRead,
    W: Write,
{
    let mut stats = SessionStats::default();

    writeln!(
        output,
        "Enter vehicles as key=value pairs (e.g. manufacturer=ford, year=2018, odometer=50000); `quit` to exit"
    )?;

    for line in input.lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if matches!(line, "quit" | "exit") {
            break;
        }

        match parse_line(line, state, reference_year).and_then(|record| state.predict(&record)) {
            Ok(price) => {
                stats.predicted += 1;
                writeln!(output, "Estimated price: {}", format_price(price))?;
            }
            Err(err) => {
                stats.failed += 1;
                debug!(error = %err, "rejected session line");
                writeln!(output, "error: {err}")?;
            }
        }
    }

    Ok(stats)
}
