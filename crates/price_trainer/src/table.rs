//! In-memory CSV tables
//!
//! Cells are kept as strings; an empty cell means "missing". The cleaner
//! edits tables in place and the dataset loader reads typed values out of
//! them.

use crate::errors::TrainerError;
use std::path::Path;

/// Header plus string rows
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Read a CSV file with a header row
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self, TrainerError> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .flexible(false)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| TrainerError::Dataset(format!("{}: {e}", path.display())))?;
        Self::from_reader(reader)
    }

    /// Parse CSV text with a header row
    pub fn from_csv_str(text: &str) -> Result<Self, TrainerError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());
        Self::from_reader(reader)
    }

    fn from_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self, TrainerError> {
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| TrainerError::Dataset(format!("row {}: {e}", line + 1)))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        tracing::debug!(columns = headers.len(), rows = rows.len(), "read table");
        Ok(Self { headers, rows })
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), TrainerError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Like [`Table::column_index`] but a missing column is an error
    pub fn require_column(&self, name: &str) -> Result<usize, TrainerError> {
        self.column_index(name)
            .ok_or_else(|| TrainerError::Dataset(format!("missing column `{name}`")))
    }

    /// Drop the named columns; returns the names that were actually present
    pub fn drop_columns(&mut self, names: &[String]) -> Vec<String> {
        let keep: Vec<bool> = self.headers.iter().map(|h| !names.contains(h)).collect();
        let dropped: Vec<String> = self
            .headers
            .iter()
            .zip(&keep)
            .filter(|(_, &k)| !k)
            .map(|(h, _)| h.clone())
            .collect();

        if dropped.is_empty() {
            return dropped;
        }

        self.headers = retain_by_mask(std::mem::take(&mut self.headers), &keep);
        for row in &mut self.rows {
            *row = retain_by_mask(std::mem::take(row), &keep);
        }
        dropped
    }

    /// Append a column, filling each row with `value(row)`
    pub fn push_column<F>(&mut self, name: &str, mut value: F)
    where
        F: FnMut(&[String]) -> String,
    {
        for row in &mut self.rows {
            let cell = value(row);
            row.push(cell);
        }
        self.headers.push(name.to_string());
    }
}

/// Cell at `column`, absent cells read as empty
pub fn cell(row: &[String], column: usize) -> &str {
    row.get(column).map(String::as_str).unwrap_or("")
}

fn retain_by_mask<T>(items: Vec<T>, keep: &[bool]) -> Vec<T> {
    items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, &k)| k.then_some(item))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "id,price,manufacturer\n1,5000,ford\n2, 7000 ,\n";

    #[test]
    fn test_parse_and_lookup() {
        let table = Table::from_csv_str(SAMPLE).unwrap();
        assert_eq!(table.headers, vec!["id", "price", "manufacturer"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1], vec!["2", "7000", ""]);
        assert_eq!(table.column_index("price"), Some(1));
        assert!(table.require_column("vin").is_err());
    }

    #[test]
    fn test_drop_and_push_columns() {
        let mut table = Table::from_csv_str(SAMPLE).unwrap();
        let dropped = table.drop_columns(&["id".to_string(), "url".to_string()]);
        assert_eq!(dropped, vec!["id"]);
        assert_eq!(table.headers, vec!["price", "manufacturer"]);
        assert_eq!(table.rows[0], vec!["5000", "ford"]);

        table.push_column("flag", |row| format!("{}!", row[0]));
        assert_eq!(table.rows[1], vec!["7000", "", "7000!"]);
    }

    #[test]
    fn test_write_read_roundtrip() {
        let table = Table::from_csv_str(SAMPLE).unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();
        table.write_csv(file.path()).unwrap();

        let back = Table::read_csv(file.path()).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let err = Table::from_csv_str("a,b\n1,2,3\n").unwrap_err();
        assert!(matches!(err, TrainerError::Dataset(_)));
    }
}
