//! Readers for indicator datasets.
//!
//! CSV files carry one row per area with a join-key column and a value column;
//! JSON files are `{"values": {"<key>": <value>, ...}}`. Cells are kept as
//! loaded (see [`IndicatorValue`]) and only coerced when joined.

use crate::error::{MapError, Result};
use crate::models::{IndicatorDataset, IndicatorValue};
use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read `key_column`/`value_column` pairs from a CSV file with a header row.
pub fn read_csv<P: AsRef<Path>>(
    path: P,
    key_column: &str,
    value_column: &str,
) -> Result<IndicatorDataset> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| MapError::io(path, e))?;
    from_csv_reader(file, key_column, value_column)
}

/// Same as [`read_csv`] over any reader.
pub fn from_csv_reader<R: Read>(
    reader: R,
    key_column: &str,
    value_column: &str,
) -> Result<IndicatorDataset> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            MapError::InvalidDocument(format!("column '{name}' not found in CSV header"))
        })
    };
    let key_idx = column(key_column)?;
    let value_idx = column(value_column)?;

    let mut values = BTreeMap::new();
    for result in rdr.records() {
        let record = result?;
        let key = record.get(key_idx).unwrap_or("");
        if key.is_empty() {
            continue;
        }
        let cell = match record.get(value_idx) {
            Some(s) => match s.parse::<f64>() {
                Ok(n) => IndicatorValue::Number(n),
                Err(_) => IndicatorValue::Text(s.to_string()),
            },
            None => IndicatorValue::Null,
        };
        if values.insert(key.to_string(), cell).is_some() {
            log::warn!("duplicate join key '{key}' in CSV; last row wins");
        }
    }
    Ok(IndicatorDataset { values })
}

/// Read a `{"values": {...}}` document.
pub fn read_json<P: AsRef<Path>>(path: P) -> Result<IndicatorDataset> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| MapError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| MapError::json(path.display().to_string(), e))
}

/// Pick the reader from the file extension (`.json`, otherwise CSV).
pub fn read<P: AsRef<Path>>(
    path: P,
    key_column: &str,
    value_column: &str,
) -> Result<IndicatorDataset> {
    let path = path.as_ref();
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => read_json(path),
        _ => read_csv(path, key_column, value_column),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_cells_keep_their_kind() {
        let data = "gc,nm,indicator\n001,Santos,0.7\n002,Cubatão,x\n003,Guarujá,\n,blank,1\n";
        let ds = from_csv_reader(data.as_bytes(), "gc", "indicator").unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.values["001"], IndicatorValue::Number(0.7));
        assert_eq!(ds.values["002"], IndicatorValue::Text("x".into()));
        assert_eq!(ds.values["003"].as_number(), None);
    }

    #[test]
    fn missing_column_is_reported() {
        let err = from_csv_reader("a,b\n1,2\n".as_bytes(), "gc", "b").unwrap_err();
        assert!(err.to_string().contains("'gc'"));
    }
}
