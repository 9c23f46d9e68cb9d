use crate::classify::Classification;
use crate::models::FeatureCollection;
use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use std::borrow::Cow;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// One exported row: a feature with its joined value and class.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeatureRow {
    pub join_key: String,
    pub name: String,
    pub indicator: Option<f64>,
    pub class: Option<usize>,
    pub color: Option<String>,
}

/// Flatten features (and their classes, when classified) into rows.
pub fn rows(features: &FeatureCollection, classification: Option<&Classification>) -> Vec<FeatureRow> {
    features
        .features
        .iter()
        .map(|f| {
            let class = f
                .indicator
                .and_then(|v| classification.and_then(|c| c.class_of(v)));
            FeatureRow {
                join_key: f.join_key.clone(),
                name: f.name.clone(),
                indicator: f.indicator,
                class,
                color: class
                    .and_then(|i| classification.map(|c| c.colors[i].to_hex())),
            }
        })
        .collect()
}

/// Prefix cells that spreadsheets would evaluate as formulas.
fn csv_safe(cell: &str) -> Cow<'_, str> {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => Cow::Owned(format!("'{cell}")),
        _ => Cow::Borrowed(cell),
    }
}

/// Save rows as CSV with header.
pub fn save_csv<P: AsRef<Path>>(rows: &[FeatureRow], path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record(["join_key", "name", "indicator", "class", "color"])?;
    for r in rows {
        wtr.serialize((
            csv_safe(&r.join_key),
            csv_safe(&r.name),
            r.indicator,
            r.class,
            &r.color,
        ))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save rows as pretty JSON array.
pub fn save_json<P: AsRef<Path>>(rows: &[FeatureRow], path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(rows)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_csv_and_json() {
        let dir = tempdir().unwrap();
        let csvp = dir.path().join("x.csv");
        let jsonp = dir.path().join("x.json");
        let rows = vec![FeatureRow {
            join_key: "001".into(),
            name: "Santos".into(),
            indicator: Some(0.7),
            class: Some(1),
            color: Some("#1a9850".into()),
        }];
        save_csv(&rows, &csvp).unwrap();
        save_json(&rows, &jsonp).unwrap();
        assert!(csvp.exists());
        assert!(jsonp.exists());
    }
}
