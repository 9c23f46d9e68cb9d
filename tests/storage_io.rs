use ivm_map::classify::{Classifier, Method};
use ivm_map::models::{FeatureCollection, PropertyNames};
use ivm_map::{stats, storage};
use std::fs;

const FEATURES: &str = r#"{"type": "FeatureCollection", "features": [
  {"type": "Feature", "properties": {"gc": "001", "nm": "=HYPERLINK(\"http://evil\")", "indicator": 0.25},
   "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
  {"type": "Feature", "properties": {"gc": "002", "nm": "Bertioga", "indicator": 0.75},
   "geometry": {"type": "Polygon", "coordinates": [[[1,0],[2,0],[2,1],[1,1],[1,0]]]}},
  {"type": "Feature", "properties": {"gc": "003", "nm": "Ilhabela"},
   "geometry": {"type": "Polygon", "coordinates": [[[2,0],[3,0],[3,1],[2,1],[2,0]]]}}
]}"#;

fn features() -> FeatureCollection {
    FeatureCollection::from_geojson_str(FEATURES, &PropertyNames::default()).unwrap()
}

#[test]
fn save_csv_and_json() {
    let features = features();
    let classification = Classifier::new(2, Method::EqualInterval, "RdYlGn")
        .classify(&features.indicator_series())
        .unwrap();
    let rows = storage::rows(&features, Some(&classification));
    let dir = tempfile::tempdir().unwrap();

    let csv_path = dir.path().join("features.csv");
    storage::save_csv(&rows, &csv_path).unwrap();
    let csv_txt = fs::read_to_string(&csv_path).unwrap();
    assert!(csv_txt.starts_with("join_key,name,indicator,class,color"));
    assert_eq!(csv_txt.lines().count(), 1 + rows.len());

    let json_path = dir.path().join("features.json");
    storage::save_json(&rows, &json_path).unwrap();
    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    let arr = v.as_array().unwrap();
    assert_eq!(arr.len(), 3);
    assert_eq!(arr[1]["class"], 1);
    assert!(arr[2]["indicator"].is_null());
}

// Names come from third-party geometry files; spreadsheet formulas must not survive export.
#[test]
fn csv_cells_are_prefixed_to_avoid_formulas() {
    let rows = storage::rows(&features(), None);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("injection.csv");
    storage::save_csv(&rows, &path).unwrap();

    let mut rdr = csv::Reader::from_path(&path).unwrap();
    let row = rdr.records().next().expect("one data row expected").unwrap();
    let name = row.get(1).unwrap();
    assert!(name.starts_with('\''), "name not prefixed: {name}");
    assert!(name.contains("=HYPERLINK"));
}

#[test]
fn summary_and_class_counts() {
    let features = features();
    let s = stats::summary(&features);
    assert_eq!(s.count, 2);
    assert_eq!(s.missing, 1);
    assert_eq!(s.min, Some(0.25));
    assert_eq!(s.median, Some(0.5));

    let classification = Classifier::new(2, Method::EqualInterval, "Blues")
        .classify(&features.indicator_series())
        .unwrap();
    let counts = stats::class_counts(&features, &classification);
    assert_eq!(counts.iter().map(|c| c.count).collect::<Vec<_>>(), vec![1, 1]);
    assert_eq!(counts[0].from, 0.25);
    assert_eq!(counts[1].to, 0.75);
}
