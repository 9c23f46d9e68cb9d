//! Fixture documents shared by the integration tests.
#![allow(dead_code)]

use ivm_map::models::{DataSource, LegendText};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Three adjacent squares near Santos, west to east: 001, 002, 003.
pub fn squares_geojson(with_indicator: bool) -> String {
    let features: Vec<String> = [("001", "Santos", 0.2), ("002", "Cubatão", 0.5), ("003", "Guarujá", 0.8)]
        .iter()
        .enumerate()
        .map(|(i, (gc, nm, v))| {
            let x0 = -46.4 + 0.1 * i as f64;
            let x1 = x0 + 0.1;
            let indicator = if with_indicator {
                format!(r#", "indicator": {v}"#)
            } else {
                String::new()
            };
            format!(
                r#"{{"type": "Feature", "id": "{gc}",
                  "properties": {{"gc": "{gc}", "nm": "{nm}"{indicator}}},
                  "geometry": {{"type": "Polygon", "coordinates":
                    [[[{x0}, -24.0], [{x1}, -24.0], [{x1}, -23.9], [{x0}, -23.9], [{x0}, -24.0]]]}}}}"#
            )
        })
        .collect();
    format!(
        r#"{{"type": "FeatureCollection", "features": [{}]}}"#,
        features.join(",")
    )
}

pub const LEGEND_JSON: &str = r#"{"palette": "YlOrRd", "numClasses": 3, "method": "quantile"}"#;

/// Write geometry (and optionally a legend) into a temp dir and describe them.
pub fn write_source(dir: &Path, with_indicator: bool, with_legend: bool) -> DataSource {
    let geo = dir.join("municipios.geojson");
    fs::write(&geo, squares_geojson(with_indicator)).unwrap();
    let legend = dir.join("legend.json");
    if with_legend {
        fs::write(&legend, LEGEND_JSON).unwrap();
    }
    DataSource {
        geo_file_path: geo.to_string_lossy().to_string(),
        map_legend_file_path: legend.to_string_lossy().to_string(),
        map_legend_txt: LegendText {
            left: "<b>Low</b>".into(),
            right: "High".into(),
        },
        map_legend_img_path: Some("img/legend.png".into()),
    }
}

pub fn temp_source(with_indicator: bool, with_legend: bool) -> (TempDir, DataSource) {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path(), with_indicator, with_legend);
    (dir, source)
}
