use crate::error::{MapError, Result};
use geo::{BoundingRect, MultiPolygon, Rect};
use geojson::GeoJson;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Names of the GeoJSON properties that carry the join key, the display name
/// and the indicator value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyNames {
    pub join_key: String,
    pub name: String,
    pub indicator: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            join_key: "gc".into(),
            name: "nm".into(),
            indicator: "indicator".into(),
        }
    }
}

/// One municipality (or any areal unit) of the geometry document.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFeature {
    /// GeoJSON feature id, or the feature's position when the document has none.
    pub id: String,
    pub name: String,
    pub join_key: String,
    pub geometry: MultiPolygon<f64>,
    /// `None` until a dataset has been joined (or the document carried a value).
    pub indicator: Option<f64>,
    /// Remaining properties, passed through to the detail panel.
    pub properties: Map<String, Value>,
}

impl GeoFeature {
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.geometry.bounding_rect()
    }

    /// Snapshot of the properties pushed to the info control and detail panel.
    pub fn properties(&self) -> FeatureProperties {
        FeatureProperties {
            join_key: self.join_key.clone(),
            name: self.name.clone(),
            indicator: self.indicator,
            extra: self.properties.clone(),
        }
    }
}

/// Properties of a selected feature as seen by the info control and the detail panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    pub join_key: String,
    pub name: String,
    pub indicator: Option<f64>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// Ordered features of a geometry document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<GeoFeature>,
}

impl FeatureCollection {
    /// Parse a GeoJSON `FeatureCollection` document.
    pub fn from_geojson_str(text: &str, names: &PropertyNames) -> Result<Self> {
        let geojson: GeoJson = text.parse()?;
        Self::from_geojson(geojson, names)
    }

    /// Build typed features from parsed GeoJSON.
    ///
    /// Features without geometry or with non-areal geometry are skipped.
    pub fn from_geojson(geojson: GeoJson, names: &PropertyNames) -> Result<Self> {
        let collection = match geojson {
            GeoJson::FeatureCollection(fc) => fc,
            _ => {
                return Err(MapError::InvalidDocument(
                    "GeoJSON must be a FeatureCollection".into(),
                ));
            }
        };

        let mut features = Vec::with_capacity(collection.features.len());
        for (position, feature) in collection.features.into_iter().enumerate() {
            let id = match &feature.id {
                Some(geojson::feature::Id::String(s)) => s.clone(),
                Some(geojson::feature::Id::Number(n)) => n.to_string(),
                None => position.to_string(),
            };
            let mut properties = feature.properties.unwrap_or_default();

            let join_key = match properties.remove(&names.join_key) {
                Some(Value::String(s)) => s,
                Some(Value::Number(n)) => n.to_string(),
                _ => {
                    log::warn!(
                        "feature {} has no '{}' property; it will never match a dataset",
                        id,
                        names.join_key
                    );
                    String::new()
                }
            };
            let name = match properties.remove(&names.name) {
                Some(Value::String(s)) => s,
                Some(other) if !other.is_null() => other.to_string(),
                _ => join_key.clone(),
            };
            let indicator = properties
                .remove(&names.indicator)
                .and_then(|v| IndicatorValue::from_json(v).as_number());

            let geometry = match feature.geometry {
                Some(g) => match geo::Geometry::<f64>::try_from(g.value)? {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => {
                        log::warn!("feature {} has non-areal geometry; skipped", id);
                        continue;
                    }
                },
                None => {
                    log::warn!("feature {} has no geometry; skipped", id);
                    continue;
                }
            };

            features.push(GeoFeature {
                id,
                name,
                join_key,
                geometry,
                indicator,
                properties,
            });
        }

        Ok(Self { features })
    }

    /// Bounding box of every feature.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.features
            .iter()
            .filter_map(GeoFeature::bounds)
            .reduce(|a, b| {
                Rect::new(
                    geo::coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                    geo::coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
                )
            })
    }

    pub fn position(&self, join_key: &str) -> Option<usize> {
        self.features.iter().position(|f| f.join_key == join_key)
    }

    pub fn get(&self, join_key: &str) -> Option<&GeoFeature> {
        self.features.iter().find(|f| f.join_key == join_key)
    }

    /// Indicator values of every feature that has one, in feature order.
    pub fn indicator_series(&self) -> Vec<f64> {
        self.features.iter().filter_map(|f| f.indicator).collect()
    }

    pub fn has_indicator(&self) -> bool {
        self.features.iter().any(|f| f.indicator.is_some())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// A single cell of an indicator dataset, kept as loaded so that the join can
/// tell numbers from text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndicatorValue {
    Number(f64),
    Text(String),
    Null,
    Other(Value),
}

impl IndicatorValue {
    pub fn from_json(v: Value) -> Self {
        match v {
            Value::Number(n) => n.as_f64().map(Self::Number).unwrap_or(Self::Null),
            Value::String(s) => Self::Text(s),
            Value::Null => Self::Null,
            other => Self::Other(other),
        }
    }

    /// Finite numeric value, accepting numeric text such as `"0.5"`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            Self::Null | Self::Other(_) => None,
        }
        .filter(|n| n.is_finite())
    }
}

impl From<f64> for IndicatorValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for IndicatorValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Indicator values keyed by join key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDataset {
    pub values: BTreeMap<String, IndicatorValue>,
}

impl IndicatorDataset {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<IndicatorValue>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Legend configuration document. Every field is optional; the classifier
/// defaults apply unless configuration asks for these values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegendConfig {
    pub palette: Option<String>,
    pub num_classes: Option<usize>,
    pub method: Option<String>,
    pub breaks: Option<Vec<f64>>,
    pub colors: Option<Vec<String>>,
}

/// Left/right legend captions (HTML fragments).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendText {
    pub left: String,
    pub right: String,
}

/// Where to find the documents of one map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub geo_file_path: String,
    pub map_legend_file_path: String,
    #[serde(default)]
    pub map_legend_txt: LegendText,
    #[serde(default)]
    pub map_legend_img_path: Option<String>,
}

impl DataSource {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| MapError::json("data source descriptor", e))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| MapError::io(path, e))?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SQUARES: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {"type": "Feature", "id": "a",
         "properties": {"gc": "001", "nm": "Alpha", "pop": 10},
         "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
        {"type": "Feature",
         "properties": {"gc": 2, "indicator": "0.4"},
         "geometry": {"type": "MultiPolygon", "coordinates": [[[[2,2],[3,2],[3,3],[2,3],[2,2]]]]}},
        {"type": "Feature", "properties": {"gc": "003"},
         "geometry": {"type": "Point", "coordinates": [5,5]}}
      ]
    }"#;

    #[test]
    fn parses_typed_features() {
        let fc = FeatureCollection::from_geojson_str(TWO_SQUARES, &PropertyNames::default())
            .unwrap();
        assert_eq!(fc.len(), 2);
        let a = &fc.features[0];
        assert_eq!(a.id, "a");
        assert_eq!(a.join_key, "001");
        assert_eq!(a.name, "Alpha");
        assert_eq!(a.indicator, None);
        assert_eq!(a.properties.get("pop"), Some(&Value::from(10)));

        let b = &fc.features[1];
        assert_eq!(b.id, "1");
        assert_eq!(b.join_key, "2");
        assert_eq!(b.name, "2");
        assert_eq!(b.indicator, Some(0.4));

        let bounds = fc.bounds().unwrap();
        assert_eq!(bounds.min(), geo::coord! { x: 0.0, y: 0.0 });
        assert_eq!(bounds.max(), geo::coord! { x: 3.0, y: 3.0 });
    }

    #[test]
    fn rejects_bare_geometry() {
        let err = FeatureCollection::from_geojson_str(
            r#"{"type":"Point","coordinates":[1,2]}"#,
            &PropertyNames::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MapError::InvalidDocument(_)));
    }

    #[test]
    fn indicator_value_numeric_text() {
        assert_eq!(IndicatorValue::from(" 0.25 ").as_number(), Some(0.25));
        assert_eq!(IndicatorValue::from("x").as_number(), None);
        assert_eq!(IndicatorValue::Number(f64::NAN).as_number(), None);
        assert_eq!(IndicatorValue::Null.as_number(), None);
    }

    #[test]
    fn dataset_from_json_mixed_cells() {
        let ds: IndicatorDataset =
            serde_json::from_str(r#"{"values":{"001":0.7,"002":"x","003":null,"004":true}}"#)
                .unwrap();
        assert_eq!(ds.values["001"], IndicatorValue::Number(0.7));
        assert_eq!(ds.values["002"], IndicatorValue::Text("x".into()));
        assert_eq!(ds.values["003"], IndicatorValue::Null);
        assert_eq!(ds.values["004"].as_number(), None);
    }

    #[test]
    fn data_source_descriptor_camel_case() {
        let src = DataSource::from_json_str(
            r#"{"geoFilePath":"g.json","mapLegendFilePath":"l.json",
                "mapLegendTxt":{"left":"low","right":"high"},"mapLegendImgPath":"img.png"}"#,
        )
        .unwrap();
        assert_eq!(src.geo_file_path, "g.json");
        assert_eq!(src.map_legend_txt.right, "high");
        assert_eq!(src.map_legend_img_path.as_deref(), Some("img.png"));
    }
}
