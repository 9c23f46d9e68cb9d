//! TOML configuration. Every field has a default, so an empty file (or no
//! file at all) gives the stock IVM map.
//!
//! ```toml
//! prefer_legend_file = false
//! attribution = "IVM-COVID-19 &copy; INPE"
//!
//! [classifier]
//! classes = 7
//! method = "quantile"
//! palette = "YlOrRd"
//!
//! [map]
//! center = [-23.0, -45.0]
//! default_zoom = 8
//!
//! [properties]
//! join_key = "gc"
//! ```

use crate::classify::Classifier;
use crate::error::{MapError, Result};
use crate::legend::DEFAULT_GRADES;
use crate::map::info::InfoLabels;
use crate::map::viewport::TileLayer;
use crate::models::PropertyNames;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub classifier: Classifier,
    /// Take palette/classes/method from the legend document when it has them.
    pub prefer_legend_file: bool,
    pub map: MapSettings,
    pub tiles: TileLayer,
    pub properties: PropertyNames,
    pub labels: InfoLabels,
    /// Product attribution appended to the attribution control.
    pub attribution: String,
    /// Lower bounds of the rows of the static legend.
    pub legend_grades: Vec<f64>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            classifier: Classifier::default(),
            prefer_legend_file: false,
            map: MapSettings::default(),
            tiles: TileLayer::default(),
            properties: PropertyNames::default(),
            labels: InfoLabels::default(),
            attribution: r#"IVM-COVID-19 &copy; <a href="http://www.inpe.br/">INPE</a>"#.into(),
            legend_grades: DEFAULT_GRADES.to_vec(),
        }
    }
}

/// Initial view and canvas size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    /// `[lat, lon]` of the initial view.
    pub center: [f64; 2],
    pub default_zoom: f64,
    pub width: u32,
    pub height: u32,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            center: [-23.0, -45.0],
            default_zoom: 8.0,
            width: 1000,
            height: 700,
        }
    }
}

impl MapConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| MapError::io(path, e))?;
        let config = Self::from_toml_str(&content)?;
        log::info!("loaded configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Method;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(MapConfig::from_toml_str("").unwrap(), MapConfig::default());
    }

    #[test]
    fn partial_sections() {
        let cfg = MapConfig::from_toml_str(
            r#"
            prefer_legend_file = true
            [classifier]
            method = "quantile"
            [map]
            default_zoom = 6
            [properties]
            join_key = "geocode"
            "#,
        )
        .unwrap();
        assert!(cfg.prefer_legend_file);
        assert_eq!(cfg.classifier.method, Method::Quantile);
        assert_eq!(cfg.classifier.classes, 10);
        assert_eq!(cfg.map.default_zoom, 6.0);
        assert_eq!(cfg.map.center, [-23.0, -45.0]);
        assert_eq!(cfg.properties.join_key, "geocode");
        assert_eq!(cfg.properties.name, "nm");
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = MapConfig::from_toml_str("classifier = 3").unwrap_err();
        assert!(matches!(err, MapError::Config(_)));
    }
}
