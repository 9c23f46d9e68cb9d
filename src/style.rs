//! Path styles for features: default (classified), highlighted and neutral.
//!
//! Styles are partial: an unset field means "renderer default", which is how
//! the neutral style of an unclassified feature is expressed.

use crate::classify::Classification;
use crate::models::GeoFeature;
use crate::palette::Rgb;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathStyle {
    pub weight: Option<f64>,
    pub opacity: Option<f64>,
    pub color: Option<Rgb>,
    /// SVG dash pattern; `Some("")` clears an inherited pattern.
    pub dash_array: Option<String>,
    pub fill_opacity: Option<f64>,
    pub fill_color: Option<Rgb>,
}

impl PathStyle {
    /// Style with every field unset.
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    /// Classified fill with a thin dashed white border.
    pub fn classified(fill_color: Option<Rgb>) -> Self {
        Self {
            weight: Some(2.0),
            opacity: Some(1.0),
            color: Some(Rgb::WHITE),
            dash_array: Some("3".into()),
            fill_opacity: Some(1.0),
            fill_color,
        }
    }

    /// Partial style applied on top of the default style of a selected feature.
    pub fn highlight() -> Self {
        Self {
            weight: Some(3.0),
            opacity: None,
            color: Some(Rgb::HIGHLIGHT),
            dash_array: Some(String::new()),
            fill_opacity: Some(1.0),
            fill_color: None,
        }
    }

    /// Overlay the set fields of `other` onto `self`.
    pub fn merged(&self, other: &PathStyle) -> PathStyle {
        PathStyle {
            weight: other.weight.or(self.weight),
            opacity: other.opacity.or(self.opacity),
            color: other.color.or(self.color),
            dash_array: other.dash_array.clone().or_else(|| self.dash_array.clone()),
            fill_opacity: other.fill_opacity.or(self.fill_opacity),
            fill_color: other.fill_color.or(self.fill_color),
        }
    }

    /// Dash pattern as stroke/gap lengths; empty when solid.
    pub fn dash_pattern(&self) -> Vec<f64> {
        self.dash_array
            .as_deref()
            .unwrap_or("")
            .split([',', ' '])
            .filter_map(|s| s.trim().parse::<f64>().ok())
            .filter(|v| *v > 0.0)
            .collect()
    }
}

/// Default style of a feature: neutral when it has no indicator value,
/// otherwise filled with the color of its class.
pub fn style_for(feature: &GeoFeature, classification: Option<&Classification>) -> PathStyle {
    match feature.indicator {
        None => PathStyle::neutral(),
        Some(v) => PathStyle::classified(classification.and_then(|c| c.color(v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Classifier, Method};
    use geo::MultiPolygon;

    fn feature(indicator: Option<f64>) -> GeoFeature {
        GeoFeature {
            id: "0".into(),
            name: "A".into(),
            join_key: "001".into(),
            geometry: MultiPolygon::new(vec![]),
            indicator,
            properties: Default::default(),
        }
    }

    #[test]
    fn neutral_iff_no_indicator() {
        let brew = Classifier::new(3, Method::Quantile, "RdYlGn")
            .classify(&[0.0, 0.5, 1.0])
            .unwrap();
        assert!(style_for(&feature(None), Some(&brew)).is_neutral());
        assert!(style_for(&feature(None), None).is_neutral());

        let s = style_for(&feature(Some(0.5)), Some(&brew));
        assert!(!s.is_neutral());
        assert_eq!(s.weight, Some(2.0));
        assert_eq!(s.fill_color, brew.color(0.5));

        // Out-of-range value still gets the border, without a fill color.
        let s = style_for(&feature(Some(9.0)), Some(&brew));
        assert!(!s.is_neutral());
        assert_eq!(s.fill_color, None);
    }

    #[test]
    fn highlight_keeps_fill() {
        let base = PathStyle::classified(Some(Rgb::new(1, 2, 3)));
        let h = base.merged(&PathStyle::highlight());
        assert_eq!(h.weight, Some(3.0));
        assert_eq!(h.color, Some(Rgb::HIGHLIGHT));
        assert_eq!(h.fill_color, Some(Rgb::new(1, 2, 3)));
        assert_eq!(h.opacity, Some(1.0));
        assert!(h.dash_pattern().is_empty());
        assert_eq!(base.dash_pattern(), vec![3.0]);
    }
}
