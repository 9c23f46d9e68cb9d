//! ColorBrewer sequential and diverging schemes (Cynthia Brewer, colorbrewer2.org).
//!
//! Only the schemes used for health indicators are bundled. Each scheme is a
//! list of class-count variants starting at 3 classes.

use crate::error::ClassifyError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const HIGHLIGHT: Rgb = Rgb::new(0x55, 0x55, 0x55);
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

const MIN_CLASSES: usize = 3;

const RD_YL_GN: &[&[&str]] = &[
    &["#fc8d59", "#ffffbf", "#91cf60"],
    &["#d7191c", "#fdae61", "#a6d96a", "#1a9641"],
    &["#d7191c", "#fdae61", "#ffffbf", "#a6d96a", "#1a9641"],
    &["#d73027", "#fc8d59", "#fee08b", "#d9ef8b", "#91cf60", "#1a9850"],
    &["#d73027", "#fc8d59", "#fee08b", "#ffffbf", "#d9ef8b", "#91cf60", "#1a9850"],
    &["#d73027", "#f46d43", "#fdae61", "#fee08b", "#d9ef8b", "#a6d96a", "#66bd63", "#1a9850"],
    &["#d73027", "#f46d43", "#fdae61", "#fee08b", "#ffffbf", "#d9ef8b", "#a6d96a", "#66bd63", "#1a9850"],
    &["#a50026", "#d73027", "#f46d43", "#fdae61", "#fee08b", "#d9ef8b", "#a6d96a", "#66bd63", "#1a9850", "#006837"],
    &["#a50026", "#d73027", "#f46d43", "#fdae61", "#fee08b", "#ffffbf", "#d9ef8b", "#a6d96a", "#66bd63", "#1a9850", "#006837"],
];

const SPECTRAL: &[&[&str]] = &[
    &["#fc8d59", "#ffffbf", "#99d594"],
    &["#d7191c", "#fdae61", "#abdda4", "#2b83ba"],
    &["#d7191c", "#fdae61", "#ffffbf", "#abdda4", "#2b83ba"],
    &["#d53e4f", "#fc8d59", "#fee08b", "#e6f598", "#99d594", "#3288bd"],
    &["#d53e4f", "#fc8d59", "#fee08b", "#ffffbf", "#e6f598", "#99d594", "#3288bd"],
    &["#d53e4f", "#f46d43", "#fdae61", "#fee08b", "#e6f598", "#abdda4", "#66c2a5", "#3288bd"],
    &["#d53e4f", "#f46d43", "#fdae61", "#fee08b", "#ffffbf", "#e6f598", "#abdda4", "#66c2a5", "#3288bd"],
    &["#9e0142", "#d53e4f", "#f46d43", "#fdae61", "#fee08b", "#e6f598", "#abdda4", "#66c2a5", "#3288bd", "#5e4fa2"],
    &["#9e0142", "#d53e4f", "#f46d43", "#fdae61", "#fee08b", "#ffffbf", "#e6f598", "#abdda4", "#66c2a5", "#3288bd", "#5e4fa2"],
];

const RD_BU: &[&[&str]] = &[
    &["#ef8a62", "#f7f7f7", "#67a9cf"],
    &["#ca0020", "#f4a582", "#92c5de", "#0571b0"],
    &["#ca0020", "#f4a582", "#f7f7f7", "#92c5de", "#0571b0"],
    &["#b2182b", "#ef8a62", "#fddbc7", "#d1e5f0", "#67a9cf", "#2166ac"],
    &["#b2182b", "#ef8a62", "#fddbc7", "#f7f7f7", "#d1e5f0", "#67a9cf", "#2166ac"],
    &["#b2182b", "#d6604d", "#f4a582", "#fddbc7", "#d1e5f0", "#92c5de", "#4393c3", "#2166ac"],
    &["#b2182b", "#d6604d", "#f4a582", "#fddbc7", "#f7f7f7", "#d1e5f0", "#92c5de", "#4393c3", "#2166ac"],
    &["#67001f", "#b2182b", "#d6604d", "#f4a582", "#fddbc7", "#d1e5f0", "#92c5de", "#4393c3", "#2166ac", "#053061"],
    &["#67001f", "#b2182b", "#d6604d", "#f4a582", "#fddbc7", "#f7f7f7", "#d1e5f0", "#92c5de", "#4393c3", "#2166ac", "#053061"],
];

const YL_OR_RD: &[&[&str]] = &[
    &["#ffeda0", "#feb24c", "#f03b20"],
    &["#ffffb2", "#fecc5c", "#fd8d3c", "#e31a1c"],
    &["#ffffb2", "#fecc5c", "#fd8d3c", "#f03b20", "#bd0026"],
    &["#ffffb2", "#fed976", "#feb24c", "#fd8d3c", "#f03b20", "#bd0026"],
    &["#ffffb2", "#fed976", "#feb24c", "#fd8d3c", "#fc4e2a", "#e31a1c", "#b10026"],
    &["#ffffcc", "#ffeda0", "#fed976", "#feb24c", "#fd8d3c", "#fc4e2a", "#e31a1c", "#b10026"],
    &["#ffffcc", "#ffeda0", "#fed976", "#feb24c", "#fd8d3c", "#fc4e2a", "#e31a1c", "#bd0026", "#800026"],
];

const BLUES: &[&[&str]] = &[
    &["#deebf7", "#9ecae1", "#3182bd"],
    &["#eff3ff", "#bdd7e7", "#6baed6", "#2171b5"],
    &["#eff3ff", "#bdd7e7", "#6baed6", "#3182bd", "#08519c"],
    &["#eff3ff", "#c6dbef", "#9ecae1", "#6baed6", "#3182bd", "#08519c"],
    &["#eff3ff", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#084594"],
    &["#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#084594"],
    &["#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#08519c", "#08306b"],
];

const REDS: &[&[&str]] = &[
    &["#fee0d2", "#fc9272", "#de2d26"],
    &["#fee5d9", "#fcae91", "#fb6a4a", "#cb181d"],
    &["#fee5d9", "#fcae91", "#fb6a4a", "#de2d26", "#a50f15"],
    &["#fee5d9", "#fcbba1", "#fc9272", "#fb6a4a", "#de2d26", "#a50f15"],
    &["#fee5d9", "#fcbba1", "#fc9272", "#fb6a4a", "#ef3b2c", "#cb181d", "#99000d"],
    &["#fff5f0", "#fee0d2", "#fcbba1", "#fc9272", "#fb6a4a", "#ef3b2c", "#cb181d", "#99000d"],
    &["#fff5f0", "#fee0d2", "#fcbba1", "#fc9272", "#fb6a4a", "#ef3b2c", "#cb181d", "#a50f15", "#67000d"],
];

/// Names of the bundled schemes.
pub const PALETTES: [&str; 6] = ["RdYlGn", "Spectral", "RdBu", "YlOrRd", "Blues", "Reds"];

fn scheme(name: &str) -> Option<&'static [&'static [&'static str]]> {
    match name {
        "RdYlGn" => Some(RD_YL_GN),
        "Spectral" => Some(SPECTRAL),
        "RdBu" => Some(RD_BU),
        "YlOrRd" => Some(YL_OR_RD),
        "Blues" => Some(BLUES),
        "Reds" => Some(REDS),
        _ => None,
    }
}

/// Largest class count a scheme provides.
pub fn max_classes(name: &str) -> Result<usize, ClassifyError> {
    scheme(name)
        .map(|s| MIN_CLASSES + s.len() - 1)
        .ok_or_else(|| ClassifyError::UnknownPalette(name.to_string()))
}

/// Colors for `classes` classes of scheme `name`, lowest class first.
///
/// Below three classes the 3-class variant is sampled evenly.
pub fn colors(name: &str, classes: usize) -> Result<Vec<Rgb>, ClassifyError> {
    let variants = scheme(name).ok_or_else(|| ClassifyError::UnknownPalette(name.to_string()))?;
    if classes == 0 {
        return Err(ClassifyError::ZeroClasses);
    }
    let max = MIN_CLASSES + variants.len() - 1;
    if classes > max {
        return Err(ClassifyError::TooManyClasses {
            palette: name.to_string(),
            requested: classes,
            max,
        });
    }

    let hexes: Vec<&str> = if classes >= MIN_CLASSES {
        variants[classes - MIN_CLASSES].to_vec()
    } else {
        let base = variants[0];
        if classes == 1 {
            vec![base[base.len() / 2]]
        } else {
            (0..classes)
                .map(|i| base[i * (base.len() - 1) / (classes - 1)])
                .collect()
        }
    };

    // Tables are static and well-formed.
    Ok(hexes.into_iter().filter_map(Rgb::from_hex).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_matching_length() {
        for name in PALETTES {
            let max = max_classes(name).unwrap();
            for k in 1..=max {
                assert_eq!(colors(name, k).unwrap().len(), k, "{name} with {k} classes");
            }
        }
    }

    #[test]
    fn small_class_counts_sample_the_three_class_scheme() {
        let two = colors("RdYlGn", 2).unwrap();
        assert_eq!(two, vec![Rgb::from_hex("#fc8d59").unwrap(), Rgb::from_hex("#91cf60").unwrap()]);
        let one = colors("RdYlGn", 1).unwrap();
        assert_eq!(one[0].to_hex(), "#ffffbf");
    }

    #[test]
    fn limits_are_reported() {
        assert_eq!(
            colors("Blues", 10).unwrap_err(),
            ClassifyError::TooManyClasses {
                palette: "Blues".into(),
                requested: 10,
                max: 9
            }
        );
        assert!(matches!(colors("Nope", 5), Err(ClassifyError::UnknownPalette(_))));
        assert_eq!(colors("Reds", 0).unwrap_err(), ClassifyError::ZeroClasses);
    }

    #[test]
    fn hex_round_trip() {
        let c = Rgb::from_hex("#A50026").unwrap();
        assert_eq!(c, Rgb::new(0xa5, 0x00, 0x26));
        assert_eq!(c.to_hex(), "#a50026");
        assert!(Rgb::from_hex("#12345").is_none());
    }
}
