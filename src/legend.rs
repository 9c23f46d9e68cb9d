//! Legend control, external legend slots and attribution.

use crate::classify::Classification;
use crate::models::DataSource;
use crate::palette::Rgb;
use serde::{Deserialize, Serialize};

/// Lower bounds of the static legend rows.
pub const DEFAULT_GRADES: [f64; 8] = [0.0, 0.1, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8];

/// Offset added to a grade before asking the classifier for its color, so the
/// lookup lands inside the class rather than on its lower breakpoint.
const GRADE_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendRow {
    pub from: f64,
    pub to: Option<f64>,
    pub color: Option<Rgb>,
}

impl LegendRow {
    /// `from–to`, or `from+` for the last row.
    pub fn label(&self) -> String {
        match self.to {
            Some(to) => format!("{}\u{2013}{}", self.from, to),
            None => format!("{}+", self.from),
        }
    }
}

/// The static bottom-right legend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegendControl {
    pub rows: Vec<LegendRow>,
}

impl LegendControl {
    pub fn build(grades: &[f64], classification: Option<&Classification>) -> Self {
        let rows = grades
            .iter()
            .enumerate()
            .map(|(i, &from)| LegendRow {
                from,
                to: grades.get(i + 1).copied(),
                color: classification.and_then(|c| c.color(from + GRADE_EPSILON)),
            })
            .collect();
        Self { rows }
    }

    pub fn to_html(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                let bg = row.color.map(|c| c.to_hex()).unwrap_or_default();
                let label = match row.to {
                    Some(to) => format!("{}&ndash;{}", row.from, to),
                    None => format!("{}+", row.from),
                };
                format!("<i style=\"background:{bg}\"></i> {label}")
            })
            .collect::<Vec<_>>()
            .join("<br>")
    }
}

/// Legend captions and image supplied by the data source, shown outside the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendSlots {
    pub left_html: String,
    pub right_html: String,
    pub image: Option<String>,
}

impl LegendSlots {
    pub fn from_source(source: &DataSource) -> Self {
        Self {
            left_html: source.map_legend_txt.left.clone(),
            right_html: source.map_legend_txt.right.clone(),
            image: source.map_legend_img_path.clone(),
        }
    }
}

/// Attribution strings (HTML) shown in the corner of the map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributionControl {
    entries: Vec<String>,
}

impl AttributionControl {
    /// Add `text` unless it is already present.
    pub fn add(&mut self, text: &str) {
        if !text.is_empty() && !self.entries.iter().any(|e| e == text) {
            self.entries.push(text.to_string());
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn html(&self) -> String {
        self.entries.join(" | ")
    }

    pub fn text(&self) -> String {
        html_to_text(&self.html())
    }
}

/// Strip tags and decode the handful of entities used in captions.
pub fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.replace("&copy;", "\u{a9}")
        .replace("&ndash;", "\u{2013}")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Classifier, Method};

    #[test]
    fn rows_use_grade_plus_epsilon() {
        let brew = Classifier::new(5, Method::EqualInterval, "RdYlGn")
            .classify(&[0.0, 0.2, 0.4, 0.6, 0.8, 1.0])
            .unwrap();
        let legend = LegendControl::build(&DEFAULT_GRADES, Some(&brew));
        assert_eq!(legend.rows.len(), 8);
        assert_eq!(legend.rows[0].color, brew.color(0.01));
        assert_eq!(legend.rows[7].label(), "0.8+");
        assert_eq!(legend.rows[1].label(), "0.1\u{2013}0.3");
        assert!(legend.to_html().contains("0.1&ndash;0.3"));
    }

    #[test]
    fn rows_without_classification_are_blank() {
        let legend = LegendControl::build(&[0.0, 0.5], None);
        assert!(legend.rows.iter().all(|r| r.color.is_none()));
        assert_eq!(legend.to_html(), "<i style=\"background:\"></i> 0&ndash;0.5<br><i style=\"background:\"></i> 0.5+");
    }

    #[test]
    fn attribution_is_idempotent() {
        let mut a = AttributionControl::default();
        a.add("IVM &copy; <a href=\"x\">INPE</a>");
        a.add("IVM &copy; <a href=\"x\">INPE</a>");
        assert_eq!(a.entries().len(), 1);
        assert_eq!(a.text(), "IVM \u{a9} INPE");
    }
}
