//! Info control (the on-map box describing the selected feature) and the
//! detail panel collaborator it feeds.

use crate::models::FeatureProperties;
use serde::{Deserialize, Serialize};

/// Texts of the info control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoLabels {
    pub placeholder: String,
    pub value_label: String,
    pub missing: String,
    pub range_hint: String,
}

impl Default for InfoLabels {
    fn default() -> Self {
        Self {
            placeholder: "Select a municipality".into(),
            value_label: "Index value".into(),
            missing: "not available".into(),
            range_hint: "(between 0 and 1)".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfoControl {
    labels: InfoLabels,
    content: Option<FeatureProperties>,
}

impl InfoControl {
    pub fn new(labels: InfoLabels) -> Self {
        Self {
            labels,
            content: None,
        }
    }

    /// Show `props`, or the placeholder when `None`.
    pub fn update(&mut self, props: Option<&FeatureProperties>) {
        self.content = props.cloned();
    }

    pub fn content(&self) -> Option<&FeatureProperties> {
        self.content.as_ref()
    }

    pub fn shows_placeholder(&self) -> bool {
        self.content.is_none()
    }

    fn value_text(&self, props: &FeatureProperties) -> String {
        match props.indicator {
            Some(v) if v >= 0.0 => format!("{v:.2}"),
            _ => self.labels.missing.clone(),
        }
    }

    /// Plain-text lines, for renderers without HTML.
    pub fn lines(&self) -> Vec<String> {
        match &self.content {
            None => vec![self.labels.placeholder.clone()],
            Some(p) => vec![
                p.name.clone(),
                format!(
                    "{}: {} {}",
                    self.labels.value_label,
                    self.value_text(p),
                    self.labels.range_hint
                )
                .trim_end()
                .to_string(),
            ],
        }
    }

    pub fn html(&self) -> String {
        match &self.content {
            None => self.labels.placeholder.clone(),
            Some(p) => format!(
                "<b>{}</b><br />{}: {} {}",
                p.name,
                self.labels.value_label,
                self.value_text(p),
                self.labels.range_hint
            )
            .trim_end()
            .to_string(),
        }
    }
}

/// External panel that shows details of the selected feature.
///
/// Called on every info-control update that carries properties.
pub trait DetailPanel: Send {
    fn set_selected_geom(&mut self, props: &FeatureProperties);
    fn update_panel(&mut self);
}

/// Panel that only remembers what it was told. Used by the CLI and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelHistory {
    pub selected: Option<FeatureProperties>,
    pub updates: usize,
}

impl DetailPanel for PanelHistory {
    fn set_selected_geom(&mut self, props: &FeatureProperties) {
        self.selected = Some(props.clone());
    }

    fn update_panel(&mut self) {
        self.updates += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(indicator: Option<f64>) -> FeatureProperties {
        FeatureProperties {
            join_key: "001".into(),
            name: "Santos".into(),
            indicator,
            extra: Default::default(),
        }
    }

    #[test]
    fn placeholder_then_content() {
        let mut info = InfoControl::new(InfoLabels::default());
        assert_eq!(info.html(), "Select a municipality");
        info.update(Some(&props(Some(0.456))));
        assert_eq!(
            info.html(),
            "<b>Santos</b><br />Index value: 0.46 (between 0 and 1)"
        );
        assert_eq!(info.lines()[1], "Index value: 0.46 (between 0 and 1)");
        info.update(None);
        assert!(info.shows_placeholder());
    }

    #[test]
    fn missing_value_text() {
        let mut info = InfoControl::new(InfoLabels {
            range_hint: String::new(),
            ..Default::default()
        });
        info.update(Some(&props(None)));
        assert_eq!(info.lines()[1], "Index value: not available");
        info.update(Some(&props(Some(-1.0))));
        assert_eq!(info.lines()[1], "Index value: not available");
    }
}
