//! The map context: owned state of one choropleth map.
//!
//! [`MapContext`] holds the geometry, the current classification, the map
//! view (viewport, tile layer, info and attribution controls, legend), the
//! geometry layer with per-feature styles and the selection. All mutation
//! goes through `&mut self`, so the layer and the classification always
//! come from the same indicator snapshot.

pub mod info;
pub mod selection;
pub mod viewport;

pub use info::{DetailPanel, InfoControl, InfoLabels, PanelHistory};
pub use selection::SelectionState;
pub use viewport::{TileLayer, Viewport};

use crate::classify::{Classification, Classifier};
use crate::config::MapConfig;
use crate::error::{MapError, Result};
use crate::legend::{AttributionControl, LegendControl, LegendSlots};
use crate::loader::{LoadOutcome, Loader};
use crate::models::{
    DataSource, FeatureCollection, FeatureProperties, GeoFeature, IndicatorDataset, LegendConfig,
};
use crate::style::{PathStyle, style_for};
use geo::{Contains, Coord, Point, Rect};

/// One styled feature of the geometry layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerEntry {
    /// Index into the geometry's features.
    pub feature: usize,
    pub join_key: String,
    pub style: PathStyle,
    pub highlighted: bool,
}

/// Styled features plus their draw order (last drawn on top).
#[derive(Debug, Clone, PartialEq)]
pub struct GeoLayer {
    entries: Vec<LayerEntry>,
    order: Vec<usize>,
    bounds: Option<Rect<f64>>,
}

impl GeoLayer {
    pub fn entries(&self) -> &[LayerEntry] {
        &self.entries
    }

    pub fn entry(&self, join_key: &str) -> Option<&LayerEntry> {
        self.entries.iter().find(|e| e.join_key == join_key)
    }

    /// Entries bottom to top.
    pub fn draw_order(&self) -> impl DoubleEndedIterator<Item = &LayerEntry> + '_ {
        self.order.iter().map(|&i| &self.entries[i])
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.bounds
    }

    pub fn highlighted(&self) -> impl Iterator<Item = &LayerEntry> + '_ {
        self.entries.iter().filter(|e| e.highlighted)
    }

    fn bring_to_front(&mut self, index: usize) {
        self.order.retain(|&i| i != index);
        self.order.push(index);
    }
}

/// Everything attached to a created map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub viewport: Viewport,
    pub tiles: TileLayer,
    pub info: InfoControl,
    pub attribution: AttributionControl,
    pub legend: Option<LegendControl>,
    layer: Option<GeoLayer>,
}

impl MapView {
    pub fn layer(&self) -> Option<&GeoLayer> {
        self.layer.as_ref()
    }
}

/// Returned once per successful [`MapContext::init`].
#[derive(Debug)]
pub struct Readiness {
    pub features: usize,
    /// Whether the geometry document already carried indicator values.
    pub classified: bool,
    /// The legend document failed to load; the map works without it.
    pub legend_error: Option<MapError>,
    /// The indicator values could not be classified; features are unstyled.
    pub classify_error: Option<MapError>,
}

/// How a dataset matched the geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinReport {
    /// Features with a numeric value.
    pub matched: usize,
    /// Features whose value was present but not numeric (set to 0).
    pub coerced: usize,
    /// Features with no value in the dataset (set to 0).
    pub unmatched: usize,
}

pub struct MapContext {
    config: MapConfig,
    geometry: Option<FeatureCollection>,
    legend: Option<LegendConfig>,
    classification: Option<Classification>,
    view: Option<MapView>,
    selection: SelectionState,
    slots: LegendSlots,
    panel: Option<Box<dyn DetailPanel>>,
}

fn default_style(
    geometry: &FeatureCollection,
    classification: Option<&Classification>,
    feature: usize,
) -> PathStyle {
    style_for(&geometry.features[feature], classification)
}

impl MapContext {
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            geometry: None,
            legend: None,
            classification: None,
            view: None,
            selection: SelectionState::NoSelection,
            slots: LegendSlots::default(),
            panel: None,
        }
    }

    /// Attach the detail panel notified on every info-control update.
    pub fn with_panel(mut self, panel: Box<dyn DetailPanel>) -> Self {
        self.panel = Some(panel);
        self
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn geometry(&self) -> Option<&FeatureCollection> {
        self.geometry.as_ref()
    }

    pub fn legend_config(&self) -> Option<&LegendConfig> {
        self.legend.as_ref()
    }

    pub fn classification(&self) -> Option<&Classification> {
        self.classification.as_ref()
    }

    pub fn view(&self) -> Option<&MapView> {
        self.view.as_ref()
    }

    pub fn layer(&self) -> Option<&GeoLayer> {
        self.view.as_ref().and_then(MapView::layer)
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn legend_slots(&self) -> &LegendSlots {
        &self.slots
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.config.map.width, self.config.map.height)
    }

    /// Classifier settings in effect: configuration defaults, overridden by
    /// the legend document when `prefer_legend_file` is set.
    pub fn classifier(&self) -> Classifier {
        match (&self.legend, self.config.prefer_legend_file) {
            (Some(legend), true) => self.config.classifier.with_legend(legend),
            _ => self.config.classifier.clone(),
        }
    }

    /// Set the legend slots, load both documents and build the map.
    ///
    /// Fails when the geometry cannot be loaded. A legend failure is logged
    /// and reported in [`Readiness::legend_error`].
    pub fn init(&mut self, loader: &Loader, source: &DataSource) -> Result<Readiness> {
        self.set_external_legend(source);
        let outcome = loader.load(source, &self.config.properties);
        self.apply_load(outcome)
    }

    /// Apply the outcome of [`Loader::load`] (or [`Loader::spawn_load`]).
    pub fn apply_load(&mut self, outcome: LoadOutcome) -> Result<Readiness> {
        let legend_error = match outcome.legend {
            Ok(legend) => {
                self.legend = Some(legend);
                None
            }
            Err(e) => {
                log::warn!("legend configuration unavailable: {e}");
                Some(e)
            }
        };
        let features = outcome
            .geometry
            .inspect_err(|e| log::error!("geometry unavailable, map not built: {e}"))?;
        let classify_error = self.set_geometry(features)?;
        Ok(Readiness {
            features: self.geometry.as_ref().map_or(0, FeatureCollection::len),
            classified: self.classification.is_some(),
            legend_error,
            classify_error,
        })
    }

    /// Store a geometry document and build the map and its layer.
    ///
    /// When the document's indicator values cannot be classified the map is
    /// still built, unstyled, and the classification error is returned.
    pub fn set_geometry(&mut self, features: FeatureCollection) -> Result<Option<MapError>> {
        let (classification, classify_error) = if features.has_indicator() {
            match self.classify_series(&features.indicator_series()) {
                Ok(c) => (c, None),
                Err(e) => {
                    log::warn!("indicator values not classified, drawing unstyled: {e}");
                    (None, Some(e))
                }
            }
        } else {
            (None, None)
        };
        self.geometry = Some(features);
        self.classification = classification;
        self.create_map();
        self.create_main_layer()?;
        Ok(classify_error)
    }

    fn classify_series(&self, series: &[f64]) -> Result<Option<Classification>> {
        if series.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.classifier().classify(series)?))
    }

    /// Tear down any existing map and create a fresh view at the default
    /// centre and zoom, with tile layer, info control and attribution.
    pub fn create_map(&mut self) {
        if self.view.take().is_some() {
            log::debug!("removing existing map view");
        }
        let [lat, lon] = self.config.map.center;
        let tiles = self.config.tiles.clone();
        let mut attribution = AttributionControl::default();
        attribution.add(&tiles.attribution);
        self.view = Some(MapView {
            viewport: Viewport::new(lat, lon, self.config.map.default_zoom),
            tiles,
            info: InfoControl::new(self.config.labels.clone()),
            attribution,
            legend: None,
            layer: None,
        });
        // The view was just created, so this cannot fail.
        let _ = self.add_attribution();
    }

    /// Replace the geometry layer with freshly styled features, centre the
    /// viewport on the layer at the default zoom and re-apply the selection.
    pub fn create_main_layer(&mut self) -> Result<()> {
        let geometry = self.geometry.as_ref().ok_or(MapError::NotLoaded("geometry"))?;
        let view = self.view.as_mut().ok_or(MapError::NotLoaded("map"))?;
        if view.layer.is_some() {
            log::debug!("replacing geometry layer");
        }

        let entries: Vec<LayerEntry> = geometry
            .features
            .iter()
            .enumerate()
            .map(|(i, f)| LayerEntry {
                feature: i,
                join_key: f.join_key.clone(),
                style: style_for(f, self.classification.as_ref()),
                highlighted: false,
            })
            .collect();
        let bounds = geometry.bounds();
        view.layer = Some(GeoLayer {
            order: (0..entries.len()).collect(),
            entries,
            bounds,
        });
        if let Some(b) = bounds {
            view.viewport = Viewport {
                center: b.center(),
                zoom: self.config.map.default_zoom,
            };
        }

        if let SelectionState::Selected { join_key } = self.selection.clone() {
            if geometry.position(&join_key).is_some() {
                self.click(&join_key)?;
            } else {
                log::info!("selected feature {join_key} is gone after rebuild; selection cleared");
                self.selection = SelectionState::NoSelection;
                view.info.update(None);
            }
        }
        Ok(())
    }

    /// Join `dataset` onto the geometry, reclassify, then rebuild the layer.
    ///
    /// Every feature's indicator becomes its numeric dataset value, or 0 when
    /// the value is missing or not numeric.
    pub fn update_main_layer(&mut self, dataset: &IndicatorDataset) -> Result<JoinReport> {
        let geometry = self.geometry.as_ref().ok_or(MapError::NotLoaded("geometry"))?;

        let mut report = JoinReport::default();
        let values: Vec<f64> = geometry
            .features
            .iter()
            .map(|f| match dataset.values.get(&f.join_key).map(|c| c.as_number()) {
                Some(Some(v)) => {
                    report.matched += 1;
                    v
                }
                Some(None) => {
                    report.coerced += 1;
                    0.0
                }
                None => {
                    report.unmatched += 1;
                    0.0
                }
            })
            .collect();

        // Classify before touching the features so a failure leaves the
        // previous snapshot intact.
        let classification = self.classify_series(&values)?;

        if let Some(geometry) = self.geometry.as_mut() {
            for (feature, value) in geometry.features.iter_mut().zip(&values) {
                feature.indicator = Some(*value);
            }
        }
        self.classification = classification;
        self.create_main_layer()?;
        self.refresh_legend();

        log::info!(
            "joined {} values: {} matched, {} not numeric, {} missing",
            dataset.len(),
            report.matched,
            report.coerced,
            report.unmatched
        );
        Ok(report)
    }

    fn update_info(&mut self, props: Option<&FeatureProperties>) {
        if let Some(view) = self.view.as_mut() {
            view.info.update(props);
        }
        if let (Some(props), Some(panel)) = (props, self.panel.as_mut()) {
            panel.set_selected_geom(props);
            panel.update_panel();
        }
    }

    /// Select the feature with `join_key`: highlight it, bring it to the
    /// front, show it in the info control and reset every other feature.
    pub fn click(&mut self, join_key: &str) -> Result<()> {
        let geometry = self.geometry.as_ref().ok_or(MapError::NotLoaded("geometry"))?;
        let layer = self
            .view
            .as_mut()
            .and_then(|v| v.layer.as_mut())
            .ok_or(MapError::NotLoaded("geometry layer"))?;
        let selected: Vec<usize> = layer
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.join_key == join_key)
            .map(|(i, _)| i)
            .collect();
        let Some(&first) = selected.first() else {
            return Err(MapError::UnknownFeature(join_key.to_string()));
        };

        let classification = self.classification.as_ref();
        for entry in layer.entries.iter_mut() {
            let base = default_style(geometry, classification, entry.feature);
            if entry.join_key == join_key {
                entry.style = base.merged(&PathStyle::highlight());
                entry.highlighted = true;
            } else {
                entry.style = base;
                entry.highlighted = false;
            }
        }
        for &i in &selected {
            layer.bring_to_front(i);
        }

        let props = geometry.features[layer.entries[first].feature].properties();
        self.selection = SelectionState::Selected {
            join_key: join_key.to_string(),
        };
        self.update_info(Some(&props));
        Ok(())
    }

    /// Pointer left feature `join_key`. Unless it is the selected feature,
    /// reset its style and clear the info control.
    pub fn hover_out(&mut self, join_key: &str) -> Result<()> {
        if self.selection.is_selected(join_key) {
            return Ok(());
        }
        let geometry = self.geometry.as_ref().ok_or(MapError::NotLoaded("geometry"))?;
        let layer = self
            .view
            .as_mut()
            .and_then(|v| v.layer.as_mut())
            .ok_or(MapError::NotLoaded("geometry layer"))?;
        let mut found = false;
        for entry in layer.entries.iter_mut().filter(|e| e.join_key == join_key) {
            entry.style = default_style(geometry, self.classification.as_ref(), entry.feature);
            entry.highlighted = false;
            found = true;
        }
        if !found {
            return Err(MapError::UnknownFeature(join_key.to_string()));
        }
        self.update_info(None);
        Ok(())
    }

    /// Fit the viewport to one feature on a canvas of `size` pixels.
    pub fn zoom_to_feature(&mut self, join_key: &str, size: (u32, u32)) -> Result<()> {
        let bounds = self
            .geometry
            .as_ref()
            .ok_or(MapError::NotLoaded("geometry"))?
            .get(join_key)
            .ok_or_else(|| MapError::UnknownFeature(join_key.to_string()))?
            .bounds()
            .ok_or_else(|| MapError::UnknownFeature(join_key.to_string()))?;
        let view = self.view.as_mut().ok_or(MapError::NotLoaded("map"))?;
        view.viewport = Viewport::fit_bounds(bounds, size, f64::from(view.tiles.max_zoom));
        Ok(())
    }

    /// Topmost feature containing `coord`.
    pub fn feature_at(&self, coord: Coord<f64>) -> Option<&GeoFeature> {
        let geometry = self.geometry.as_ref()?;
        let point = Point::from(coord);
        self.layer()?
            .draw_order()
            .rev()
            .map(|e| &geometry.features[e.feature])
            .find(|f| f.geometry.contains(&point))
    }

    /// Build the static legend from the current classification and attach it.
    pub fn add_legend(&mut self) -> Result<&LegendControl> {
        let legend = LegendControl::build(&self.config.legend_grades, self.classification.as_ref());
        let view = self.view.as_mut().ok_or(MapError::NotLoaded("map"))?;
        let legend = view.legend.insert(legend);
        Ok(&*legend)
    }

    /// Rebuild an attached legend from the current classification.
    fn refresh_legend(&mut self) {
        let grades = &self.config.legend_grades;
        let classification = self.classification.as_ref();
        if let Some(legend) = self.view.as_mut().and_then(|v| v.legend.as_mut()) {
            *legend = LegendControl::build(grades, classification);
        }
    }

    /// Store the data source's legend captions and image.
    pub fn set_external_legend(&mut self, source: &DataSource) {
        self.slots = LegendSlots::from_source(source);
    }

    /// Append the product attribution to the attribution control.
    pub fn add_attribution(&mut self) -> Result<()> {
        let view = self.view.as_mut().ok_or(MapError::NotLoaded("map"))?;
        view.attribution.add(&self.config.attribution);
        Ok(())
    }
}
