/*!
 * Desktop viewer for ivm-map
 *
 * Loads a data source in the background, shows the choropleth, and lets the
 * user select municipalities, join indicator files and export the result.
 *
 * Platform support: Windows, macOS, Linux
 */

use eframe::egui;
use ivm_map::legend::html_to_text;
use ivm_map::map::PanelHistory;
use ivm_map::models::{DataSource, FeatureProperties};
use ivm_map::{
    DetailPanel, LoadOutcome, Loader, MapConfig, MapContext, MapError, dataset, render, storage,
};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([700.0, 450.0])
            .with_title("IVM-COVID-19 map"),
        ..Default::default()
    };

    eframe::run_native(
        "IVM map",
        options,
        Box::new(|_cc| Ok(Box::new(IvmApp::new()))),
    )
}

/// Detail panel shared between the map context and the side panel.
#[derive(Clone, Default)]
struct SharedPanel(Arc<Mutex<PanelHistory>>);

impl DetailPanel for SharedPanel {
    fn set_selected_geom(&mut self, props: &FeatureProperties) {
        if let Ok(mut panel) = self.0.lock() {
            panel.set_selected_geom(props);
        }
    }

    fn update_panel(&mut self) {
        if let Ok(mut panel) = self.0.lock() {
            panel.update_panel();
        }
    }
}

struct IvmApp {
    // Inputs
    source_path: String,
    config_path: String,
    data_path: String,
    key_col: String,
    value_col: String,
    export_dir: String,

    map: MapContext,
    panel: SharedPanel,

    // Map image
    texture: Option<egui::TextureHandle>,
    texture_size: [usize; 2],
    dirty: bool,
    hovered: Option<String>,

    // UI state
    status_message: String,
    error_message: String,

    // Background load
    load_receiver: Option<mpsc::Receiver<LoadOutcome>>,
}

impl IvmApp {
    fn new() -> Self {
        let export_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .to_string_lossy()
            .to_string();
        let panel = SharedPanel::default();

        Self {
            source_path: String::new(),
            config_path: String::new(),
            data_path: String::new(),
            key_col: "gc".to_string(),
            value_col: "indicator".to_string(),
            export_dir,
            map: MapContext::new(MapConfig::default()).with_panel(Box::new(panel.clone())),
            panel,
            texture: None,
            texture_size: [0, 0],
            dirty: true,
            hovered: None,
            status_message: String::new(),
            error_message: String::new(),
            load_receiver: None,
        }
    }

    fn is_loading(&self) -> bool {
        self.load_receiver.is_some()
    }

    fn start_load(&mut self) {
        self.error_message.clear();
        let config = if self.config_path.trim().is_empty() {
            MapConfig::default()
        } else {
            match MapConfig::load_from_file(PathBuf::from(self.config_path.trim()).as_path()) {
                Ok(c) => c,
                Err(err) => {
                    self.error_message = format!("Configuration error: {err}");
                    return;
                }
            }
        };
        let source = match DataSource::from_path(self.source_path.trim()) {
            Ok(s) => s,
            Err(err) => {
                self.error_message = format!("Cannot read data source: {err}");
                return;
            }
        };

        self.panel = SharedPanel::default();
        self.map = MapContext::new(config).with_panel(Box::new(self.panel.clone()));
        self.map.set_external_legend(&source);
        self.hovered = None;
        self.dirty = true;
        self.status_message = format!("Loading {}...", source.geo_file_path);

        let names = self.map.config().properties.clone();
        self.load_receiver = Some(Loader::default().spawn_load(source, names));
    }

    fn check_load_result(&mut self) {
        let Some(receiver) = &self.load_receiver else {
            return;
        };
        let outcome = match receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(mpsc::TryRecvError::Empty) => return,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.load_receiver = None;
                self.status_message.clear();
                self.error_message = "Loader stopped without a result".to_string();
                return;
            }
        };
        self.load_receiver = None;
        self.dirty = true;

        match self.map.apply_load(outcome) {
            Ok(ready) => {
                if let Err(err) = self.map.add_legend() {
                    log::warn!("legend not added: {err}");
                }
                self.status_message = format!("Loaded {} features", ready.features);
                match ready.legend_error {
                    Some(MapError::NoLegend) | None => {}
                    Some(err) => self.error_message = format!("Legend unavailable: {err}"),
                }
                if let Some(err) = ready.classify_error {
                    self.error_message = format!("Indicator values not classified: {err}");
                }
            }
            Err(err) => {
                self.status_message.clear();
                self.error_message = format!("Failed to load map: {err}");
            }
        }
    }

    fn join_data(&mut self) {
        let path = PathBuf::from(self.data_path.trim());
        let result = dataset::read(&path, &self.key_col, &self.value_col)
            .and_then(|data| self.map.update_main_layer(&data));
        match result {
            Ok(report) => {
                self.error_message.clear();
                self.status_message = format!(
                    "Joined {}: {} matched, {} not numeric, {} missing",
                    path.display(),
                    report.matched,
                    report.coerced,
                    report.unmatched
                );
                self.dirty = true;
            }
            Err(err) => self.error_message = format!("Join failed: {err}"),
        }
    }

    fn export(&mut self) {
        let Some(geometry) = self.map.geometry() else {
            self.error_message = "Nothing to export yet".to_string();
            return;
        };
        let rows = storage::rows(geometry, self.map.classification());
        let path = PathBuf::from(&self.export_dir).join("ivm_features.csv");
        match storage::save_csv(&rows, &path) {
            Ok(()) => {
                self.error_message.clear();
                self.status_message = format!("Saved {} rows to {}", rows.len(), path.display());
            }
            Err(err) => self.error_message = format!("Failed to save CSV: {err}"),
        }
    }

    fn refresh_texture(&mut self, ctx: &egui::Context, size: [usize; 2]) {
        if !self.dirty && self.texture_size == size && self.texture.is_some() {
            return;
        }
        let Some(viewport) = self.map.view().map(|v| v.viewport) else {
            return;
        };
        match render::render_rgb(&self.map, &viewport, (size[0] as u32, size[1] as u32)) {
            Ok(buf) => {
                let image = egui::ColorImage::from_rgb(size, &buf);
                match &mut self.texture {
                    Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                    None => {
                        self.texture =
                            Some(ctx.load_texture("map", image, egui::TextureOptions::LINEAR))
                    }
                }
                self.texture_size = size;
                self.dirty = false;
            }
            Err(err) => self.error_message = format!("Render failed: {err}"),
        }
    }

    fn feature_under(&self, pos: egui::Pos2, rect: egui::Rect) -> Option<String> {
        let view = self.map.view()?;
        let size = (rect.width() as u32, rect.height() as u32);
        let local = pos - rect.min;
        let coord = view
            .viewport
            .unproject((f64::from(local.x), f64::from(local.y)), size);
        self.map.feature_at(coord).map(|f| f.join_key.clone())
    }

    fn map_ui(&mut self, ui: &mut egui::Ui) {
        if self.map.layer().is_none() {
            ui.centered_and_justified(|ui| {
                if self.is_loading() {
                    ui.spinner();
                } else {
                    ui.label("Open a data source to show the map");
                }
            });
            return;
        }

        let avail = ui.available_size();
        let size = [avail.x.max(1.0) as usize, avail.y.max(1.0) as usize];
        self.refresh_texture(ui.ctx(), size);
        let (rect, response) = ui.allocate_exact_size(avail, egui::Sense::click());
        if let Some(texture) = &self.texture {
            ui.painter().image(
                texture.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }

        let under = response.hover_pos().and_then(|p| self.feature_under(p, rect));
        if under != self.hovered {
            if let Some(previous) = self.hovered.take() {
                match self.map.hover_out(&previous) {
                    Ok(()) => self.dirty = true,
                    Err(err) => log::debug!("hover-out ignored: {err}"),
                }
            }
            self.hovered = under;
        }

        if response.clicked() {
            if let Some(key) = response
                .interact_pointer_pos()
                .and_then(|p| self.feature_under(p, rect))
            {
                match self.map.click(&key) {
                    Ok(()) => self.dirty = true,
                    Err(err) => self.error_message = format!("Selection failed: {err}"),
                }
            }
        }
    }

    fn details_ui(&mut self, ui: &mut egui::Ui) {
        ui.heading("Details");
        if let Some(view) = self.map.view() {
            for line in view.info.lines() {
                ui.label(line);
            }
        }

        if let Ok(panel) = self.panel.0.lock() {
            if let Some(props) = &panel.selected {
                ui.add_space(6.0);
                ui.label(format!("Code: {}", props.join_key));
                for (k, v) in &props.extra {
                    ui.label(format!("{k}: {v}"));
                }
            }
        }

        let selected = self.map.selection().join_key().map(str::to_string);
        ui.horizontal(|ui| {
            if ui
                .add_enabled(selected.is_some(), egui::Button::new("Zoom to selection"))
                .clicked()
            {
                if let Some(key) = &selected {
                    let size = (self.texture_size[0] as u32, self.texture_size[1] as u32);
                    if let Err(err) = self.map.zoom_to_feature(key, size) {
                        self.error_message = format!("Zoom failed: {err}");
                    }
                    self.dirty = true;
                }
            }
            if ui.button("Reset view").clicked() {
                if let Err(err) = self.map.create_main_layer() {
                    self.error_message = format!("Reset failed: {err}");
                }
                self.dirty = true;
            }
        });

        ui.separator();
        ui.heading("Legend");
        if let Some(legend) = self.map.view().and_then(|v| v.legend.as_ref()) {
            for row in &legend.rows {
                ui.horizontal(|ui| {
                    let (swatch, _) =
                        ui.allocate_exact_size(egui::vec2(16.0, 16.0), egui::Sense::hover());
                    if let Some(c) = row.color {
                        ui.painter()
                            .rect_filled(swatch, 0.0, egui::Color32::from_rgb(c.r, c.g, c.b));
                    }
                    ui.label(row.label());
                });
            }
        }
        let slots = self.map.legend_slots();
        if !slots.left_html.is_empty() || !slots.right_html.is_empty() {
            ui.horizontal(|ui| {
                ui.label(html_to_text(&slots.left_html));
                ui.label(html_to_text(&slots.right_html));
            });
        }
        if let Some(image) = &slots.image {
            ui.label(format!("Legend image: {image}"));
        }

        ui.separator();
        if let Some(view) = self.map.view() {
            ui.small(view.attribution.text());
        }
    }
}

impl eframe::App for IvmApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_result();
        if self.is_loading() {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Data source:");
                ui.text_edit_singleline(&mut self.source_path)
                    .on_hover_text("JSON descriptor with geoFilePath and mapLegendFilePath");
                if ui.button("Browse").clicked()
                    && let Some(path) = rfd::FileDialog::new()
                        .add_filter("JSON", &["json"])
                        .pick_file()
                {
                    self.source_path = path.to_string_lossy().to_string();
                }
                ui.label("Config:");
                ui.text_edit_singleline(&mut self.config_path)
                    .on_hover_text("Optional TOML configuration");
                if ui
                    .add_enabled(!self.is_loading(), egui::Button::new("Load"))
                    .clicked()
                {
                    self.start_load();
                }
                if self.is_loading() {
                    ui.spinner();
                }
            });

            ui.horizontal(|ui| {
                ui.label("Indicator data:");
                ui.text_edit_singleline(&mut self.data_path);
                if ui.button("Browse").clicked()
                    && let Some(path) = rfd::FileDialog::new()
                        .add_filter("Data", &["csv", "json"])
                        .pick_file()
                {
                    self.data_path = path.to_string_lossy().to_string();
                }
                ui.label("Key:");
                ui.add(egui::TextEdit::singleline(&mut self.key_col).desired_width(60.0));
                ui.label("Value:");
                ui.add(egui::TextEdit::singleline(&mut self.value_col).desired_width(80.0));
                let ready = self.map.geometry().is_some() && !self.data_path.trim().is_empty();
                if ui.add_enabled(ready, egui::Button::new("Join")).clicked() {
                    self.join_data();
                }
            });

            ui.horizontal(|ui| {
                ui.label("Export to:");
                ui.text_edit_singleline(&mut self.export_dir);
                if ui.button("Browse").clicked()
                    && let Some(path) = rfd::FileDialog::new().pick_folder()
                {
                    self.export_dir = path.to_string_lossy().to_string();
                }
                if ui
                    .add_enabled(self.map.geometry().is_some(), egui::Button::new("Export CSV"))
                    .clicked()
                {
                    self.export();
                }
            });

            if !self.status_message.is_empty() {
                ui.colored_label(egui::Color32::DARK_GREEN, &self.status_message);
            }
            if !self.error_message.is_empty() {
                ui.colored_label(egui::Color32::RED, &self.error_message);
            }
        });

        egui::SidePanel::right("details")
            .min_width(240.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.details_ui(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| self.map_ui(ui));
    }
}
