//! ivm_map
//!
//! A small Rust library for choropleth maps of a health indicator over
//! administrative areas (by default the IVM-COVID-19 vulnerability index over
//! municipalities). Pairs with the `ivm-map` CLI and the `ivm-map-gui` viewer.
//!
//! ### Features
//! - Load a GeoJSON geometry document and a legend document, locally or over HTTP
//! - Classify the indicator (Jenks natural breaks, quantiles, equal intervals)
//!   into ColorBrewer palettes
//! - Join indicator datasets (CSV or JSON) onto the geometry by key
//! - Select features, highlight them and feed a detail panel
//! - Render the map with legend and attribution to SVG/PNG
//!
//! ### Example
//! ```no_run
//! use ivm_map::{Loader, MapConfig, MapContext, models::DataSource};
//!
//! let source = DataSource::from_path("source.json")?;
//! let mut map = MapContext::new(MapConfig::default());
//! map.init(&Loader::default(), &source)?;
//! map.add_legend()?;
//! map.click("3548500")?;
//! ivm_map::render::render_map(&map, "ivm.svg", &Default::default())?;
//! # Ok::<(), ivm_map::MapError>(())
//! ```

pub mod classify;
pub mod config;
pub mod dataset;
pub mod error;
pub mod legend;
pub mod loader;
pub mod map;
pub mod models;
pub mod palette;
pub mod render;
pub mod stats;
pub mod storage;
pub mod style;
pub mod text;

pub use classify::{Classification, Classifier, Method};
pub use config::MapConfig;
pub use error::{ClassifyError, MapError};
pub use loader::{LoadOutcome, Loader};
pub use map::{DetailPanel, MapContext, SelectionState};
pub use models::{DataSource, FeatureCollection, IndicatorDataset, LegendConfig};
