/// Loading of the geometry and legend documents.
///
/// A location is an `http(s)` URL, a `file://` URL or a plain filesystem
/// path. The two documents of a [`DataSource`] are fetched concurrently and
/// independently: a missing legend never prevents the map from loading.
///
/// Typical usage:
/// ```no_run
/// # use ivm_map::{Loader, models::{DataSource, PropertyNames}};
/// let loader = Loader::default();
/// let source = DataSource::from_path("source.json")?;
/// let outcome = loader.load(&source, &PropertyNames::default());
/// let features = outcome.geometry?;
/// # Ok::<(), ivm_map::MapError>(())
/// ```
use crate::error::{MapError, Result};
use crate::models::{DataSource, FeatureCollection, LegendConfig, PropertyNames};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Loader {
    http: HttpClient,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new().expect("reqwest client build")
    }
}

/// Outcome of loading both documents. Each side succeeds or fails on its own.
#[derive(Debug)]
pub struct LoadOutcome {
    pub geometry: Result<FeatureCollection>,
    pub legend: Result<LegendConfig>,
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

impl Loader {
    pub fn new() -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30)) // total request timeout
            .connect_timeout(Duration::from_secs(10))
            .redirect(Policy::limited(5))
            .user_agent(concat!("ivm_map/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| MapError::Transport {
                url: String::new(),
                source,
            })?;
        Ok(Self { http })
    }

    /// Read a document as text, remote or local.
    pub fn read_text(&self, location: &str) -> Result<String> {
        if is_remote(location) {
            let transport = |source| MapError::Transport {
                url: location.to_string(),
                source,
            };
            let response = self.http.get(location).send().map_err(transport)?;
            if !response.status().is_success() {
                return Err(MapError::HttpStatus {
                    url: location.to_string(),
                    status: response.status().as_u16(),
                });
            }
            response.text().map_err(transport)
        } else {
            let path = location.strip_prefix("file://").unwrap_or(location);
            std::fs::read_to_string(path).map_err(|e| MapError::io(path, e))
        }
    }

    pub fn fetch_geometry(
        &self,
        location: &str,
        names: &PropertyNames,
    ) -> Result<FeatureCollection> {
        let text = self.read_text(location)?;
        let features = FeatureCollection::from_geojson_str(&text, names)?;
        log::info!("loaded {} features from {}", features.len(), location);
        Ok(features)
    }

    pub fn fetch_legend(&self, location: &str) -> Result<LegendConfig> {
        if location.trim().is_empty() {
            return Err(MapError::NoLegend);
        }
        let text = self.read_text(location)?;
        let legend = serde_json::from_str(&text)
            .map_err(|e| MapError::json(format!("legend configuration {location}"), e))?;
        log::info!("loaded legend configuration from {}", location);
        Ok(legend)
    }

    /// Fetch geometry and legend concurrently; both results are returned.
    pub fn load(&self, source: &DataSource, names: &PropertyNames) -> LoadOutcome {
        thread::scope(|s| {
            let geometry = s.spawn(|| self.fetch_geometry(&source.geo_file_path, names));
            let legend = s.spawn(|| self.fetch_legend(&source.map_legend_file_path));
            LoadOutcome {
                geometry: geometry
                    .join()
                    .unwrap_or_else(|_| Err(MapError::Worker("geometry"))),
                legend: legend
                    .join()
                    .unwrap_or_else(|_| Err(MapError::Worker("legend"))),
            }
        })
    }

    /// Run [`Loader::load`] on a background thread. The receiver yields exactly
    /// one outcome.
    pub fn spawn_load(
        &self,
        source: DataSource,
        names: PropertyNames,
    ) -> mpsc::Receiver<LoadOutcome> {
        let (sender, receiver) = mpsc::channel();
        let loader = self.clone();
        thread::spawn(move || {
            let outcome = loader.load(&source, &names);
            let _ = sender.send(outcome);
        });
        receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_detection() {
        assert!(is_remote("https://example.org/a.json"));
        assert!(is_remote("http://example.org/a.json"));
        assert!(!is_remote("file:///tmp/a.json"));
        assert!(!is_remote("data/a.json"));
    }

    #[test]
    fn missing_local_file_is_io_error() {
        let loader = Loader::default();
        let err = loader.read_text("file:///definitely/not/here.json").unwrap_err();
        assert!(matches!(err, MapError::Io { .. }));
    }

    #[test]
    fn empty_legend_location_is_not_fetched() {
        let loader = Loader::default();
        let err = loader.fetch_legend("").unwrap_err();
        assert!(matches!(err, MapError::NoLegend));
    }
}
