//! Error types shared by the library.
//!
//! Every fallible operation returns [`MapError`]. Binaries wrap it in `anyhow`
//! with extra context; library code never swallows a failure silently except
//! where a value is documented to default (indicator joins default to `0`).

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while classifying a numeric series.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifyError {
    #[error("cannot classify an empty series")]
    EmptySeries,
    #[error("unknown color palette '{0}'")]
    UnknownPalette(String),
    #[error("palette '{palette}' supports at most {max} classes, {requested} requested")]
    TooManyClasses {
        palette: String,
        requested: usize,
        max: usize,
    },
    #[error("number of classes must be at least 1")]
    ZeroClasses,
    #[error("unknown classification method '{0}' (expected equal_interval, quantile or jenks)")]
    UnknownMethod(String),
}

/// Top-level error for loading, joining, selecting and rendering.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} failed with HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("cannot read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode {what} as JSON")]
    Json {
        what: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid GeoJSON")]
    GeoJson(#[from] geojson::Error),
    #[error("invalid CSV")]
    Csv(#[from] csv::Error),
    #[error("invalid configuration file")]
    Config(#[from] toml::de::Error),
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error("no legend document configured")]
    NoLegend,
    #[error("{0} has not been loaded yet")]
    NotLoaded(&'static str),
    #[error("no feature with join key '{0}'")]
    UnknownFeature(String),
    #[error("rendering failed: {0}")]
    Render(String),
    #[error("{0} worker thread panicked")]
    Worker(&'static str),
}

impl MapError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MapError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(what: impl Into<String>, source: serde_json::Error) -> Self {
        MapError::Json {
            what: what.into(),
            source,
        }
    }
}

pub type Result<T, E = MapError> = std::result::Result<T, E>;
