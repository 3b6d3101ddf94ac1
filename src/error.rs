//! Error types for waypoint reading, writing and export.

use std::path::PathBuf;

/// Errors raised by the codec and export layers.
///
/// The pipeline itself cannot fail; every variant here comes from a file
/// being read or written.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed GPX in {path}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: quick_xml::Error,
    },

    #[error("waypoint in {path} is missing the `{attribute}` attribute")]
    MissingAttribute { path: PathBuf, attribute: &'static str },

    #[error("invalid coordinate `{value}` in {path}")]
    InvalidCoordinate { path: PathBuf, value: String },

    #[error("coordinate ({lat}, {lon}) in {path} is out of range")]
    OutOfRange { path: PathBuf, lat: f64, lon: f64 },

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub(crate) fn xml(path: impl Into<PathBuf>, source: impl Into<quick_xml::Error>) -> Self {
        Error::Xml { path: path.into(), source: source.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
