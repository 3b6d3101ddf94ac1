//! # Waypoint Dedup
//!
//! Deduplication, region split and short-name generation for fishing-spot
//! waypoints stored in GPX files.
//!
//! This library provides:
//! - Great-circle distance and a greedy, order-preserving duplicate filter
//! - West/east region partitioning by longitude, per source collection
//! - Reef category classification from free-text labels
//! - Collision-free short names (`사각_001`, `사각_002`, ...) per region
//! - GPX reading/writing plus CSV/JSON export and statistics
//!
//! ## Features
//!
//! - **`parallel`** - Build the duplicate-pair report with rayon
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use waypoint_dedup::{
//!     CategoryTable, DedupConfig, Pipeline, Region, RegionPolicy, SourceCollection,
//!     SourceKind, Waypoint,
//! };
//!
//! let reef = |lat: f64, lon: f64, name: &str| {
//!     Waypoint::new(lat, lon, SourceKind::Reef).with_name(name)
//! };
//!
//! let west = SourceCollection::new(
//!     "chungnam_points.gpx",
//!     SourceKind::Reef,
//!     RegionPolicy::Static(Region::West),
//!     vec![
//!         reef(36.5000, 126.2000, "사각형어초"),
//!         reef(36.50001, 126.20001, "사각형어초"), // ~1.4m away: duplicate
//!     ],
//! );
//!
//! let pipeline = Pipeline::new(DedupConfig::default(), CategoryTable::default());
//! let output = pipeline.process(vec![west]);
//!
//! assert_eq!(output.west.waypoints.len(), 1);
//! assert_eq!(output.west.waypoints[0].short_name.as_deref(), Some("사각_001"));
//! ```

pub mod error;
pub mod geo_utils;

// Category lookup for reef labels
pub mod classify;
pub use classify::{CategoryRule, CategoryTable};

// Greedy duplicate filter
pub mod dedup;
pub use dedup::{deduplicate, deduplicate_linear};

// West/east partitioning
pub mod region;
pub use region::{partition, Region, RegionPolicy, DEFAULT_LON_BOUNDARY};

// Short-name assignment
pub mod naming;
pub use naming::{assign_short_names, NameCounters, NamePrefixes};

// Configuration and source layout
pub mod config;
pub use config::{DedupConfig, SourceConfig};

// End-to-end batch run
pub mod pipeline;
pub use pipeline::{Pipeline, PipelineOutput, RegionReport, SourceCollection};

// GPX codec
pub mod gpx;

// CSV/JSON export, duplicate report and statistics
pub mod export;

pub use error::{Error, Result};

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use waypoint_dedup::GpsPoint;
/// let point = GpsPoint::new(36.7512, 126.1234);
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box of a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// Provenance of a waypoint collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Published artificial-reef survey points; labels carry the reef type
    Reef,
    /// Any other third-party point list
    Other,
    /// The angler's own recorded points
    Own,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Reef => "reef",
            SourceKind::Other => "other",
            SourceKind::Own => "own",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbol used when the input record has none.
pub const DEFAULT_SYMBOL: &str = "Fish";

/// A fishing-spot waypoint as it moves through the pipeline.
///
/// Created from one parsed GPX `<wpt>`, then tagged with a [`Region`] by the
/// partitioner and a short name by [`assign_short_names`]. The source kind is
/// fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    /// Position (always valid; the codec rejects anything else)
    pub position: GpsPoint,
    /// Original label (`<name>`), may be empty
    pub name: String,
    /// Free-text description (`<desc>`), may be empty
    pub description: String,
    /// Free-text comment (`<cmt>`), may be empty
    pub comment: String,
    /// Display symbol (`<sym>`)
    pub symbol: String,
    /// Original timestamp text (`<time>`), may be empty
    pub time: String,
    /// File the waypoint was read from
    pub source_file: String,
    /// Region bucket, set by the partitioner
    pub region: Option<Region>,
    /// Generated short name, set by the name generator
    pub short_name: Option<String>,
    source: SourceKind,
}

impl Waypoint {
    /// Create a waypoint with empty text fields and the default symbol.
    pub fn new(latitude: f64, longitude: f64, source: SourceKind) -> Self {
        Self {
            position: GpsPoint::new(latitude, longitude),
            name: String::new(),
            description: String::new(),
            comment: String::new(),
            symbol: DEFAULT_SYMBOL.to_string(),
            time: String::new(),
            source_file: String::new(),
            region: None,
            short_name: None,
            source,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_source_file(mut self, file: impl Into<String>) -> Self {
        self.source_file = file.into();
        self
    }

    /// Provenance of this waypoint.
    pub fn source(&self) -> SourceKind {
        self.source
    }

    pub fn latitude(&self) -> f64 {
        self.position.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.position.longitude
    }

    /// Secondary text used for classification: the description, or the
    /// comment when the description is empty.
    pub fn note(&self) -> &str {
        if self.description.is_empty() {
            &self.comment
        } else {
            &self.description
        }
    }

    /// Human-readable label: name, then description, then `"Point"`.
    pub fn display_label(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.description.is_empty() {
            &self.description
        } else {
            "Point"
        }
    }
}
