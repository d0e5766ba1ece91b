use crate::geo::Coordinate;
use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

static ASSETS: Dir = include_dir!("$CARGO_MANIFEST_DIR/assets");

const BUNDLED_MANIFEST: &str = "campus.json";

/// One photo and the place it was taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub lat: f64,
    pub lng: f64,
}

impl LocationRecord {
    pub fn new(filename: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            filename: filename.into(),
            label: None,
            lat,
            lng,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The true location as a coordinate. Records coming out of
    /// `parse_manifest` are always in range.
    pub fn coordinate(&self) -> crate::error::Result<Coordinate> {
        Coordinate::new(self.lat, self.lng)
    }
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("manifest contains no locations")]
    Empty,

    #[error("location {filename} has out-of-range coordinates ({lat}, {lng})")]
    InvalidRecord { filename: String, lat: f64, lng: f64 },

    #[error("bundled manifest {0} is missing")]
    MissingBundled(&'static str),
}

/// Parse and validate a JSON array of location records
pub fn parse_manifest(json: &str) -> Result<Vec<LocationRecord>, ManifestError> {
    let records: Vec<LocationRecord> = serde_json::from_str(json)?;

    if records.is_empty() {
        return Err(ManifestError::Empty);
    }

    if let Some(bad) = records.iter().find(|r| r.coordinate().is_err()) {
        return Err(ManifestError::InvalidRecord {
            filename: bad.filename.clone(),
            lat: bad.lat,
            lng: bad.lng,
        });
    }

    Ok(records)
}

pub fn load_manifest<P: AsRef<Path>>(path: P) -> Result<Vec<LocationRecord>, ManifestError> {
    let raw = fs::read_to_string(path.as_ref())?;
    let records = parse_manifest(&raw)?;
    tracing::debug!(
        path = %path.as_ref().display(),
        locations = records.len(),
        "loaded manifest"
    );
    Ok(records)
}

/// The campus pool shipped with the binary
pub fn bundled_manifest() -> Result<Vec<LocationRecord>, ManifestError> {
    let file = ASSETS
        .get_file(BUNDLED_MANIFEST)
        .ok_or(ManifestError::MissingBundled(BUNDLED_MANIFEST))?;
    let raw = file
        .contents_utf8()
        .ok_or(ManifestError::MissingBundled(BUNDLED_MANIFEST))?;
    parse_manifest(raw)
}
