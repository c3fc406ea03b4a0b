use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::Era;

// ---------------------------------------------------------------------------
// FeatureValue – a single cell in an unused audio-feature column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell for columns the pipeline carries but does not use
/// (danceability, valence, tempo, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::String(s) => write!(f, "{s}"),
            FeatureValue::Integer(i) => write!(f, "{i}"),
            FeatureValue::Float(v) => write!(f, "{v:.4}"),
            FeatureValue::Bool(b) => write!(f, "{b}"),
            FeatureValue::Null => write!(f, "<null>"),
        }
    }
}

impl FeatureValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Float(v) => Some(*v),
            FeatureValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Track – one row of the input table
// ---------------------------------------------------------------------------

/// A single song as read from the input file.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub album: String,
    pub name: Option<String>,
    /// Spotify energy score, in `[0, 1]`.
    pub energy: f64,
    /// Remaining columns: column_name → value.
    pub features: BTreeMap<String, FeatureValue>,
}

impl Track {
    /// Track with only the columns the pipeline needs.
    pub fn new(album: impl Into<String>, energy: f64) -> Self {
        Self {
            album: album.into(),
            name: None,
            energy,
            features: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// TrackTable – the complete loaded dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TrackTable {
    pub tracks: Vec<Track>,
    /// Ordered list of feature column names (excludes album, track name, energy).
    pub feature_columns: Vec<String>,
    pub source: Option<PathBuf>,
}

impl TrackTable {
    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        let feature_columns: BTreeSet<String> = tracks
            .iter()
            .flat_map(|t| t.features.keys().cloned())
            .collect();
        TrackTable {
            tracks,
            feature_columns: feature_columns.into_iter().collect(),
            source: None,
        }
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Distinct album names, sorted.
    pub fn albums(&self) -> BTreeSet<&str> {
        self.tracks.iter().map(|t| t.album.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Derived rows
// ---------------------------------------------------------------------------

/// A track with its release year looked up. `year` is `None` for unmapped albums.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnrichedTrack<'a> {
    pub track: &'a Track,
    pub year: Option<i32>,
}

/// A track that survived filtering, with a definite year and era.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledTrack<'a> {
    pub track: &'a Track,
    pub year: i32,
    pub era: Era,
}

impl LabeledTrack<'_> {
    pub fn album(&self) -> &str {
        &self.track.album
    }

    pub fn energy(&self) -> f64 {
        self.track.energy
    }
}
