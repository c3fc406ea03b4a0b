use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

// ---------------------------------------------------------------------------
// Static lookup tables
// ---------------------------------------------------------------------------

/// Studio and compilation albums with their release years.
pub const ALBUM_YEARS: [(&str, i32); 15] = [
    ("The Piper at the Gates of Dawn", 1967),
    ("A Saucerful of Secrets", 1968),
    ("More", 1969),
    ("Ummagumma", 1969),
    ("Atom Heart Mother", 1970),
    ("Relics", 1971),
    ("Meddle", 1971),
    ("Obscured by Clouds", 1972),
    ("The Dark Side of the Moon", 1973),
    ("Wish You Were Here", 1975),
    ("Animals", 1977),
    ("The Wall", 1979),
    ("The Final Cut", 1983),
    ("A Momentary Lapse of Reason", 1987),
    ("The Division Bell", 1994),
];

/// Albums dominated by Syd Barrett's writing and playing.
pub const PRE_ERA_ALBUMS: [&str; 3] = [
    "The Piper at the Gates of Dawn",
    "A Saucerful of Secrets",
    "Relics",
];

/// Half-live double album, left out of the comparison.
pub const EXCLUDED_ALBUM: &str = "Ummagumma";

/// Albums released in or after this year are out of scope (post-Waters).
pub const YEAR_CUTOFF: i32 = 1985;

// ---------------------------------------------------------------------------
// Era
// ---------------------------------------------------------------------------

/// Which side of Barrett's departure an album falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Era {
    #[serde(rename = "Pre-Barrett")]
    PreBarrett,
    #[serde(rename = "Post-Barrett")]
    PostBarrett,
}

impl Era {
    pub const ALL: [Era; 2] = [Era::PreBarrett, Era::PostBarrett];

    pub fn label(self) -> &'static str {
        match self {
            Era::PreBarrett => "Pre-Barrett",
            Era::PostBarrett => "Post-Barrett",
        }
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// AnalysisConfig
// ---------------------------------------------------------------------------

/// Everything a run needs besides the input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Album name → release year.
    pub album_years: BTreeMap<String, i32>,

    /// Albums labelled [`Era::PreBarrett`]; everything else retained is post.
    pub pre_era_albums: BTreeSet<String>,

    /// Album dropped regardless of year.
    pub excluded_album: String,

    /// Rows are kept only when `year < year_cutoff`.
    pub year_cutoff: i32,

    /// Significance level for the decision rule.
    pub alpha: f64,

    /// Confidence level for the mean-difference interval.
    pub confidence: f64,

    /// Degrees of freedom of the trend smoother.
    pub spline_df: usize,

    /// Abort when an album in the data has no year mapping.
    pub strict_mappings: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            album_years: ALBUM_YEARS
                .iter()
                .map(|(album, year)| (album.to_string(), *year))
                .collect(),
            pre_era_albums: PRE_ERA_ALBUMS.iter().map(|a| a.to_string()).collect(),
            excluded_album: EXCLUDED_ALBUM.to_string(),
            year_cutoff: YEAR_CUTOFF,
            alpha: 0.05,
            confidence: 0.95,
            spline_df: 3,
            strict_mappings: true,
        }
    }
}

impl AnalysisConfig {
    /// Release year for an album, if it is mapped.
    pub fn year_of(&self, album: &str) -> Option<i32> {
        self.album_years.get(album).copied()
    }

    pub fn era_of(&self, album: &str) -> Era {
        if self.pre_era_albums.contains(album) {
            Era::PreBarrett
        } else {
            Era::PostBarrett
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(album) = self
            .pre_era_albums
            .iter()
            .find(|a| !self.album_years.contains_key(*a))
        {
            return Err(AnalysisError::Config {
                key: "pre_era_albums".to_string(),
                value: album.clone(),
            });
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(AnalysisError::Config {
                key: "alpha".to_string(),
                value: self.alpha.to_string(),
            });
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(AnalysisError::Config {
                key: "confidence".to_string(),
                value: self.confidence.to_string(),
            });
        }
        if self.spline_df == 0 {
            return Err(AnalysisError::Config {
                key: "spline_df".to_string(),
                value: self.spline_df.to_string(),
            });
        }
        Ok(())
    }
}
