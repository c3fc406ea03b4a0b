use std::collections::BTreeSet;

use log::{debug, warn};

use super::model::{EnrichedTrack, TrackTable};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};

/// Attach a release year to every track. Unmapped albums get `year = None`;
/// this step never fails.
pub fn enrich<'a>(table: &'a TrackTable, config: &AnalysisConfig) -> Vec<EnrichedTrack<'a>> {
    let enriched: Vec<EnrichedTrack<'a>> = table
        .tracks
        .iter()
        .map(|track| EnrichedTrack {
            track,
            year: config.year_of(&track.album),
        })
        .collect();
    debug!(
        "enriched {} tracks, {} without a year",
        enriched.len(),
        enriched.iter().filter(|t| t.year.is_none()).count()
    );
    enriched
}

/// Distinct album names that have no year mapping.
pub fn mapping_gaps(tracks: &[EnrichedTrack<'_>]) -> BTreeSet<String> {
    tracks
        .iter()
        .filter(|t| t.year.is_none())
        .map(|t| t.track.album.clone())
        .collect()
}

/// Check the lookup table covers every album in the data.
///
/// Strict mode turns any gap into [`AnalysisError::MappingGap`]; lenient mode
/// only warns, and the affected rows drop out at the year filter.
pub fn check_mappings(tracks: &[EnrichedTrack<'_>], strict: bool) -> Result<()> {
    let gaps = mapping_gaps(tracks);
    if gaps.is_empty() {
        return Ok(());
    }
    if strict {
        return Err(AnalysisError::MappingGap { albums: gaps });
    }
    for album in &gaps {
        warn!("album '{album}' has no release year; its tracks will be dropped");
    }
    Ok(())
}
