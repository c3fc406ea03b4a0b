use log::debug;

use super::model::{EnrichedTrack, LabeledTrack};
use crate::config::AnalysisConfig;

/// Keep tracks released before the cutoff and not on the excluded album, then
/// label each survivor with its era.
///
/// A track passes when:
/// * its year is defined and `year < config.year_cutoff`
/// * its album is not `config.excluded_album`
///
/// An empty result is valid.
pub fn select<'a>(tracks: &[EnrichedTrack<'a>], config: &AnalysisConfig) -> Vec<LabeledTrack<'a>> {
    let selected: Vec<LabeledTrack<'a>> = tracks
        .iter()
        .filter_map(|t| {
            let year = t.year.filter(|y| *y < config.year_cutoff)?;
            if t.track.album == config.excluded_album {
                return None;
            }
            Some(LabeledTrack {
                track: t.track,
                year,
                era: config.era_of(&t.track.album),
            })
        })
        .collect();
    debug!("selected {} of {} tracks", selected.len(), tracks.len());
    selected
}

/// Per-track energies of one era, in input order.
pub fn energies_of(tracks: &[LabeledTrack<'_>], era: crate::config::Era) -> Vec<f64> {
    tracks
        .iter()
        .filter(|t| t.era == era)
        .map(LabeledTrack::energy)
        .collect()
}
