use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use crate::config::Era;
use crate::data::model::LabeledTrack;
use crate::error::{AnalysisError, Result};

/// Mean energy of one album's retained tracks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlbumAggregate {
    pub album: String,
    pub year: i32,
    pub era: Era,
    pub mean_energy: f64,
    pub tracks: usize,
}

/// Mean energy of every retained track in one era.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EraAggregate {
    pub era: Era,
    pub mean_energy: f64,
    pub tracks: usize,
}

#[derive(Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Group by (album, year, era), ordered by year then album.
pub fn album_aggregates(tracks: &[LabeledTrack<'_>]) -> Result<Vec<AlbumAggregate>> {
    if tracks.is_empty() {
        return Err(AnalysisError::computation(
            "album means of an empty track set",
        ));
    }

    let mut groups: BTreeMap<(i32, &str, Era), Accumulator> = BTreeMap::new();
    for t in tracks {
        groups
            .entry((t.year, t.album(), t.era))
            .or_default()
            .push(t.energy());
    }

    let aggregates: Vec<AlbumAggregate> = groups
        .into_iter()
        .map(|((year, album, era), acc)| AlbumAggregate {
            album: album.to_string(),
            year,
            era,
            mean_energy: acc.mean(),
            tracks: acc.count,
        })
        .collect();
    debug!("computed {} album aggregates", aggregates.len());
    Ok(aggregates)
}

/// Group by era over track-level energies, in [`Era`] order.
pub fn era_aggregates(tracks: &[LabeledTrack<'_>]) -> Result<Vec<EraAggregate>> {
    if tracks.is_empty() {
        return Err(AnalysisError::computation("era means of an empty track set"));
    }

    let mut groups: BTreeMap<Era, Accumulator> = BTreeMap::new();
    for t in tracks {
        groups.entry(t.era).or_default().push(t.energy());
    }

    Ok(groups
        .into_iter()
        .map(|(era, acc)| EraAggregate {
            era,
            mean_energy: acc.mean(),
            tracks: acc.count,
        })
        .collect())
}

/// Unweighted mean of the album means; the ranking chart's reference line.
pub fn overall_album_mean(albums: &[AlbumAggregate]) -> Result<f64> {
    if albums.is_empty() {
        return Err(AnalysisError::computation("overall mean of no albums"));
    }
    Ok(albums.iter().map(|a| a.mean_energy).sum::<f64>() / albums.len() as f64)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::data::model::Track;

    fn labeled<'a>(track: &'a Track, year: i32, era: Era) -> LabeledTrack<'a> {
        LabeledTrack { track, year, era }
    }

    #[test]
    fn album_mean_uses_exactly_its_tracks() {
        let a1 = Track::new("A", 0.2);
        let a2 = Track::new("A", 0.6);
        let b1 = Track::new("B", 0.9);
        let rows = vec![
            labeled(&a1, 1967, Era::PreBarrett),
            labeled(&b1, 1971, Era::PostBarrett),
            labeled(&a2, 1967, Era::PreBarrett),
        ];

        let albums = album_aggregates(&rows).unwrap();
        assert_eq!(albums.len(), 2);
        assert_eq!(albums[0].album, "A");
        assert_eq!(albums[0].tracks, 2);
        assert_relative_eq!(albums[0].mean_energy, 0.4);
        assert_relative_eq!(albums[1].mean_energy, 0.9);
    }

    #[test]
    fn era_mean_is_track_weighted() {
        let tracks: Vec<Track> = [0.2, 0.4, 0.9]
            .iter()
            .map(|e| Track::new("X", *e))
            .collect();
        let rows = vec![
            labeled(&tracks[0], 1970, Era::PostBarrett),
            labeled(&tracks[1], 1970, Era::PostBarrett),
            labeled(&tracks[2], 1967, Era::PreBarrett),
        ];
        let eras = era_aggregates(&rows).unwrap();
        assert_eq!(eras[0].era, Era::PreBarrett);
        assert_relative_eq!(eras[0].mean_energy, 0.9);
        assert_eq!(eras[1].tracks, 2);
        assert_relative_eq!(eras[1].mean_energy, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let t1 = Track::new("A", 0.31);
        let t2 = Track::new("B", 0.77);
        let rows = vec![labeled(&t1, 1967, Era::PreBarrett), labeled(&t2, 1973, Era::PostBarrett)];
        assert_eq!(album_aggregates(&rows).unwrap(), album_aggregates(&rows).unwrap());
        assert_eq!(era_aggregates(&rows).unwrap(), era_aggregates(&rows).unwrap());
    }

    #[test]
    fn empty_input_is_computation_error() {
        assert!(matches!(
            album_aggregates(&[]),
            Err(AnalysisError::Computation { .. })
        ));
        assert!(matches!(
            era_aggregates(&[]),
            Err(AnalysisError::Computation { .. })
        ));
        assert!(overall_album_mean(&[]).is_err());
    }
}
