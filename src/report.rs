use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::analysis::aggregate::{AlbumAggregate, EraAggregate};
use crate::analysis::ttest::{Direction, WelchTest};
use crate::data::model::TrackTable;
use crate::error::Result;
use crate::pipeline::Aggregates;

pub const REPORT_FILE: &str = "report.json";

/// Everything one run produced, ready to print or serialize.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub source: Option<String>,
    pub tracks_loaded: usize,
    pub tracks_retained: usize,
    pub albums: Vec<AlbumAggregate>,
    pub eras: Vec<EraAggregate>,
    pub test: WelchTest,
    pub alpha: f64,
    pub rejects_null: bool,
    pub direction: Direction,
}

impl Report {
    pub fn new(
        table: &TrackTable,
        tracks_retained: usize,
        aggregates: Aggregates,
        test: WelchTest,
        alpha: f64,
    ) -> Self {
        Self {
            source: table.source.as_ref().map(|p| p.display().to_string()),
            tracks_loaded: table.len(),
            tracks_retained,
            albums: aggregates.albums,
            eras: aggregates.eras,
            rejects_null: test.rejects_null(alpha),
            direction: test.direction(),
            test,
            alpha,
        }
    }

    /// Mean energy per era as a plain-text table.
    pub fn era_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:<14} {:>7} {:>12}", "era", "tracks", "mean energy");
        for e in &self.eras {
            let _ = writeln!(out, "{:<14} {:>7} {:>12.4}", e.era.label(), e.tracks, e.mean_energy);
        }
        out
    }

    /// Welch test summary in the layout of a classic t-test printout.
    pub fn test_block(&self) -> String {
        let t = &self.test;
        let mut out = String::new();
        let _ = writeln!(out, "Welch Two Sample t-test (Pre-Barrett vs Post-Barrett)");
        let _ = writeln!(out, "t = {:.4}, df = {:.2}, p-value = {:.4e}", t.t, t.df, t.p_value);
        let _ = writeln!(out, "alternative hypothesis: true difference in means is not equal to 0");
        let _ = writeln!(
            out,
            "{:.0} percent confidence interval: {:.4} {:.4}",
            t.confidence * 100.0,
            t.ci_low,
            t.ci_high
        );
        let _ = writeln!(out, "sample estimates:");
        let _ = writeln!(out, "  mean (Pre-Barrett, n={}):  {:.4}", t.n_pre, t.mean_pre);
        let _ = writeln!(out, "  mean (Post-Barrett, n={}): {:.4}", t.n_post, t.mean_post);
        let verdict = if self.rejects_null {
            format!("reject equal means at alpha = {}: {}", self.alpha, self.direction)
        } else {
            format!("cannot reject equal means at alpha = {}", self.alpha)
        };
        let _ = writeln!(out, "{verdict}");
        out
    }

    /// Write `report.json` into `dir`, creating it if needed.
    pub fn write_json(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(REPORT_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Era;
    use crate::data::model::Track;

    fn report() -> Report {
        let table = TrackTable::from_tracks(vec![Track::new("A", 0.5)]).with_source("tracks.csv");
        let test = WelchTest {
            t: 4.2,
            df: 20.5,
            p_value: 0.0004,
            confidence: 0.95,
            ci_low: 0.1,
            ci_high: 0.3,
            mean_pre: 0.6,
            mean_post: 0.4,
            n_pre: 10,
            n_post: 40,
        };
        let aggregates = Aggregates {
            albums: Vec::new(),
            eras: vec![
                EraAggregate { era: Era::PreBarrett, mean_energy: 0.6, tracks: 10 },
                EraAggregate { era: Era::PostBarrett, mean_energy: 0.4, tracks: 40 },
            ],
        };
        Report::new(&table, 50, aggregates, test, 0.05)
    }

    #[test]
    fn decision_follows_alpha() {
        let r = report();
        assert!(r.rejects_null);
        assert_eq!(r.direction, Direction::PostLower);
        assert_eq!(r.source.as_deref(), Some("tracks.csv"));
    }

    #[test]
    fn era_table_lists_each_era() {
        let table = report().era_table();
        assert!(table.contains("Pre-Barrett"));
        assert!(table.contains("0.6000"));
        assert_eq!(table.lines().count(), 3);
    }

    #[test]
    fn test_block_reports_interval_and_means() {
        let block = report().test_block();
        assert!(block.contains("95 percent confidence interval: 0.1000 0.3000"));
        assert!(block.contains("post-era mean is lower"));
    }

    #[test]
    fn json_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = report().write_json(dir.path()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["eras"][0]["era"], "Pre-Barrett");
        assert_eq!(value["direction"], "PostLower");
        assert_eq!(value["tracks_retained"], 50);
    }
}
