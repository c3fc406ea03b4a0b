use log::{debug, warn};

use crate::analysis::aggregate::{overall_album_mean, AlbumAggregate};
use crate::analysis::spline::{quantile, NaturalSpline};
use crate::config::Era;
use crate::error::{AnalysisError, Result};

/// Points sampled along the smoothed trend curve.
pub const CURVE_SAMPLES: usize = 100;

// ---------------------------------------------------------------------------
// Distribution view
// ---------------------------------------------------------------------------

/// Five-number summary of one era's album means, placed on the year axis.
#[derive(Debug, Clone, PartialEq)]
pub struct EraBox {
    pub era: Era,
    /// Mean release year of the era's albums.
    pub x: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub albums: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionFigure {
    pub boxes: Vec<EraBox>,
    pub year_range: (f64, f64),
}

pub fn distribution_figure(albums: &[AlbumAggregate]) -> Result<DistributionFigure> {
    ensure_albums(albums)?;

    let boxes = Era::ALL
        .iter()
        .filter_map(|&era| {
            let members: Vec<&AlbumAggregate> = albums.iter().filter(|a| a.era == era).collect();
            if members.is_empty() {
                return None;
            }
            let mut means: Vec<f64> = members.iter().map(|a| a.mean_energy).collect();
            means.sort_by(f64::total_cmp);
            let x = members.iter().map(|a| a.year as f64).sum::<f64>() / members.len() as f64;
            Some(EraBox {
                era,
                x,
                min: means[0],
                q1: quantile(&means, 0.25),
                median: quantile(&means, 0.5),
                q3: quantile(&means, 0.75),
                max: means[means.len() - 1],
                albums: members.len(),
            })
        })
        .collect();

    Ok(DistributionFigure {
        boxes,
        year_range: year_range(albums),
    })
}

// ---------------------------------------------------------------------------
// Trend view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub album: String,
    pub year: f64,
    pub energy: f64,
    pub era: Era,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendFigure {
    pub points: Vec<TrendPoint>,
    /// Smoothed curve fitted across every point regardless of era. Empty when
    /// all albums share one release year.
    pub curve: Vec<(f64, f64)>,
    /// Degrees of freedom actually used, at most one less than the number of
    /// distinct years.
    pub spline_df: usize,
}

/// Scatter of album means plus a smoothed trend. Too few distinct years lower
/// the spline's degrees of freedom instead of failing the chart.
pub fn trend_figure(albums: &[AlbumAggregate], spline_df: usize) -> Result<TrendFigure> {
    ensure_albums(albums)?;

    let points: Vec<TrendPoint> = albums
        .iter()
        .map(|a| TrendPoint {
            album: a.album.clone(),
            year: a.year as f64,
            energy: a.mean_energy,
            era: a.era,
        })
        .collect();

    let xs: Vec<f64> = points.iter().map(|p| p.year).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.energy).collect();

    let mut years: Vec<i32> = albums.iter().map(|a| a.year).collect();
    years.sort_unstable();
    years.dedup();
    let df = spline_df.min(years.len() - 1);
    if df < spline_df {
        warn!(
            "only {} distinct years; trend spline lowered from {spline_df} to {df} df",
            years.len()
        );
    }

    let curve = if df == 0 {
        warn!("all albums share one year; trend chart has no curve");
        Vec::new()
    } else {
        match NaturalSpline::fit(&xs, &ys, df) {
            Ok(spline) => {
                debug!("fitted {df}-df spline over {} albums", points.len());
                spline.sample(CURVE_SAMPLES)
            }
            Err(e) => {
                warn!("trend chart drawn without a curve: {e}");
                Vec::new()
            }
        }
    };

    Ok(TrendFigure {
        points,
        curve,
        spline_df: df,
    })
}

// ---------------------------------------------------------------------------
// Ranking view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RankBar {
    pub album: String,
    pub mean_energy: f64,
    pub era: Era,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankingFigure {
    /// Ascending by mean energy.
    pub bars: Vec<RankBar>,
    /// Mean of all album aggregates; drawn as a vertical reference line.
    pub overall_mean: f64,
}

pub fn ranking_figure(albums: &[AlbumAggregate]) -> Result<RankingFigure> {
    let overall_mean = overall_album_mean(albums)?;

    let mut bars: Vec<RankBar> = albums
        .iter()
        .map(|a| RankBar {
            album: a.album.clone(),
            mean_energy: a.mean_energy,
            era: a.era,
        })
        .collect();
    bars.sort_by(|a, b| a.mean_energy.total_cmp(&b.mean_energy));

    Ok(RankingFigure { bars, overall_mean })
}

// -- helpers --

fn ensure_albums(albums: &[AlbumAggregate]) -> Result<()> {
    if albums.is_empty() {
        return Err(AnalysisError::computation("nothing to plot: no album aggregates"));
    }
    Ok(())
}

fn year_range(albums: &[AlbumAggregate]) -> (f64, f64) {
    let lo = albums.iter().map(|a| a.year).min().unwrap_or(0);
    let hi = albums.iter().map(|a| a.year).max().unwrap_or(0);
    (lo as f64, hi as f64)
}
