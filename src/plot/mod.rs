//! Charts over the album aggregates.
//!
//! `figures` turns aggregates into plain data (quartiles, sorted bars, a fitted
//! curve); a [`FigureRenderer`] turns that data into pixels. The pipeline only
//! ever talks to the trait, so tests can record figures instead of drawing them.

pub mod figures;
pub mod render;

use crate::error::Result;
use figures::{DistributionFigure, RankingFigure, TrendFigure};

/// One of the three report charts.
#[derive(Debug, Clone, PartialEq)]
pub enum Figure {
    /// Album-mean distribution per era, boxes placed along the year axis.
    Distribution(DistributionFigure),
    /// Album means by year, coloured by era, with a smoothed trend.
    Trend(TrendFigure),
    /// Albums ranked by mean energy against the overall mean.
    Ranking(RankingFigure),
}

impl Figure {
    /// File stem used for the rendered artifact.
    pub fn name(&self) -> &'static str {
        match self {
            Figure::Distribution(_) => "distribution",
            Figure::Trend(_) => "trend",
            Figure::Ranking(_) => "ranking",
        }
    }
}

/// Rendering capability handed to the pipeline.
pub trait FigureRenderer {
    fn render(&mut self, figure: &Figure) -> Result<()>;
}

/// Keeps every figure in memory; nothing is drawn.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub figures: Vec<Figure>,
}

impl FigureRenderer for RecordingRenderer {
    fn render(&mut self, figure: &Figure) -> Result<()> {
        self.figures.push(figure.clone());
        Ok(())
    }
}
