use std::path::Path;

use log::info;

use crate::analysis::aggregate::{album_aggregates, era_aggregates, AlbumAggregate, EraAggregate};
use crate::analysis::ttest::{welch_t_test, WelchTest};
use crate::config::{AnalysisConfig, Era};
use crate::data::enrich::{check_mappings, enrich};
use crate::data::filter::{energies_of, select};
use crate::data::loader::load_file;
use crate::data::model::{EnrichedTrack, LabeledTrack, TrackTable};
use crate::error::Result;
use crate::plot::figures::{distribution_figure, ranking_figure, trend_figure};
use crate::plot::{Figure, FigureRenderer};
use crate::report::Report;

/// Output of the aggregation stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub albums: Vec<AlbumAggregate>,
    pub eras: Vec<EraAggregate>,
}

impl Aggregates {
    pub fn era_mean(&self, era: Era) -> Option<f64> {
        self.eras
            .iter()
            .find(|e| e.era == era)
            .map(|e| e.mean_energy)
    }
}

/// The analysis as a sequence of stages. Each stage takes the previous stage's
/// output by reference and returns a new value; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: AnalysisConfig,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn load(&self, path: &Path) -> Result<TrackTable> {
        load_file(path)
    }

    /// Attach years and check the lookup covers every album present.
    pub fn enrich<'a>(&self, table: &'a TrackTable) -> Result<Vec<EnrichedTrack<'a>>> {
        let enriched = enrich(table, &self.config);
        check_mappings(&enriched, self.config.strict_mappings)?;
        Ok(enriched)
    }

    pub fn select<'a>(&self, enriched: &[EnrichedTrack<'a>]) -> Vec<LabeledTrack<'a>> {
        let selected = select(enriched, &self.config);
        info!(
            "{} tracks retained (year < {}, excluding '{}')",
            selected.len(),
            self.config.year_cutoff,
            self.config.excluded_album
        );
        selected
    }

    pub fn aggregate(&self, tracks: &[LabeledTrack<'_>]) -> Result<Aggregates> {
        let albums = album_aggregates(tracks)?;
        let eras = era_aggregates(tracks)?;
        info!("{} albums across {} eras", albums.len(), eras.len());
        Ok(Aggregates { albums, eras })
    }

    /// Build the three charts from album aggregates and hand them to `renderer`.
    pub fn visualize(
        &self,
        aggregates: &Aggregates,
        renderer: &mut dyn FigureRenderer,
    ) -> Result<()> {
        let albums = &aggregates.albums;
        let figures = [
            Figure::Distribution(distribution_figure(albums)?),
            Figure::Trend(trend_figure(albums, self.config.spline_df)?),
            Figure::Ranking(ranking_figure(albums)?),
        ];
        for figure in &figures {
            renderer.render(figure)?;
        }
        Ok(())
    }

    /// Welch test on per-track energies (not album means).
    pub fn test(&self, tracks: &[LabeledTrack<'_>]) -> Result<WelchTest> {
        let pre = energies_of(tracks, Era::PreBarrett);
        let post = energies_of(tracks, Era::PostBarrett);
        let result = welch_t_test(&pre, &post, self.config.confidence)?;
        info!(
            "welch t = {:.3}, df = {:.2}, p = {:.3e}",
            result.t, result.df, result.p_value
        );
        Ok(result)
    }

    /// Every stage after loading.
    pub fn analyze(
        &self,
        table: &TrackTable,
        renderer: &mut dyn FigureRenderer,
    ) -> Result<Report> {
        let enriched = self.enrich(table)?;
        let selected = self.select(&enriched);
        let aggregates = self.aggregate(&selected)?;
        self.visualize(&aggregates, renderer)?;
        let test = self.test(&selected)?;

        Ok(Report::new(
            table,
            selected.len(),
            aggregates,
            test,
            self.config.alpha,
        ))
    }

    pub fn run(&self, path: &Path, renderer: &mut dyn FigureRenderer) -> Result<Report> {
        let table = self.load(path)?;
        self.analyze(&table, renderer)
    }
}
