use std::path::PathBuf;

use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;

use super::figures::{DistributionFigure, RankingFigure, TrendFigure};
use super::{Figure, FigureRenderer};
use crate::color::EraColors;
use crate::config::Era;
use crate::error::{AnalysisError, Result};

const FONT: &str = "sans-serif";
/// Half the width of a distribution box, in years.
const BOX_HALF_WIDTH: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

// ---------------------------------------------------------------------------
// PlottersRenderer
// ---------------------------------------------------------------------------

/// Draws each figure to `<out_dir>/<figure name>.<ext>`.
pub struct PlottersRenderer {
    out_dir: PathBuf,
    format: ImageFormat,
    size: (u32, u32),
    colors: EraColors,
    written: Vec<PathBuf>,
}

impl PlottersRenderer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            format: ImageFormat::default(),
            size: (1024, 768),
            colors: EraColors::default(),
            written: Vec::new(),
        }
    }

    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// Paths of every artifact written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn path_for(&self, figure: &Figure) -> PathBuf {
        self.out_dir
            .join(format!("{}.{}", figure.name(), self.format.extension()))
    }
}

impl FigureRenderer for PlottersRenderer {
    fn render(&mut self, figure: &Figure) -> Result<()> {
        std::fs::create_dir_all(&self.out_dir)?;
        let path = self.path_for(figure);

        match self.format {
            ImageFormat::Png => {
                let root = BitMapBackend::new(&path, self.size).into_drawing_area();
                draw(&root, figure, &self.colors)?;
                root.present().map_err(AnalysisError::render)?;
            }
            ImageFormat::Svg => {
                let root = SVGBackend::new(&path, self.size).into_drawing_area();
                draw(&root, figure, &self.colors)?;
                root.present().map_err(AnalysisError::render)?;
            }
        }

        info!("wrote {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    colors: &EraColors,
) -> Result<()> {
    root.fill(&WHITE).map_err(AnalysisError::render)?;
    match figure {
        Figure::Distribution(fig) => draw_distribution(root, fig, colors),
        Figure::Trend(fig) => draw_trend(root, fig, colors),
        Figure::Ranking(fig) => draw_ranking(root, fig, colors),
    }
}

// ---------------------------------------------------------------------------
// Distribution: one box per era along the year axis
// ---------------------------------------------------------------------------

fn draw_distribution<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    fig: &DistributionFigure,
    colors: &EraColors,
) -> Result<()> {
    let (lo, hi) = fig.year_range;
    let (y_lo, y_hi) = value_range(fig.boxes.iter().flat_map(|b| [b.min, b.max]));

    let mut chart = ChartBuilder::on(root)
        .caption("Album energy by era", (FONT, 28))
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d((lo - 2.0)..(hi + 2.0), y_lo..y_hi)
        .map_err(AnalysisError::render)?;

    chart
        .configure_mesh()
        .x_desc("Release year")
        .y_desc("Mean energy per album")
        .x_label_formatter(&|x| format!("{x:.0}"))
        .draw()
        .map_err(AnalysisError::render)?;

    let half = BOX_HALF_WIDTH;
    for b in &fig.boxes {
        let color = colors.color_for(b.era);
        let stroke = color.stroke_width(2);

        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(b.x - half, b.q1), (b.x + half, b.q3)],
                color.mix(0.35).filled(),
            )))
            .map_err(AnalysisError::render)?
            .label(format!("{} ({} albums)", b.era, b.albums))
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));

        chart
            .draw_series([
                PathElement::new(
                    vec![
                        (b.x - half, b.q1),
                        (b.x + half, b.q1),
                        (b.x + half, b.q3),
                        (b.x - half, b.q3),
                        (b.x - half, b.q1),
                    ],
                    stroke,
                ),
                PathElement::new(
                    vec![(b.x - half, b.median), (b.x + half, b.median)],
                    color.stroke_width(4),
                ),
                PathElement::new(vec![(b.x, b.q3), (b.x, b.max)], stroke),
                PathElement::new(vec![(b.x, b.q1), (b.x, b.min)], stroke),
                PathElement::new(vec![(b.x - half / 2.0, b.max), (b.x + half / 2.0, b.max)], stroke),
                PathElement::new(vec![(b.x - half / 2.0, b.min), (b.x + half / 2.0, b.min)], stroke),
            ])
            .map_err(AnalysisError::render)?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(AnalysisError::render)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Trend: scatter coloured by era + smoothed curve
// ---------------------------------------------------------------------------

fn draw_trend<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    fig: &TrendFigure,
    colors: &EraColors,
) -> Result<()> {
    let (lo, hi) = fig
        .points
        .iter()
        .map(|p| p.year)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| (lo.min(y), hi.max(y)));
    let (y_lo, y_hi) = value_range(
        fig.points
            .iter()
            .map(|p| p.energy)
            .chain(fig.curve.iter().map(|(_, y)| *y)),
    );

    let mut chart = ChartBuilder::on(root)
        .caption("Album energy over time", (FONT, 28))
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d((lo - 1.0)..(hi + 1.0), y_lo..y_hi)
        .map_err(AnalysisError::render)?;

    chart
        .configure_mesh()
        .x_desc("Release year")
        .y_desc("Mean energy per album")
        .x_label_formatter(&|x| format!("{x:.0}"))
        .draw()
        .map_err(AnalysisError::render)?;

    if !fig.curve.is_empty() {
        chart
            .draw_series(LineSeries::new(fig.curve.iter().copied(), BLACK.stroke_width(2)))
            .map_err(AnalysisError::render)?
            .label(format!("natural spline, {} df", fig.spline_df))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(2)));
    }

    for era in Era::ALL {
        let color = colors.color_for(era);
        let points: Vec<(f64, f64)> = fig
            .points
            .iter()
            .filter(|p| p.era == era)
            .map(|p| (p.year, p.energy))
            .collect();
        if points.is_empty() {
            continue;
        }
        chart
            .draw_series(points.into_iter().map(|xy| Circle::new(xy, 6, color.filled())))
            .map_err(AnalysisError::render)?
            .label(era.label())
            .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
    }

    chart
        .draw_series(
            fig.points
                .iter()
                .map(|p| Text::new(p.album.clone(), (p.year, p.energy), (FONT, 12))),
        )
        .map_err(AnalysisError::render)?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(AnalysisError::render)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Ranking: horizontal bars, ascending, with the overall mean
// ---------------------------------------------------------------------------

fn draw_ranking<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    fig: &RankingFigure,
    colors: &EraColors,
) -> Result<()> {
    let n = fig.bars.len();
    let names: Vec<&str> = fig.bars.iter().map(|b| b.album.as_str()).collect();
    let x_hi = fig
        .bars
        .iter()
        .map(|b| b.mean_energy)
        .fold(fig.overall_mean, f64::max);

    // bar i is centred on y = i
    let mut chart = ChartBuilder::on(root)
        .caption("Albums ranked by mean energy", (FONT, 28))
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(260)
        .build_cartesian_2d(0.0..(x_hi * 1.1).clamp(0.05, 1.0), -0.5..(n as f64 - 0.5))
        .map_err(AnalysisError::render)?;

    let label_for = |v: &f64| {
        let idx = v.round();
        if (v - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        names.get(idx as usize).map(|s| s.to_string()).unwrap_or_default()
    };
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n * 2)
        .y_label_formatter(&label_for)
        .x_desc("Mean energy")
        .draw()
        .map_err(AnalysisError::render)?;

    for era in Era::ALL {
        let color = colors.color_for(era);
        let bars: Vec<Rectangle<(f64, f64)>> = fig
            .bars
            .iter()
            .enumerate()
            .filter(|(_, b)| b.era == era)
            .map(|(i, b)| {
                let y = i as f64;
                Rectangle::new([(0.0, y - 0.4), (b.mean_energy, y + 0.4)], color.filled())
            })
            .collect();
        if bars.is_empty() {
            continue;
        }
        chart
            .draw_series(bars)
            .map_err(AnalysisError::render)?
            .label(era.label())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    let mean = fig.overall_mean;
    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(mean, -0.5), (mean, n as f64 - 0.5)],
            BLACK.stroke_width(2),
        )))
        .map_err(AnalysisError::render)?
        .label(format!("overall mean {mean:.3}"))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(AnalysisError::render)?;
    Ok(())
}

/// Padded value range, clipped to the energy scale.
fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.1).max(0.02);
    ((lo - pad).max(0.0), (hi + pad).min(1.0))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::analysis::aggregate::AlbumAggregate;
    use crate::plot::figures::{distribution_figure, ranking_figure, trend_figure};

    fn agg(album: &str, year: i32, era: Era, mean: f64) -> AlbumAggregate {
        AlbumAggregate {
            album: album.to_string(),
            year,
            era,
            mean_energy: mean,
            tracks: 6,
        }
    }

    fn albums() -> Vec<AlbumAggregate> {
        vec![
            agg("The Piper at the Gates of Dawn", 1967, Era::PreBarrett, 0.58),
            agg("A Saucerful of Secrets", 1968, Era::PreBarrett, 0.56),
            agg("Meddle", 1971, Era::PostBarrett, 0.37),
            agg("The Dark Side of the Moon", 1973, Era::PostBarrett, 0.36),
            agg("Wish You Were Here", 1975, Era::PostBarrett, 0.35),
            agg("The Wall", 1979, Era::PostBarrett, 0.42),
        ]
    }

    fn all_figures(albums: &[AlbumAggregate]) -> Vec<Figure> {
        vec![
            Figure::Distribution(distribution_figure(albums).unwrap()),
            Figure::Trend(trend_figure(albums, 3).unwrap()),
            Figure::Ranking(ranking_figure(albums).unwrap()),
        ]
    }

    #[test]
    fn value_range_pads_and_clips() {
        let (lo, hi) = value_range([0.3, 0.5].into_iter());
        assert!(lo < 0.3 && lo > 0.25);
        assert!(hi > 0.5 && hi < 0.55);
        assert_eq!(value_range([0.0, 1.0].into_iter()), (0.0, 1.0));
        assert_eq!(value_range(std::iter::empty()), (0.0, 1.0));
    }

    #[test]
    fn artifact_paths_follow_figure_names() {
        let renderer = PlottersRenderer::new("out").with_format(ImageFormat::Svg);
        let fig = Figure::Ranking(RankingFigure {
            bars: Vec::new(),
            overall_mean: 0.5,
        });
        assert_eq!(renderer.path_for(&fig), Path::new("out").join("ranking.svg"));
        assert!(renderer.written().is_empty());
    }

    #[test]
    fn renders_every_figure_as_svg() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = PlottersRenderer::new(dir.path())
            .with_format(ImageFormat::Svg)
            .with_size(640, 480);
        for figure in &all_figures(&albums()) {
            renderer.render(figure).unwrap();
        }

        let written = renderer.written();
        assert_eq!(written.len(), 3);
        for (path, stem) in written.iter().zip(["distribution", "trend", "ranking"]) {
            assert_eq!(path, &dir.path().join(format!("{stem}.svg")));
            let svg = std::fs::read_to_string(path).unwrap();
            assert!(svg.contains("<svg"));
        }
    }

    #[test]
    fn renders_a_trend_without_a_curve() {
        let dir = tempfile::tempdir().unwrap();
        let single_year = vec![
            agg("Meddle", 1971, Era::PostBarrett, 0.37),
            agg("Relics", 1971, Era::PreBarrett, 0.57),
        ];
        let fig = trend_figure(&single_year, 3).unwrap();
        assert!(fig.curve.is_empty());

        let mut renderer = PlottersRenderer::new(dir.path()).with_format(ImageFormat::Svg);
        renderer.render(&Figure::Trend(fig)).unwrap();
        let meta = std::fs::metadata(&renderer.written()[0]).unwrap();
        assert!(meta.len() > 0);
    }
}
