use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use floyd_energy::plot::render::{ImageFormat, PlottersRenderer};
use floyd_energy::{AnalysisConfig, Pipeline};

#[derive(Parser)]
#[command(
    name = "floyd-energy",
    version,
    about = "Compare track energy before and after Syd Barrett left Pink Floyd"
)]
struct Cli {
    /// Track table (.csv, .tsv, .json or .parquet) with album_name and energy columns
    #[arg(default_value = "data/pink_floyd_tracks.csv")]
    input: PathBuf,

    /// Directory for the rendered charts and report.json
    #[arg(default_value = "figures")]
    output_dir: PathBuf,

    /// Chart file format
    #[arg(long, value_enum, default_value_t = ImageFormat::Png)]
    format: ImageFormat,

    /// Chart width in pixels
    #[arg(long, default_value_t = 1024)]
    width: u32,

    /// Chart height in pixels
    #[arg(long, default_value_t = 768)]
    height: u32,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    info!("floyd-energy v{}", env!("CARGO_PKG_VERSION"));
    let pipeline = Pipeline::new(AnalysisConfig::default())?;
    let mut renderer = PlottersRenderer::new(&cli.output_dir)
        .with_format(cli.format)
        .with_size(cli.width, cli.height);

    let report = pipeline
        .run(&cli.input, &mut renderer)
        .with_context(|| format!("analysing {}", cli.input.display()))?;
    let json = report.write_json(&cli.output_dir)?;

    println!("{}", report.era_table());
    println!("{}", report.test_block());
    for path in renderer.written() {
        println!("chart: {}", path.display());
    }
    println!("report: {}", json.display());
    Ok(())
}
