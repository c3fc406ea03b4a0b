use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use floyd_energy::data::sample::{synthetic_tracks, SampleTrack};

fn write_csv(rows: &[SampleTrack], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(rows: &[SampleTrack], path: &Path) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("track_name", DataType::Utf8, false),
        Field::new("album_name", DataType::Utf8, false),
        Field::new("energy", DataType::Float64, false),
        Field::new("danceability", DataType::Float64, false),
        Field::new("tempo", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.track_name.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.album_name.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.energy).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.danceability).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.tempo).collect::<Vec<_>>())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let rows = synthetic_tracks(42, false);
    let dir = Path::new("data");
    std::fs::create_dir_all(dir)?;

    let csv_path = dir.join("pink_floyd_tracks.csv");
    let parquet_path = dir.join("pink_floyd_tracks.parquet");
    write_csv(&rows, &csv_path)?;
    write_parquet(&rows, &parquet_path)?;

    println!(
        "Wrote {} tracks to {} and {}",
        rows.len(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
