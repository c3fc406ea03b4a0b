use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
};
use arrow::datatypes::DataType;
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{FeatureValue, Track, TrackTable};
use crate::error::{AnalysisError, Result};

pub const ALBUM_COLUMN: &str = "album_name";
pub const ENERGY_COLUMN: &str = "energy";
pub const TRACK_COLUMN: &str = "track_name";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a track table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`           – comma-delimited with a header row
/// * `.tsv` / `.tab`  – tab-delimited with a header row
/// * `.json`          – `[{ "album_name": "...", "energy": 0.4, ...features }, ...]`
/// * `.parquet`       – flat columns, `album_name` Utf8 and `energy` Float
///
/// Every format needs `album_name` and `energy`; `track_name` is optional and
/// all other columns are kept as features.
pub fn load_file(path: &Path) -> Result<TrackTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let loaded = match ext.as_str() {
        "csv" => load_delimited(path, b','),
        "tsv" | "tab" => load_delimited(path, b'\t'),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(anyhow::anyhow!("unsupported file extension: .{other}")),
    };

    let tracks = loaded.map_err(|e| AnalysisError::Load {
        path: path.display().to_string(),
        reason: format!("{e:#}"),
    })?;

    let table = TrackTable::from_tracks(tracks).with_source(path);
    info!(
        "loaded {} tracks across {} albums from {}",
        table.len(),
        table.albums().len(),
        path.display()
    );
    Ok(table)
}

/// Validate the two required cells of a row and assemble the track.
/// `row` is the 1-based data row, header excluded.
fn build_track(
    row: usize,
    album: Option<&str>,
    energy: Option<f64>,
    name: Option<String>,
    features: BTreeMap<String, FeatureValue>,
) -> anyhow::Result<Track> {
    let album = album
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .with_context(|| format!("row {row}: empty '{ALBUM_COLUMN}'"))?;
    let energy = energy.with_context(|| format!("row {row}: missing '{ENERGY_COLUMN}'"))?;
    if !(0.0..=1.0).contains(&energy) {
        bail!("row {row}: energy {energy} is outside [0, 1]");
    }
    Ok(Track {
        album: album.to_string(),
        name,
        energy,
        features,
    })
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

fn load_delimited(path: &Path, delimiter: u8) -> anyhow::Result<Vec<Track>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .context("opening delimited file")?;
    read_delimited(&mut reader)
}

fn read_delimited<R: std::io::Read>(reader: &mut csv::Reader<R>) -> anyhow::Result<Vec<Track>> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let album_idx = column_index(&headers, ALBUM_COLUMN)?;
    let energy_idx = column_index(&headers, ENERGY_COLUMN)?;
    let track_idx = headers.iter().position(|h| h == TRACK_COLUMN);
    debug!("delimited columns: {headers:?}");

    let mut tracks = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let row_no = i + 1;
        // csv rejects records whose field count differs from the header
        let record = result.with_context(|| format!("row {row_no}"))?;

        let energy_cell = record.get(energy_idx).unwrap_or("").trim();
        let energy = energy_cell.parse::<f64>().with_context(|| {
            format!("row {row_no}: energy '{energy_cell}' is not a number")
        })?;

        let mut features = BTreeMap::new();
        for (col_idx, value) in record.iter().enumerate() {
            if col_idx == album_idx || col_idx == energy_idx || Some(col_idx) == track_idx {
                continue;
            }
            features.insert(headers[col_idx].clone(), guess_feature_type(value));
        }

        let name = track_idx
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        tracks.push(build_track(
            row_no,
            record.get(album_idx),
            Some(energy),
            name,
            features,
        )?);
    }
    Ok(tracks)
}

fn column_index(headers: &[String], name: &str) -> anyhow::Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .with_context(|| format!("missing '{name}' column"))
}

fn guess_feature_type(s: &str) -> FeatureValue {
    let s = s.trim();
    if s.is_empty() || s == "NA" {
        return FeatureValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return FeatureValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return FeatureValue::Float(f);
    }
    match s {
        "true" | "TRUE" => FeatureValue::Bool(true),
        "false" | "FALSE" => FeatureValue::Bool(false),
        _ => FeatureValue::String(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, as written by `df.to_json(orient='records')`.
fn load_json(path: &Path) -> anyhow::Result<Vec<Track>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

fn parse_json(text: &str) -> anyhow::Result<Vec<Track>> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().context("expected top-level JSON array")?;

    let mut tracks = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let row_no = i + 1;
        let obj = rec
            .as_object()
            .with_context(|| format!("row {row_no} is not a JSON object"))?;

        let album = obj.get(ALBUM_COLUMN).and_then(JsonValue::as_str);
        let energy = match obj.get(ENERGY_COLUMN) {
            Some(v) => Some(
                v.as_f64()
                    .with_context(|| format!("row {row_no}: energy {v} is not a number"))?,
            ),
            None => None,
        };
        let name = obj
            .get(TRACK_COLUMN)
            .and_then(JsonValue::as_str)
            .map(str::to_string);

        let features = obj
            .iter()
            .filter(|(k, _)| {
                k.as_str() != ALBUM_COLUMN && k.as_str() != ENERGY_COLUMN && k.as_str() != TRACK_COLUMN
            })
            .map(|(k, v)| (k.clone(), json_to_feature(v)))
            .collect();

        tracks.push(build_track(row_no, album, energy, name, features)?);
    }
    Ok(tracks)
}

fn json_to_feature(val: &JsonValue) -> FeatureValue {
    match val {
        JsonValue::String(s) => FeatureValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                FeatureValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                FeatureValue::Float(f)
            } else {
                FeatureValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => FeatureValue::Bool(*b),
        JsonValue::Null => FeatureValue::Null,
        other => FeatureValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Works with files written by Pandas, Polars, or `generate_sample`.
fn load_parquet(path: &Path) -> anyhow::Result<Vec<Track>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut tracks = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let album_idx = schema
            .index_of(ALBUM_COLUMN)
            .map_err(|_| anyhow::anyhow!("missing '{ALBUM_COLUMN}' column"))?;
        let energy_idx = schema
            .index_of(ENERGY_COLUMN)
            .map_err(|_| anyhow::anyhow!("missing '{ENERGY_COLUMN}' column"))?;
        let track_idx = schema.index_of(TRACK_COLUMN).ok();

        let feature_cols: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != album_idx && *i != energy_idx && Some(*i) != track_idx)
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row in 0..batch.num_rows() {
            let row_no = tracks.len() + 1;
            let album = match extract_value(batch.column(album_idx), row) {
                FeatureValue::String(s) => Some(s),
                FeatureValue::Null => None,
                other => bail!("row {row_no}: album name {other} is not a string"),
            };
            let energy = extract_value(batch.column(energy_idx), row).as_f64();
            let name = track_idx.and_then(|i| match extract_value(batch.column(i), row) {
                FeatureValue::String(s) => Some(s),
                _ => None,
            });

            let mut features = BTreeMap::new();
            for (col_idx, col_name) in &feature_cols {
                features.insert(col_name.clone(), extract_value(batch.column(*col_idx), row));
            }

            tracks.push(build_track(row_no, album.as_deref(), energy, name, features)?);
        }
    }
    Ok(tracks)
}

/// Extract a single value from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> FeatureValue {
    if col.is_null(row) {
        return FeatureValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => FeatureValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => FeatureValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map_or(FeatureValue::Null, |a| FeatureValue::Integer(a.value(row) as i64)),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map_or(FeatureValue::Null, |a| FeatureValue::Integer(a.value(row))),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map_or(FeatureValue::Null, |a| FeatureValue::Float(a.value(row) as f64)),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map_or(FeatureValue::Null, |a| FeatureValue::Float(a.value(row))),
        DataType::Boolean => col
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map_or(FeatureValue::Null, |a| FeatureValue::Bool(a.value(row))),
        other => FeatureValue::String(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::array::{ArrayRef, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::NamedTempFile;

    use super::*;

    fn temp_with(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_csv_with_extra_columns() {
        let file = temp_with(
            ".csv",
            "track_name,album_name,energy,valence,mode\n\
             Astronomy Domine,The Piper at the Gates of Dawn,0.61,0.42,1\n\
             Money,The Dark Side of the Moon,0.45,,0\n",
        );
        let table = load_file(file.path()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.feature_columns, vec!["mode", "valence"]);
        let first = &table.tracks[0];
        assert_eq!(first.album, "The Piper at the Gates of Dawn");
        assert_eq!(first.name.as_deref(), Some("Astronomy Domine"));
        assert_eq!(first.energy, 0.61);
        assert_eq!(first.features["valence"], FeatureValue::Float(0.42));
        assert_eq!(table.tracks[1].features["valence"], FeatureValue::Null);
        assert_eq!(table.tracks[1].features["mode"], FeatureValue::Integer(0));
    }

    #[test]
    fn loads_tab_delimited() {
        let file = temp_with(".tsv", "album_name\tenergy\nMeddle\t0.3\n");
        let table = load_file(file.path()).unwrap();
        assert_eq!(table.tracks, vec![Track::new("Meddle", 0.3)]);
    }

    #[test]
    fn loads_json_records() {
        let file = temp_with(
            ".json",
            r#"[{"album_name": "Animals", "energy": 0.5, "tempo": 120.5},
                {"album_name": "The Wall", "energy": 1, "track_name": "Hey You"}]"#,
        );
        let table = load_file(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.tracks[0].features["tempo"], FeatureValue::Float(120.5));
        assert_eq!(table.tracks[1].energy, 1.0);
        assert_eq!(table.tracks[1].name.as_deref(), Some("Hey You"));
    }

    fn parquet_with(columns: Vec<(&str, ArrayRef)>) -> NamedTempFile {
        let schema = Arc::new(Schema::new(
            columns
                .iter()
                .map(|(name, col)| Field::new(*name, col.data_type().clone(), true))
                .collect::<Vec<_>>(),
        ));
        let batch =
            RecordBatch::try_new(schema.clone(), columns.into_iter().map(|(_, c)| c).collect())
                .unwrap();

        let mut file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.as_file_mut(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        file
    }

    #[test]
    fn loads_parquet_columns() {
        let file = parquet_with(vec![
            ("track_name", Arc::new(StringArray::from(vec!["Echoes", "Time"])) as ArrayRef),
            (
                "album_name",
                Arc::new(StringArray::from(vec!["Meddle", "The Dark Side of the Moon"])) as ArrayRef,
            ),
            ("energy", Arc::new(Float64Array::from(vec![0.31, 0.52])) as ArrayRef),
            ("tempo", Arc::new(Float64Array::from(vec![Some(133.5), None])) as ArrayRef),
            ("mode", Arc::new(Int64Array::from(vec![1, 0])) as ArrayRef),
            ("explicit", Arc::new(BooleanArray::from(vec![false, true])) as ArrayRef),
        ]);
        let table = load_file(file.path()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.feature_columns, vec!["explicit", "mode", "tempo"]);
        let echoes = &table.tracks[0];
        assert_eq!(echoes.album, "Meddle");
        assert_eq!(echoes.name.as_deref(), Some("Echoes"));
        assert_eq!(echoes.energy, 0.31);
        assert_eq!(echoes.features["tempo"], FeatureValue::Float(133.5));
        assert_eq!(echoes.features["mode"], FeatureValue::Integer(1));
        let time = &table.tracks[1];
        assert_eq!(time.features["tempo"], FeatureValue::Null);
        assert_eq!(time.features["explicit"], FeatureValue::Bool(true));
    }

    #[test]
    fn parquet_without_energy_is_load_error() {
        let file = parquet_with(vec![
            ("album_name", Arc::new(StringArray::from(vec!["Meddle"])) as ArrayRef),
            ("valence", Arc::new(Float64Array::from(vec![0.4])) as ArrayRef),
        ]);
        match load_file(file.path()).unwrap_err() {
            AnalysisError::Load { reason, .. } => assert!(reason.contains("missing 'energy'")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parquet_null_energy_names_the_row() {
        let file = parquet_with(vec![
            ("album_name", Arc::new(StringArray::from(vec!["Meddle", "Animals"])) as ArrayRef),
            ("energy", Arc::new(Float64Array::from(vec![Some(0.4), None])) as ArrayRef),
        ]);
        match load_file(file.path()).unwrap_err() {
            AnalysisError::Load { reason, .. } => {
                assert!(reason.contains("row 2: missing 'energy'"), "{reason}")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn row_numbers_in_errors_start_at_one() {
        let file = temp_with(".csv", "album_name,energy\nMeddle,loud\n");
        match load_file(file.path()).unwrap_err() {
            AnalysisError::Load { reason, .. } => assert!(reason.contains("row 1:"), "{reason}"),
            other => panic!("unexpected error: {other}"),
        }

        let file = temp_with(".json", r#"[{"album_name": "Meddle", "energy": 0.3}, {"energy": 0.4}]"#);
        match load_file(file.path()).unwrap_err() {
            AnalysisError::Load { reason, .. } => {
                assert!(reason.contains("row 2: empty 'album_name'"), "{reason}")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_load_error() {
        let err = load_file(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, AnalysisError::Load { .. }));
    }

    #[test]
    fn missing_energy_column_is_load_error() {
        let file = temp_with(".csv", "album_name,valence\nMeddle,0.3\n");
        let err = load_file(file.path()).unwrap_err();
        match err {
            AnalysisError::Load { reason, .. } => assert!(reason.contains("energy")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ragged_row_is_load_error() {
        let file = temp_with(".csv", "album_name,energy\nMeddle,0.3,extra\n");
        assert!(matches!(
            load_file(file.path()),
            Err(AnalysisError::Load { .. })
        ));
    }

    #[test]
    fn non_numeric_energy_is_load_error() {
        let file = temp_with(".csv", "album_name,energy\nMeddle,loud\n");
        assert!(matches!(
            load_file(file.path()),
            Err(AnalysisError::Load { .. })
        ));
    }

    #[test]
    fn energy_out_of_range_is_load_error() {
        let file = temp_with(".csv", "album_name,energy\nMeddle,1.7\n");
        assert!(matches!(
            load_file(file.path()),
            Err(AnalysisError::Load { .. })
        ));
    }

    #[test]
    fn unsupported_extension_is_load_error() {
        let file = temp_with(".xlsx", "whatever");
        assert!(matches!(
            load_file(file.path()),
            Err(AnalysisError::Load { .. })
        ));
    }

    #[test]
    fn feature_types_are_guessed() {
        assert_eq!(guess_feature_type("3"), FeatureValue::Integer(3));
        assert_eq!(guess_feature_type("0.25"), FeatureValue::Float(0.25));
        assert_eq!(guess_feature_type("TRUE"), FeatureValue::Bool(true));
        assert_eq!(guess_feature_type("NA"), FeatureValue::Null);
        assert_eq!(
            guess_feature_type("G major"),
            FeatureValue::String("G major".to_string())
        );
    }
}
