//! Reassembles scene checkpoints into the consolidated output table.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use polars::prelude::{
    Column, CsvReadOptions, CsvWriter, DataFrame, DataType, NamedFrom, SerReader, SerWriter,
    Series, SortMultipleOptions,
};
use tracing::info;

use crate::checkpoint::{self, MISSING_VALUE};
use crate::columns::canonical_columns;
use crate::error::{PipelineError, Result};

const SORT_COLUMN: &str = "sort_ts";

const INT_COLUMNS: [&str; 8] = [
    "year",
    "month",
    "day",
    "hour",
    "minute",
    "second",
    "dayofyear",
    "platform",
];

/// Concatenates every checkpoint in `out_dir` into one table, enforces the
/// canonical column order, sorts rows by their composite timestamp and
/// appends the result to `out_dir/<output_name>`.
pub fn aggregate(out_dir: &Path, output_name: &str, elevation: bool) -> Result<PathBuf> {
    let checkpoints = checkpoint::list_checkpoints(out_dir)?;
    if checkpoints.is_empty() {
        return Err(PipelineError::Recovery(format!(
            "no checkpoint files found in {}",
            out_dir.display()
        )));
    }

    let mut frames = Vec::with_capacity(checkpoints.len());
    let mut data_columns: Vec<String> = Vec::new();
    for checkpoint in &checkpoints {
        let frame = read_checkpoint(&checkpoint.path)?;
        for name in frame.get_column_names() {
            let name = name.as_str();
            if !data_columns.iter().any(|existing| existing == name) {
                data_columns.push(name.to_string());
            }
        }
        frames.push(frame);
    }

    let canonical = canonical_columns(&data_columns, elevation)?;

    let mut iter = frames.into_iter();
    let mut combined = match iter.next() {
        Some(frame) => align_columns(frame, &canonical)?,
        None => {
            return Err(PipelineError::Recovery(
                "no checkpoint data to aggregate".to_string(),
            ))
        }
    };
    for frame in iter {
        let aligned = align_columns(frame, &canonical)?;
        combined.vstack_mut(&aligned)?;
    }

    let mut sorted = sort_by_timestamp(combined)?;

    let path = out_dir.join(output_name);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_null_value(MISSING_VALUE.to_string())
        .finish(&mut sorted)?;

    info!(rows = sorted.height(), path = %path.display(), "wrote consolidated output");
    Ok(path)
}

fn read_checkpoint(path: &Path) -> Result<DataFrame> {
    // Infer over the whole file: a measurement column can be all-sentinel
    // for the first rows and fractional later.
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    normalize_dtypes(frame)
}

/// Forces integer metadata columns, a string station column and Float64
/// measurements, so that vstacks stay well-typed when CSV schema inference
/// disagrees across checkpoint files.
fn normalize_dtypes(frame: DataFrame) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(frame.width());
    for column in frame.get_columns() {
        let name = column.name().as_str();
        let cast = if name == "station" {
            column.cast(&DataType::String)?
        } else if INT_COLUMNS.contains(&name) {
            column.cast(&DataType::Int32)?
        } else {
            column.cast(&DataType::Float64)?
        };
        columns.push(cast);
    }
    Ok(DataFrame::new(columns)?)
}

/// Reorders a checkpoint frame into the canonical layout, filling columns
/// the frame lacks with nulls (serialized later as the missing-value
/// sentinel).
fn align_columns(frame: DataFrame, canonical: &[String]) -> Result<DataFrame> {
    let height = frame.height();
    let mut columns: Vec<Column> = Vec::with_capacity(canonical.len());
    for name in canonical {
        match frame.column(name) {
            Ok(column) => columns.push(column.clone()),
            Err(_) => {
                let filler = Series::full_null(name.as_str().into(), height, &DataType::Float64);
                columns.push(filler.into());
            }
        }
    }
    Ok(DataFrame::new(columns)?)
}

/// Sorts rows ascending by a composite key built from the six date/time
/// columns; the key never reaches the written output.
fn sort_by_timestamp(mut frame: DataFrame) -> Result<DataFrame> {
    let key = composite_key(&frame)?;
    frame.with_column(Series::new(SORT_COLUMN.into(), key))?;
    let sorted = frame.sort(
        [SORT_COLUMN],
        SortMultipleOptions::default().with_maintain_order(true),
    )?;
    Ok(sorted.drop(SORT_COLUMN)?)
}

fn composite_key(frame: &DataFrame) -> Result<Vec<i64>> {
    let year = frame.column("year")?.i32()?;
    let month = frame.column("month")?.i32()?;
    let day = frame.column("day")?.i32()?;
    let hour = frame.column("hour")?.i32()?;
    let minute = frame.column("minute")?.i32()?;
    let second = frame.column("second")?.i32()?;

    let mut key = Vec::with_capacity(frame.height());
    for row in 0..frame.height() {
        let y = i64::from(year.get(row).unwrap_or(0));
        let mo = i64::from(month.get(row).unwrap_or(0));
        let d = i64::from(day.get(row).unwrap_or(0));
        let h = i64::from(hour.get(row).unwrap_or(0));
        let mi = i64::from(minute.get(row).unwrap_or(0));
        let s = i64::from(second.get(row).unwrap_or(0));
        key.push((((((y * 12 + mo) * 31 + d) * 24 + h) * 60 + mi) * 60) + s);
    }
    Ok(key)
}
