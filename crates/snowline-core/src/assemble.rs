use std::collections::HashMap;

use chrono::{Datelike, Timelike};
use polars::prelude::{Column, DataFrame, NamedFrom, Series};
use snowline_snap::ExtractionSet;
use tracing::warn;

use crate::columns::ColumnCategory;
use crate::error::{PipelineError, Result};
use crate::types::Scene;

/// Accumulates measurement columns across a scene's rows, preserving
/// first-seen column order and backfilling rows that predate a column.
struct MeasurementAccumulator {
    order: Vec<String>,
    values: HashMap<String, Vec<Option<f64>>>,
}

impl MeasurementAccumulator {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            values: HashMap::new(),
        }
    }

    fn push(&mut self, name: &str, row: usize, value: f64) -> Result<()> {
        if !self.values.contains_key(name) {
            if ColumnCategory::classify(name).is_none() {
                return Err(PipelineError::SchemaMismatch(format!(
                    "extractor produced column '{name}' outside the output schema"
                )));
            }
            self.order.push(name.to_string());
        }
        let column = self.values.entry(name.to_string()).or_default();
        if column.len() < row {
            column.resize(row, None);
        }
        column.push(Some(value));
        Ok(())
    }

    fn into_columns(mut self, rows: usize) -> Vec<Column> {
        let mut columns = Vec::with_capacity(self.order.len());
        for name in &self.order {
            let mut data = self.values.remove(name).unwrap_or_default();
            data.resize(rows, None);
            columns.push(Series::new(name.as_str().into(), data).into());
        }
        columns
    }
}

/// Joins a scene's primary and auxiliary measurements into one record set.
///
/// Rows are built for the primary mapping's sites only, in first-seen order;
/// every row carries the scene's date/time decomposition and platform code.
/// Sites that appear only in the auxiliary mapping are dropped (and logged),
/// matching the behaviour of the legacy extraction chain.
pub fn assemble_scene(
    scene: &Scene,
    primary: &ExtractionSet,
    auxiliary: &ExtractionSet,
) -> Result<DataFrame> {
    let stamp = scene.timestamp;
    let site_ids: Vec<&str> = primary.sites().collect();
    let rows = site_ids.len();

    let dropped: Vec<&str> = auxiliary
        .sites()
        .filter(|site| primary.site(site).is_none())
        .collect();
    if !dropped.is_empty() {
        warn!(
            scene = %scene.name,
            sites = ?dropped,
            "auxiliary-only sites dropped from scene record set"
        );
    }

    let mut measurements = MeasurementAccumulator::new();
    for (row, site) in site_ids.iter().enumerate() {
        if let Some(values) = primary.site(site) {
            for band in values.bands() {
                if let Some(value) = values.get(band) {
                    measurements.push(band, row, value)?;
                }
            }
        }
        if let Some(values) = auxiliary.site(site) {
            for band in values.bands() {
                if let Some(value) = values.get(band) {
                    measurements.push(band, row, value)?;
                }
            }
        }
    }

    let mut columns: Vec<Column> = Vec::new();
    columns.push(Series::new("station".into(), site_ids.clone()).into());
    columns.push(Series::new("year".into(), vec![stamp.year(); rows]).into());
    columns.push(Series::new("month".into(), vec![stamp.month() as i32; rows]).into());
    columns.push(Series::new("day".into(), vec![stamp.day() as i32; rows]).into());
    columns.push(Series::new("hour".into(), vec![stamp.hour() as i32; rows]).into());
    columns.push(Series::new("minute".into(), vec![stamp.minute() as i32; rows]).into());
    columns.push(Series::new("second".into(), vec![stamp.second() as i32; rows]).into());
    columns.push(Series::new("dayofyear".into(), vec![stamp.ordinal() as i32; rows]).into());
    columns.push(Series::new("platform".into(), vec![scene.platform.code(); rows]).into());
    columns.extend(measurements.into_columns(rows));

    Ok(DataFrame::new(columns)?)
}
