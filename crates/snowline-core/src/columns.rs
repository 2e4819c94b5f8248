// crates/snowline-core/src/columns.rs

//! Canonical output column ordering.

use std::cmp::Ordering;

use crate::error::{PipelineError, Result};

/// Identity and metadata columns, in their fixed output order.
pub const FIXED_COLUMNS: [&str; 22] = [
    "station",
    "year",
    "month",
    "day",
    "hour",
    "minute",
    "second",
    "dayofyear",
    "platform",
    "snow_specific_area",
    "ndsi",
    "ndbi",
    "sza",
    "vza",
    "saa",
    "vaa",
    "horizontal_wind_vector_1",
    "horizontal_wind_vector_2",
    "humidity",
    "sea_level_pressure",
    "total_columnar_water_vapour",
    "total_ozone",
];

/// Appended to the fixed prefix when DEM products are enabled.
pub const ELEVATION_COLUMNS: [&str; 4] = ["altitude", "slope", "aspect", "elevation_variance"];

/// Category assigned to every output column when a scene record set is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCategory {
    Fixed,
    Elevation,
    Reflectance,
    Brightness,
    Atmospheric,
}

impl ColumnCategory {
    /// Classifies a column name, or `None` for a name outside the known
    /// output schema.
    pub fn classify(name: &str) -> Option<ColumnCategory> {
        if FIXED_COLUMNS.contains(&name) {
            return Some(ColumnCategory::Fixed);
        }
        if ELEVATION_COLUMNS.contains(&name) {
            return Some(ColumnCategory::Elevation);
        }
        if name.contains("atmospheric") {
            return Some(ColumnCategory::Atmospheric);
        }
        if name.contains("reflectance") {
            return Some(ColumnCategory::Reflectance);
        }
        if name.contains("BRR") {
            return Some(ColumnCategory::Brightness);
        }
        None
    }
}

/// Compares strings with embedded digit runs ordered numerically, so
/// `band_2` sorts before `band_10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.as_bytes();
    let mut right = b.as_bytes();

    loop {
        match (left.first(), right.first()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => match (l.is_ascii_digit(), r.is_ascii_digit()) {
                (true, true) => {
                    let (l_num, l_rest) = take_digits(left);
                    let (r_num, r_rest) = take_digits(right);
                    match l_num.cmp(&r_num) {
                        Ordering::Equal => {
                            left = l_rest;
                            right = r_rest;
                        }
                        other => return other,
                    }
                }
                (true, false) => return Ordering::Less,
                (false, true) => return Ordering::Greater,
                (false, false) => match l.cmp(r) {
                    Ordering::Equal => {
                        left = &left[1..];
                        right = &right[1..];
                    }
                    other => return other,
                },
            },
        }
    }
}

fn take_digits(bytes: &[u8]) -> (u64, &[u8]) {
    let mut value: u64 = 0;
    let mut index = 0;
    while index < bytes.len() && bytes[index].is_ascii_digit() {
        value = value
            .saturating_mul(10)
            .saturating_add(u64::from(bytes[index] - b'0'));
        index += 1;
    }
    (value, &bytes[index..])
}

/// Builds the canonical output column order for a run.
///
/// Fixed identity columns first (extended with the elevation set when DEM
/// products are enabled), then the reflectance, brightness and atmospheric
/// groups, each naturally sorted. A column that classifies to no known
/// category, or an elevation column when DEM products are disabled, is a
/// schema mismatch.
pub fn canonical_columns(data_columns: &[String], elevation: bool) -> Result<Vec<String>> {
    let mut canonical: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    if elevation {
        canonical.extend(ELEVATION_COLUMNS.iter().map(|c| c.to_string()));
    }

    let mut reflectance = Vec::new();
    let mut brightness = Vec::new();
    let mut atmospheric = Vec::new();

    for name in data_columns {
        match ColumnCategory::classify(name) {
            Some(ColumnCategory::Fixed) => {}
            Some(ColumnCategory::Elevation) => {
                if !elevation {
                    return Err(PipelineError::SchemaMismatch(format!(
                        "column '{name}' belongs to the elevation product set, which is disabled for this run"
                    )));
                }
            }
            Some(ColumnCategory::Reflectance) => reflectance.push(name.clone()),
            Some(ColumnCategory::Brightness) => brightness.push(name.clone()),
            Some(ColumnCategory::Atmospheric) => atmospheric.push(name.clone()),
            None => {
                return Err(PipelineError::SchemaMismatch(format!(
                    "column '{name}' does not belong to the output schema"
                )))
            }
        }
    }

    for group in [&mut reflectance, &mut brightness, &mut atmospheric] {
        group.sort_by(|a, b| natural_cmp(a, b));
        group.dedup();
    }

    canonical.extend(reflectance);
    canonical.extend(brightness);
    canonical.extend(atmospheric);
    Ok(canonical)
}
