//! Ground-station coordinate registry, loaded once per run and immutable
//! for the run's duration.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use snowline_snap::Site;
use tracing::info;

use crate::error::{PipelineError, Result};

/// Loads the ordered site list from a headerless `site_id,lat,lon` CSV.
pub fn load_coordinates(path: &Path) -> Result<Vec<Site>> {
    if !path.is_file() {
        return Err(PipelineError::InvalidInput(format!(
            "coordinate file {} does not exist",
            path.display()
        )));
    }

    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut sites = Vec::new();
    let mut seen = HashSet::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = index + 1;
        if record.len() < 3 {
            return Err(PipelineError::InvalidInput(format!(
                "coordinate row {row} has {} fields, expected site_id,lat,lon",
                record.len()
            )));
        }

        let id = record[0].to_string();
        if id.is_empty() {
            return Err(PipelineError::InvalidInput(format!(
                "coordinate row {row} has an empty site id"
            )));
        }
        if !seen.insert(id.clone()) {
            return Err(PipelineError::InvalidInput(format!(
                "duplicate site id '{id}' in {}",
                path.display()
            )));
        }

        let lat: f64 = record[1].parse().map_err(|_| {
            PipelineError::InvalidInput(format!(
                "coordinate row {row}: invalid latitude '{}'",
                &record[1]
            ))
        })?;
        let lon: f64 = record[2].parse().map_err(|_| {
            PipelineError::InvalidInput(format!(
                "coordinate row {row}: invalid longitude '{}'",
                &record[2]
            ))
        })?;

        sites.push(Site::new(id, lat, lon));
    }

    if sites.is_empty() {
        return Err(PipelineError::InvalidInput(format!(
            "coordinate file {} contains no sites",
            path.display()
        )));
    }

    info!(sites = sites.len(), "loaded coordinate registry");
    Ok(sites)
}
