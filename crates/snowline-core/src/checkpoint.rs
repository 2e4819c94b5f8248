//! Scene-scoped durable checkpoints that make multi-hour runs resumable
//! across process restarts.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use snowline_snap::Site;
use tracing::info;

use crate::error::{PipelineError, Result};

/// Serialized form of a missing measurement cell.
pub const MISSING_VALUE: &str = "-999";

/// Suffix of every scene checkpoint file in the output directory.
pub const CHECKPOINT_SUFFIX: &str = "_tmp.csv";

/// A durable per-scene partial result on disk.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub scene_name: String,
    pub path: PathBuf,
}

pub fn checkpoint_path(out_dir: &Path, scene_name: &str) -> PathBuf {
    out_dir.join(format!("{scene_name}{CHECKPOINT_SUFFIX}"))
}

pub fn has_checkpoint(out_dir: &Path, scene_name: &str) -> bool {
    checkpoint_path(out_dir, scene_name).is_file()
}

/// Writes a scene's record set to its checkpoint file, with a header row and
/// missing cells serialized as [`MISSING_VALUE`].
///
/// Refuses to touch an existing checkpoint: assembling the same scene twice
/// in one run is a caller bug that would otherwise duplicate rows.
pub fn write_checkpoint(
    out_dir: &Path,
    scene_name: &str,
    records: &mut DataFrame,
) -> Result<PathBuf> {
    let path = checkpoint_path(out_dir, scene_name);
    if path.is_file() {
        return Err(PipelineError::CheckpointExists {
            scene: scene_name.to_string(),
            path,
        });
    }

    fs::create_dir_all(out_dir)?;
    let mut file = File::create(&path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_null_value(MISSING_VALUE.to_string())
        .finish(records)?;
    Ok(path)
}

/// Lists the checkpoints present in the output directory, sorted by scene
/// name so downstream aggregation is deterministic.
pub fn list_checkpoints(out_dir: &Path) -> Result<Vec<Checkpoint>> {
    if !out_dir.is_dir() {
        return Err(PipelineError::InvalidInput(format!(
            "output directory {} does not exist",
            out_dir.display()
        )));
    }

    let mut checkpoints = Vec::new();
    for entry in fs::read_dir(out_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        if let Some(scene_name) = name.strip_suffix(CHECKPOINT_SUFFIX) {
            checkpoints.push(Checkpoint {
                scene_name: scene_name.to_string(),
                path,
            });
        }
    }

    checkpoints.sort_by(|a, b| a.scene_name.cmp(&b.scene_name));
    Ok(checkpoints)
}

/// Recovery-mode bookkeeping: finds the checkpoints a previous run left
/// behind and reports which registry sites each one salvaged, without
/// re-running any extraction.
pub fn recover_checkpoints(out_dir: &Path, sites: &[Site]) -> Result<Vec<Checkpoint>> {
    let checkpoints = list_checkpoints(out_dir)?;
    if checkpoints.is_empty() {
        return Err(PipelineError::Recovery(format!(
            "no checkpoint files found in {}",
            out_dir.display()
        )));
    }

    for checkpoint in &checkpoints {
        let stations = read_stations(&checkpoint.path)?;
        let salvaged = sites
            .iter()
            .filter(|site| stations.iter().any(|station| *station == site.id))
            .count();
        info!(
            scene = %checkpoint.scene_name,
            sites = salvaged,
            "salvaging checkpointed scene"
        );
    }

    Ok(checkpoints)
}

fn read_stations(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let station_idx = headers.iter().position(|h| h == "station").ok_or_else(|| {
        PipelineError::SchemaMismatch(format!(
            "checkpoint {} has no station column",
            path.display()
        ))
    })?;

    let mut stations = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(value) = record.get(station_idx) {
            if !stations.iter().any(|s| s == value) {
                stations.push(value.to_string());
            }
        }
    }
    Ok(stations)
}
