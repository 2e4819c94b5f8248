//! Sequential run orchestration: one scene at a time, checkpoint after each,
//! aggregation once at the end.

use std::path::PathBuf;

use snowline_snap::{ExtractionOptions, SceneExtractor};
use tracing::{info, warn};

use crate::aggregate::aggregate;
use crate::assemble::assemble_scene;
use crate::checkpoint;
use crate::discovery::discover_scenes;
use crate::error::{PipelineError, Result};
use crate::extract::extract_scene;
use crate::registry::load_coordinates;
use crate::types::{parse_scene_name, PlatformFilter};

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub scene_root: PathBuf,
    pub coords_file: PathBuf,
    pub out_dir: PathBuf,
    pub options: ExtractionOptions,
    pub platforms: PlatformFilter,
}

#[derive(Debug)]
pub struct RunReport {
    pub scenes_found: usize,
    pub scenes_checkpointed: usize,
    pub scenes_skipped: usize,
    pub output: Option<PathBuf>,
}

/// Runs discovery, per-scene extraction and aggregation end to end.
///
/// Scenes are processed strictly one at a time; each scene's intermediate
/// state is dropped before the next scene starts. A scene whose checkpoint
/// already exists (a previous interrupted run got that far) is not
/// reprocessed. Extraction failures skip the scene and the run continues.
pub fn run(config: &RunConfig, extractor: &dyn SceneExtractor) -> Result<RunReport> {
    let sites = load_coordinates(&config.coords_file)?;
    std::fs::create_dir_all(&config.out_dir)?;

    let scenes: Vec<_> = discover_scenes(&config.scene_root)?
        .into_iter()
        .filter(|scene| config.platforms.matches(scene.platform))
        .collect();

    let total = scenes.len();
    info!(total, "processing scenes");

    let mut checkpointed = 0usize;
    let mut skipped = 0usize;
    let mut output_name: Option<String> = None;

    for (index, scene) in scenes.iter().enumerate() {
        info!(scene = %scene.name, "processing scene {}/{}", index + 1, total);

        if checkpoint::has_checkpoint(&config.out_dir, &scene.name) {
            info!(scene = %scene.name, "checkpoint already present, not reprocessing");
            if output_name.is_none() {
                output_name = Some(scene.date_token());
            }
            checkpointed += 1;
            continue;
        }

        let extraction = match extract_scene(extractor, scene, &sites, &config.options) {
            Ok(Some(extraction)) => extraction,
            Ok(None) => {
                warn!(scene = %scene.name, "scene produced no primary products, skipping");
                skipped += 1;
                continue;
            }
            Err(err) => {
                warn!(scene = %scene.name, error = %err, "scene extraction failed, skipping");
                skipped += 1;
                continue;
            }
        };

        let mut records = assemble_scene(scene, &extraction.primary, &extraction.auxiliary)?;
        checkpoint::write_checkpoint(&config.out_dir, &scene.name, &mut records)?;
        if output_name.is_none() {
            output_name = Some(scene.date_token());
        }
        checkpointed += 1;
    }

    let output = match output_name {
        Some(name) => Some(aggregate(
            &config.out_dir,
            &name,
            config.options.dem_products,
        )?),
        None => {
            warn!("no scene produced results, skipping aggregation");
            None
        }
    };

    Ok(RunReport {
        scenes_found: total,
        scenes_checkpointed: checkpointed,
        scenes_skipped: skipped,
        output,
    })
}

/// Recovery mode: aggregate whatever checkpoints survived a previous run,
/// without touching the imagery.
pub fn recover(config: &RunConfig) -> Result<RunReport> {
    let sites = load_coordinates(&config.coords_file)?;
    let checkpoints = checkpoint::recover_checkpoints(&config.out_dir, &sites)?;

    let first = checkpoints.first().ok_or_else(|| {
        PipelineError::Recovery(format!(
            "no checkpoint files found in {}",
            config.out_dir.display()
        ))
    })?;
    let (timestamp, _) = parse_scene_name(&first.scene_name)?;
    let output_name = timestamp.format("%Y%m%d").to_string();

    let output = aggregate(
        &config.out_dir,
        &output_name,
        config.options.dem_products,
    )?;

    Ok(RunReport {
        scenes_found: checkpoints.len(),
        scenes_checkpointed: checkpoints.len(),
        scenes_skipped: 0,
        output: Some(output),
    })
}
