use std::path::Path;

use tracing::info;

use crate::error::{PipelineError, Result};
use crate::types::Scene;

/// Suffix that marks an immediate child directory as a candidate scene.
pub const SCENE_SUFFIX: &str = ".SEN3";

/// Enumerates candidate scene directories directly under `root`.
///
/// No recursion; order is whatever the filesystem yields, which callers use
/// for progress reporting only.
pub fn discover_scenes(root: &Path) -> Result<Vec<Scene>> {
    if !root.is_dir() {
        return Err(PipelineError::InvalidInput(format!(
            "scene root {} is not a directory",
            root.display()
        )));
    }

    let mut scenes = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        if path.is_dir() && name.ends_with(SCENE_SUFFIX) {
            scenes.push(Scene::from_path(path)?);
        }
    }

    info!(count = scenes.len(), root = %root.display(), "discovered candidate scenes");
    Ok(scenes)
}
