//! Glue between the pipeline and the external extraction routines.

use once_cell::sync::Lazy;
use snowline_snap::{ExtractionOptions, ExtractionSet, SceneExtractor, Site};
use tracing::debug;

use crate::error::Result;
use crate::types::Scene;

/// Auxiliary band names requested alongside the snow products.
pub static AUXILIARY_BANDS: Lazy<Vec<String>> = Lazy::new(|| {
    let mut bands: Vec<String> = (1..=25)
        .map(|level| format!("atmospheric_temperature_profile_pressure_level_{level}"))
        .collect();
    for name in [
        "horizontal_wind_vector_1",
        "horizontal_wind_vector_2",
        "humidity",
        "sea_level_pressure",
        "total_columnar_water_vapour",
        "total_ozone",
    ] {
        bands.push(name.to_string());
    }
    bands
});

/// Raw per-site measurements for one scene, before assembly.
#[derive(Debug)]
pub struct SceneExtraction {
    pub primary: ExtractionSet,
    pub auxiliary: ExtractionSet,
}

/// Runs both extraction passes for a scene.
///
/// Returns `None` when the primary pass yields no usable site; the auxiliary
/// pass is skipped entirely in that case, since band values are only
/// meaningful alongside primary results.
pub fn extract_scene(
    extractor: &dyn SceneExtractor,
    scene: &Scene,
    sites: &[Site],
    options: &ExtractionOptions,
) -> Result<Option<SceneExtraction>> {
    let manifest = scene.manifest_path();

    let primary = extractor.primary_products(&manifest, sites, options)?;
    if primary.is_empty() {
        debug!(scene = %scene.name, "no primary products, auxiliary extraction skipped");
        return Ok(None);
    }

    let auxiliary = extractor.auxiliary_bands(&manifest, sites, AUXILIARY_BANDS.as_slice())?;
    Ok(Some(SceneExtraction { primary, auxiliary }))
}
