use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ExtractError;

/// Name of the manifest file at the root of every `.SEN3` scene directory.
pub const MANIFEST_FILE: &str = "xfdumanifest.xml";

/// One ground station of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
}

impl Site {
    pub fn new(id: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lon,
        }
    }
}

/// Switches forwarded verbatim to the snow processor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionOptions {
    pub pollution: bool,
    pub delta_p: f64,
    pub gains: bool,
    pub dem_products: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            pollution: false,
            delta_p: 0.1,
            gains: false,
            dem_products: false,
        }
    }
}

/// Band name to value mapping for one site, preserving first-seen band order.
///
/// Bands with no usable value at a site are simply absent.
#[derive(Debug, Clone, Default)]
pub struct SiteValues {
    order: Vec<String>,
    values: HashMap<String, f64>,
}

impl SiteValues {
    pub fn insert(&mut self, band: impl Into<String>, value: f64) {
        let band = band.into();
        if !self.values.contains_key(&band) {
            self.order.push(band.clone());
        }
        self.values.insert(band, value);
    }

    pub fn get(&self, band: &str) -> Option<f64> {
        self.values.get(band).copied()
    }

    pub fn bands(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Per-site measurements returned by one extraction pass over one scene.
///
/// Sites with no usable data for the scene are absent from the set.
#[derive(Debug, Clone, Default)]
pub struct ExtractionSet {
    order: Vec<String>,
    records: HashMap<String, SiteValues>,
}

impl ExtractionSet {
    pub fn insert(&mut self, site: impl Into<String>, band: impl Into<String>, value: f64) {
        let site = site.into();
        if !self.records.contains_key(&site) {
            self.order.push(site.clone());
        }
        self.records.entry(site).or_default().insert(band, value);
    }

    pub fn site(&self, id: &str) -> Option<&SiteValues> {
        self.records.get(id)
    }

    /// Site ids in first-seen order.
    pub fn sites(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Boundary to the external per-scene extraction routines.
///
/// Both passes take the scene's manifest path and the full site list; the
/// returned sets omit sites the scene does not cover.
pub trait SceneExtractor {
    /// Core snow products for every site that falls inside the scene.
    fn primary_products(
        &self,
        manifest: &Path,
        sites: &[Site],
        options: &ExtractionOptions,
    ) -> Result<ExtractionSet, ExtractError>;

    /// Supplementary values for the named bands.
    fn auxiliary_bands(
        &self,
        manifest: &Path,
        sites: &[Site],
        bands: &[String],
    ) -> Result<ExtractionSet, ExtractError>;
}
