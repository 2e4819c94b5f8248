pub mod errors;
pub mod gpt;
pub mod model;

pub use errors::ExtractError;
pub use gpt::SnapExtractor;
pub use model::{
    ExtractionOptions, ExtractionSet, SceneExtractor, Site, SiteValues, MANIFEST_FILE,
};

#[cfg(test)]
mod tests;
