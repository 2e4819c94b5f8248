// crates/snowline-core/src/types.rs

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use snowline_snap::MANIFEST_FILE;

use crate::error::{PipelineError, Result};

/// Sentinel-3 platform designator, encoded as 0/1 in output rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    A,
    B,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::A => "A",
            Platform::B => "B",
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Platform::A => 0,
            Platform::B => 1,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<char> for Platform {
    type Error = PipelineError;

    fn try_from(value: char) -> Result<Self> {
        match value {
            'A' => Ok(Platform::A),
            'B' => Ok(Platform::B),
            other => Err(PipelineError::Configuration(format!(
                "unknown platform designator '{other}'"
            ))),
        }
    }
}

/// Which platforms a run should process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFilter {
    A,
    B,
    Both,
}

impl PlatformFilter {
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_uppercase().as_str() {
            "A" => Ok(PlatformFilter::A),
            "B" => Ok(PlatformFilter::B),
            "AB" => Ok(PlatformFilter::Both),
            other => Err(PipelineError::Configuration(format!(
                "platform filter must be 'A', 'B' or 'AB', got '{other}'"
            ))),
        }
    }

    pub fn matches(&self, platform: Platform) -> bool {
        match self {
            PlatformFilter::A => platform == Platform::A,
            PlatformFilter::B => platform == Platform::B,
            PlatformFilter::Both => true,
        }
    }
}

/// One timestamped `.SEN3` scene directory.
#[derive(Debug, Clone)]
pub struct Scene {
    pub name: String,
    pub path: PathBuf,
    pub timestamp: NaiveDateTime,
    pub platform: Platform,
}

impl Scene {
    /// Builds a scene from its directory path, deriving timestamp and
    /// platform from the directory name.
    pub fn from_path(path: PathBuf) -> Result<Self> {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => {
                return Err(PipelineError::Configuration(format!(
                    "scene path {} has no usable name",
                    path.display()
                )))
            }
        };
        let (timestamp, platform) = parse_scene_name(&name)?;
        Ok(Self {
            name,
            path,
            timestamp,
            platform,
        })
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(MANIFEST_FILE)
    }

    /// `YYYYMMDD` token used to name the consolidated output file.
    pub fn date_token(&self) -> String {
        self.timestamp.format("%Y%m%d").to_string()
    }
}

/// Derives `(timestamp, platform)` from a scene directory name.
///
/// Names follow the Sentinel-3 convention: the platform letter is the third
/// byte (`S3A...`/`S3B...`) and the sensing start time is the eighth
/// `_`-separated field, formatted `%Y%m%dT%H%M%S`.
pub fn parse_scene_name(name: &str) -> Result<(NaiveDateTime, Platform)> {
    let designator = name.chars().nth(2).ok_or_else(|| {
        PipelineError::Configuration(format!(
            "scene name '{name}' is too short for a platform designator"
        ))
    })?;
    let platform = Platform::try_from(designator)?;

    let field = name.split('_').nth(7).ok_or_else(|| {
        PipelineError::Configuration(format!(
            "scene name '{name}' is missing the sensing-start field"
        ))
    })?;
    let timestamp = NaiveDateTime::parse_from_str(field, "%Y%m%dT%H%M%S").map_err(|err| {
        PipelineError::Configuration(format!(
            "scene name '{name}' has an invalid sensing-start time: {err}"
        ))
    })?;

    Ok((timestamp, platform))
}
