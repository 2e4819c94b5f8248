//! Extraction backed by ESA SNAP's `gpt` graph-processing tool.
//!
//! Each pass writes a coordinate list and a processing graph into a scratch
//! directory, runs `gpt`, and parses the pixel-extraction measurement file
//! the graph leaves behind. The radiometry itself happens inside SNAP.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;
use uuid::Uuid;

use crate::errors::ExtractError;
use crate::model::{ExtractionOptions, ExtractionSet, SceneExtractor, Site};

const MEASUREMENT_SUFFIX: &str = "_measurements.txt";

pub struct SnapExtractor {
    gpt_path: PathBuf,
    scratch_dir: PathBuf,
}

impl SnapExtractor {
    pub fn new(gpt_path: impl Into<PathBuf>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            gpt_path: gpt_path.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Uses `SNOWLINE_GPT` for the tool path when set, otherwise relies on
    /// `gpt` being on the search path.
    pub fn from_env() -> Self {
        let gpt_path = std::env::var("SNOWLINE_GPT").unwrap_or_else(|_| "gpt".to_string());
        Self::new(gpt_path, std::env::temp_dir())
    }

    fn create_run_dir(&self) -> Result<PathBuf, ExtractError> {
        let dir = self.scratch_dir.join(format!("snowline-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn run_gpt(&self, graph: &Path) -> Result<(), ExtractError> {
        let tool = self.gpt_path.display().to_string();
        debug!(graph = %graph.display(), %tool, "running gpt graph");

        let output = Command::new(&self.gpt_path)
            .arg(graph)
            .output()
            .map_err(|source| ExtractError::Launch {
                tool: tool.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExtractError::Tool {
                tool,
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn extract_in_dir(&self, run_dir: &Path, graph_xml: &str) -> Result<ExtractionSet, ExtractError> {
        let graph_path = run_dir.join("graph.xml");
        fs::write(&graph_path, graph_xml)?;
        self.run_gpt(&graph_path)?;
        let content = read_measurements(run_dir)?;
        parse_measurements(&content)
    }
}

impl SceneExtractor for SnapExtractor {
    fn primary_products(
        &self,
        manifest: &Path,
        sites: &[Site],
        options: &ExtractionOptions,
    ) -> Result<ExtractionSet, ExtractError> {
        let run_dir = self.create_run_dir()?;
        let coords_path = run_dir.join("coordinates.txt");
        write_coordinates(&coords_path, sites)?;

        let graph = snow_graph(manifest, &coords_path, &run_dir, options);
        let result = self.extract_in_dir(&run_dir, &graph);
        fs::remove_dir_all(&run_dir).ok();
        result
    }

    fn auxiliary_bands(
        &self,
        manifest: &Path,
        sites: &[Site],
        bands: &[String],
    ) -> Result<ExtractionSet, ExtractError> {
        let run_dir = self.create_run_dir()?;
        let coords_path = run_dir.join("coordinates.txt");
        write_coordinates(&coords_path, sites)?;

        let graph = band_graph(manifest, &coords_path, &run_dir, bands);
        let result = self.extract_in_dir(&run_dir, &graph);
        fs::remove_dir_all(&run_dir).ok();
        result
    }
}

/// PixEx coordinate list: one `Name Latitude Longitude` row per site.
pub(crate) fn write_coordinates(path: &Path, sites: &[Site]) -> Result<(), ExtractError> {
    let mut file = fs::File::create(path)?;
    writeln!(file, "Name\tLatitude\tLongitude")?;
    for site in sites {
        writeln!(file, "{}\t{}\t{}", site.id, site.lat, site.lon)?;
    }
    Ok(())
}

fn snow_graph(
    manifest: &Path,
    coords: &Path,
    out_dir: &Path,
    options: &ExtractionOptions,
) -> String {
    format!(
        r#"<graph id="snowline-snow">
  <version>1.0</version>
  <node id="read">
    <operator>Read</operator>
    <parameters>
      <file>{manifest}</file>
    </parameters>
  </node>
  <node id="snow">
    <operator>Snow.S3Snow</operator>
    <sources>
      <sourceProduct refid="read"/>
    </sources>
    <parameters>
      <considerSnowPollution>{pollution}</considerSnowPollution>
      <pollutionDelta>{delta_p}</pollutionDelta>
      <applyVicariousGains>{gains}</applyVicariousGains>
      <computeElevationProducts>{dem}</computeElevationProducts>
    </parameters>
  </node>
  <node id="extract">
    <operator>PixEx</operator>
    <sources>
      <sourceProduct refid="snow"/>
    </sources>
    <parameters>
      <coordinatesFile>{coords}</coordinatesFile>
      <windowSize>1</windowSize>
      <exportTiePoints>false</exportTiePoints>
      <outputDir>{out}</outputDir>
    </parameters>
  </node>
</graph>
"#,
        manifest = manifest.display(),
        pollution = options.pollution,
        delta_p = options.delta_p,
        gains = options.gains,
        dem = options.dem_products,
        coords = coords.display(),
        out = out_dir.display(),
    )
}

fn band_graph(manifest: &Path, coords: &Path, out_dir: &Path, bands: &[String]) -> String {
    format!(
        r#"<graph id="snowline-bands">
  <version>1.0</version>
  <node id="read">
    <operator>Read</operator>
    <parameters>
      <file>{manifest}</file>
    </parameters>
  </node>
  <node id="select">
    <operator>BandSelect</operator>
    <sources>
      <sourceProduct refid="read"/>
    </sources>
    <parameters>
      <sourceBands>{bands}</sourceBands>
    </parameters>
  </node>
  <node id="extract">
    <operator>PixEx</operator>
    <sources>
      <sourceProduct refid="select"/>
    </sources>
    <parameters>
      <coordinatesFile>{coords}</coordinatesFile>
      <windowSize>1</windowSize>
      <exportTiePoints>true</exportTiePoints>
      <outputDir>{out}</outputDir>
    </parameters>
  </node>
</graph>
"#,
        manifest = manifest.display(),
        bands = bands.join(","),
        coords = coords.display(),
        out = out_dir.display(),
    )
}

fn read_measurements(dir: &Path) -> Result<String, ExtractError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        if name.ends_with(MEASUREMENT_SUFFIX) {
            return Ok(fs::read_to_string(path)?);
        }
    }
    Err(ExtractError::MissingMeasurements {
        dir: dir.to_path_buf(),
    })
}

/// Parses a PixEx measurement file into per-site band values.
///
/// Leading `#` lines are comments; the first real row is a tab-separated
/// header whose band columns start after the `Time(...)` column. No-data
/// cells (empty, `NaN`, `-999`) leave the band absent for that site, and a
/// site whose cells are all no-data is absent from the set.
pub(crate) fn parse_measurements(content: &str) -> Result<ExtractionSet, ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let name_idx = headers
        .iter()
        .position(|h| h.trim() == "Name")
        .ok_or_else(|| ExtractError::InvalidHeader("no 'Name' column".to_string()))?;
    let time_idx = headers
        .iter()
        .position(|h| h.trim_start().starts_with("Time"))
        .ok_or_else(|| ExtractError::InvalidHeader("no 'Time' column".to_string()))?;
    let band_start = time_idx + 1;

    let mut set = ExtractionSet::default();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line_index = index + 1;
        if record.len() != headers.len() {
            return Err(ExtractError::DataRow {
                line_index,
                message: format!(
                    "expected {} fields, found {}",
                    headers.len(),
                    record.len()
                ),
            });
        }

        let site = record.get(name_idx).unwrap_or_default().trim();
        if site.is_empty() {
            return Err(ExtractError::DataRow {
                line_index,
                message: "empty site name".to_string(),
            });
        }

        for (band, raw) in headers.iter().zip(record.iter()).skip(band_start) {
            if let Some(value) = parse_value(raw, line_index, band)? {
                set.insert(site, band.trim(), value);
            }
        }
    }

    Ok(set)
}

fn parse_value(raw: &str, line_index: usize, band: &str) -> Result<Option<f64>, ExtractError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(value) => {
            if (value + 999.0).abs() < f64::EPSILON {
                Ok(None)
            } else {
                Ok(Some(value))
            }
        }
        Err(err) => Err(ExtractError::DataRow {
            line_index,
            message: format!("failed to parse band '{band}' as float: {err}"),
        }),
    }
}
