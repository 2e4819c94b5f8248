//! Merges independently-produced per-station summary tables into one CSV.
//!
//! Expects `<root>/<batch>/out1/<station>.csv` with a matching file under
//! `out2`; the two tables are joined on `dayofyear`/`hour`/`minute`, rows
//! whose `solar_flux_band_1` is -1 are dropped, and every station's rows are
//! concatenated with the station name in a leading `site` column.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use polars::prelude::{
    col, lit, CsvReadOptions, CsvWriter, DataFrame, IntoLazy, JoinArgs, JoinType, SerReader,
    SerWriter,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Merge per-station summary tables", long_about = None)]
struct Cli {
    /// Folder containing per-batch subfolders with out1/ and out2/ tables
    #[arg(short, long, default_value = "out")]
    root: PathBuf,

    /// Name of the merged CSV to write (".csv" is appended)
    #[arg(short, long)]
    output: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut merged: Vec<DataFrame> = Vec::new();
    for batch in subdirectories(&cli.root)? {
        info!(batch = %batch.display(), "scanning batch folder");
        let out1 = batch.join("out1");
        if !out1.is_dir() {
            continue;
        }
        for table in station_tables(&out1)? {
            let station = match table.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            };
            let second = batch.join("out2").join(format!("{station}.csv"));
            if !second.is_file() {
                warn!(%station, "no matching out2 table, skipping station");
                continue;
            }
            merged.push(merge_station(&table, &second, &station)?);
        }
    }

    if merged.is_empty() {
        bail!("no station tables found under {}", cli.root.display());
    }

    let mut iter = merged.into_iter();
    let mut combined = iter
        .next()
        .context("station table list cannot be empty")?;
    for frame in iter {
        combined.vstack_mut(&frame)?;
    }

    let path = PathBuf::from(format!("{}.csv", cli.output));
    let mut file = File::create(&path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut combined)?;

    info!(rows = combined.height(), path = %path.display(), "wrote merged table");
    Ok(())
}

fn merge_station(first: &Path, second: &Path, station: &str) -> Result<DataFrame> {
    let data1 = read_table(first)?
        .lazy()
        .filter(col("solar_flux_band_1").neq(lit(-1)))
        .collect()?;
    let data2 = read_table(second)?;

    if data1.height() != data2.height() {
        warn!(%station, "out1 and out2 tables have different lengths");
    }

    let joined = data1
        .lazy()
        .join(
            data2.lazy(),
            [col("dayofyear"), col("hour"), col("minute")],
            [col("dayofyear"), col("hour"), col("minute")],
            JoinArgs::new(JoinType::Inner),
        )
        .with_column(lit(station).alias("site"))
        .collect()?;

    let mut order: Vec<String> = vec!["site".to_string()];
    for name in joined.get_column_names() {
        if name.as_str() != "site" {
            order.push(name.as_str().to_string());
        }
    }
    Ok(joined.select(order)?)
}

fn read_table(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .with_context(|| format!("failed to read {}", path.display()))
}

fn subdirectories(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn station_tables(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut tables = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("csv") {
            tables.push(path);
        }
    }
    tables.sort();
    Ok(tables)
}
