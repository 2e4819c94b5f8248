use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::{CsvReadOptions, DataFrame, SerReader};
use snowline_core::aggregate::aggregate;
use snowline_core::assemble::assemble_scene;
use snowline_core::checkpoint::write_checkpoint;
use snowline_core::columns::FIXED_COLUMNS;
use snowline_core::error::PipelineError;
use snowline_core::types::Scene;
use snowline_snap::ExtractionSet;

fn scene(platform: char, stamp: &str) -> Scene {
    let name = format!(
        "S3{platform}_OL_1_EFR____{stamp}_20200723T100300_20200723T120000_0179_060_179_1440_LN1_O_NR_002.SEN3"
    );
    Scene::from_path(PathBuf::from("/data").join(name)).expect("scene parse failed")
}

fn read_output(path: &Path) -> DataFrame {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .expect("reader setup failed")
        .finish()
        .expect("output read failed")
}

fn checkpoint_scene(dir: &Path, scene: &Scene, primary: ExtractionSet, auxiliary: ExtractionSet) {
    let mut df = assemble_scene(scene, &primary, &auxiliary).expect("assembly failed");
    write_checkpoint(dir, &scene.name, &mut df).expect("checkpoint write failed");
}

#[test]
fn round_trips_values_and_fills_missing_cells_with_sentinel() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let scene_a = scene('A', "20200723T100000");

    let mut primary = ExtractionSet::default();
    primary.insert("S1", "ndsi", 0.8125);
    checkpoint_scene(dir.path(), &scene_a, primary, ExtractionSet::default());

    let path = aggregate(dir.path(), "20200723", false).expect("aggregation failed");
    let df = read_output(&path);

    assert_eq!(df.height(), 1);
    let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
    assert_eq!(names, FIXED_COLUMNS);

    let ndsi = df.column("ndsi").unwrap().f64().unwrap();
    assert_eq!(ndsi.get(0), Some(0.8125));

    let humidity = df.column("humidity").unwrap().f64().unwrap();
    assert_eq!(humidity.get(0), Some(-999.0));
}

#[test]
fn sorts_rows_by_composite_timestamp_across_checkpoints() {
    let dir = tempfile::tempdir().expect("tempdir failed");

    let later = scene('A', "20200723T100000");
    let mut primary = ExtractionSet::default();
    primary.insert("S1", "ndsi", 0.8);
    checkpoint_scene(dir.path(), &later, primary, ExtractionSet::default());

    let earlier = scene('B', "20200723T090000");
    let mut primary = ExtractionSet::default();
    primary.insert("S1", "ndsi", 0.6);
    let mut auxiliary = ExtractionSet::default();
    auxiliary.insert("S1", "humidity", 55.0);
    checkpoint_scene(dir.path(), &earlier, primary, auxiliary);

    let path = aggregate(dir.path(), "20200723", false).expect("aggregation failed");
    let df = read_output(&path);

    assert_eq!(df.height(), 2);
    let hour = df.column("hour").unwrap().i64().unwrap();
    assert_eq!(hour.get(0), Some(9));
    assert_eq!(hour.get(1), Some(10));

    let ndsi = df.column("ndsi").unwrap().f64().unwrap();
    assert_eq!(ndsi.get(0), Some(0.6));
    assert_eq!(ndsi.get(1), Some(0.8));

    let humidity = df.column("humidity").unwrap().f64().unwrap();
    assert_eq!(humidity.get(0), Some(55.0));
    assert_eq!(humidity.get(1), Some(-999.0));
}

#[test]
fn aggregation_is_deterministic_over_identical_checkpoints() {
    let dir_a = tempfile::tempdir().expect("tempdir failed");
    let dir_b = tempfile::tempdir().expect("tempdir failed");

    for dir in [dir_a.path(), dir_b.path()] {
        let scene_a = scene('A', "20200723T100000");
        let mut primary = ExtractionSet::default();
        primary.insert("S1", "ndsi", 0.8);
        primary.insert("S2", "ndsi", 0.7);
        checkpoint_scene(dir, &scene_a, primary, ExtractionSet::default());

        let scene_b = scene('B', "20200723T090000");
        let mut primary = ExtractionSet::default();
        primary.insert("S1", "ndsi", 0.6);
        checkpoint_scene(dir, &scene_b, primary, ExtractionSet::default());
    }

    let out_a = aggregate(dir_a.path(), "20200723", false).expect("aggregation failed");
    let out_b = aggregate(dir_b.path(), "20200723", false).expect("aggregation failed");

    let bytes_a = fs::read(&out_a).expect("read failed");
    let bytes_b = fs::read(&out_b).expect("read failed");
    assert_eq!(bytes_a, bytes_b);
}

#[test]
fn reflectance_groups_sort_naturally_after_the_fixed_prefix() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let scene_a = scene('A', "20200723T100000");

    let mut primary = ExtractionSet::default();
    primary.insert("S1", "reflectance_10", 0.1);
    primary.insert("S1", "reflectance_2", 0.2);
    primary.insert("S1", "reflectance_1", 0.3);
    primary.insert("S1", "BRR_11", 0.4);
    primary.insert("S1", "BRR_2", 0.5);
    checkpoint_scene(dir.path(), &scene_a, primary, ExtractionSet::default());

    let path = aggregate(dir.path(), "20200723", false).expect("aggregation failed");
    let df = read_output(&path);

    let tail: Vec<&str> = df
        .get_column_names()
        .iter()
        .skip(FIXED_COLUMNS.len())
        .map(|n| n.as_str())
        .collect();
    assert_eq!(
        tail,
        vec![
            "reflectance_1",
            "reflectance_2",
            "reflectance_10",
            "BRR_2",
            "BRR_11",
        ]
    );
}

#[test]
fn unknown_checkpoint_columns_abort_aggregation() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let header = "station,year,month,day,hour,minute,second,dayofyear,platform,mystery_product";
    let row = "S1,2020,7,23,10,0,0,205,0,1.25";
    fs::write(
        dir.path().join("S3A_scene_tmp.csv"),
        format!("{header}\n{row}\n"),
    )
    .expect("write failed");

    let err = aggregate(dir.path(), "20200723", false).expect_err("expected schema mismatch");
    assert!(matches!(err, PipelineError::SchemaMismatch(_)));
}

#[test]
fn elevation_columns_require_the_dem_switch() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let scene_a = scene('A', "20200723T100000");

    let mut primary = ExtractionSet::default();
    primary.insert("S1", "ndsi", 0.8);
    primary.insert("S1", "altitude", 1840.0);
    checkpoint_scene(dir.path(), &scene_a, primary, ExtractionSet::default());

    let err = aggregate(dir.path(), "20200723", false).expect_err("expected schema mismatch");
    assert!(matches!(err, PipelineError::SchemaMismatch(_)));

    let path = aggregate(dir.path(), "20200723", true).expect("aggregation failed");
    let df = read_output(&path);
    let altitude = df.column("altitude").unwrap().f64().unwrap();
    assert_eq!(altitude.get(0), Some(1840.0));

    let slope = df.column("slope").unwrap().f64().unwrap();
    assert_eq!(slope.get(0), Some(-999.0));
}
