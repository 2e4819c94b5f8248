use std::fs;

use crate::gpt::{parse_measurements, write_coordinates};
use crate::model::{ExtractionSet, Site, SiteValues};

const MEASUREMENTS: &str = "\
# BEAM pixel extraction export table
#
# Window size: 1
ProdID\tCoordID\tName\tLatitude\tLongitude\tPixelX\tPixelY\tDate(yyyy-MM-dd)\tTime(HH_mm_ss)\tndsi\tsnow_specific_area\treflectance_1
0\t0\tKAN_U\t67.0003\t-47.0249\t120.5\t88.5\t2020-07-23\t10_00_00\t0.81\t22.4\t0.95
0\t1\tQAS_L\t61.0308\t-46.8493\t410.5\t301.5\t2020-07-23\t10_00_00\t0.63\tNaN\t0.88
";

#[test]
fn parses_measurement_export() {
    let set = parse_measurements(MEASUREMENTS).expect("measurement parse failed");

    let sites: Vec<&str> = set.sites().collect();
    assert_eq!(sites, vec!["KAN_U", "QAS_L"]);

    let kan = set.site("KAN_U").expect("missing KAN_U");
    assert_eq!(kan.get("ndsi"), Some(0.81));
    assert_eq!(kan.get("snow_specific_area"), Some(22.4));
    assert_eq!(kan.get("reflectance_1"), Some(0.95));

    let qas = set.site("QAS_L").expect("missing QAS_L");
    assert_eq!(qas.get("ndsi"), Some(0.63));
    assert_eq!(qas.get("snow_specific_area"), None);
}

#[test]
fn no_data_cells_leave_bands_absent() {
    let content = "\
# comment
ProdID\tCoordID\tName\tLatitude\tLongitude\tPixelX\tPixelY\tDate(yyyy-MM-dd)\tTime(HH_mm_ss)\tndsi\thumidity
0\t0\tS1\t67.0\t-47.0\t1.5\t1.5\t2020-07-23\t09_00_00\t-999\t55.0
";
    let set = parse_measurements(content).expect("parse failed");
    let s1 = set.site("S1").expect("missing S1");
    assert_eq!(s1.get("ndsi"), None);
    assert_eq!(s1.get("humidity"), Some(55.0));
}

#[test]
fn site_with_only_no_data_is_absent() {
    let content = "\
ProdID\tCoordID\tName\tLatitude\tLongitude\tPixelX\tPixelY\tDate(yyyy-MM-dd)\tTime(HH_mm_ss)\tndsi
0\t0\tS1\t67.0\t-47.0\t1.5\t1.5\t2020-07-23\t09_00_00\tNaN
";
    let set = parse_measurements(content).expect("parse failed");
    assert!(set.is_empty());
    assert!(set.site("S1").is_none());
}

#[test]
fn garbage_value_is_a_data_row_error() {
    let content = "\
ProdID\tCoordID\tName\tLatitude\tLongitude\tPixelX\tPixelY\tDate(yyyy-MM-dd)\tTime(HH_mm_ss)\tndsi
0\t0\tS1\t67.0\t-47.0\t1.5\t1.5\t2020-07-23\t09_00_00\tbogus
";
    let err = parse_measurements(content).expect_err("expected a parse error");
    assert!(err.to_string().contains("ndsi"));
}

#[test]
fn header_without_time_column_is_rejected() {
    let content = "ProdID\tName\tndsi\n0\tS1\t0.5\n";
    let err = parse_measurements(content).expect_err("expected a header error");
    assert!(err.to_string().contains("Time"));
}

#[test]
fn site_values_preserve_first_seen_band_order() {
    let mut values = SiteValues::default();
    values.insert("ndbi", 0.2);
    values.insert("ndsi", 0.8);
    values.insert("ndbi", 0.3);

    let bands: Vec<&str> = values.bands().collect();
    assert_eq!(bands, vec!["ndbi", "ndsi"]);
    assert_eq!(values.get("ndbi"), Some(0.3));
    assert_eq!(values.len(), 2);
}

#[test]
fn extraction_set_preserves_first_seen_site_order() {
    let mut set = ExtractionSet::default();
    set.insert("B", "ndsi", 0.1);
    set.insert("A", "ndsi", 0.2);
    set.insert("B", "ndbi", 0.3);

    let sites: Vec<&str> = set.sites().collect();
    assert_eq!(sites, vec!["B", "A"]);
    assert_eq!(set.len(), 2);
}

#[test]
fn writes_pixex_coordinate_list() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let path = dir.path().join("coordinates.txt");
    let sites = vec![
        Site::new("KAN_U", 67.0003, -47.0249),
        Site::new("QAS_L", 61.0308, -46.8493),
    ];

    write_coordinates(&path, &sites).expect("write failed");

    let content = fs::read_to_string(&path).expect("read failed");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "Name\tLatitude\tLongitude");
    assert_eq!(lines[1], "KAN_U\t67.0003\t-47.0249");
    assert_eq!(lines.len(), 3);
}
