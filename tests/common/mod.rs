#![allow(dead_code)]

use std::collections::BTreeSet;
use std::fs;

use approx::assert_abs_diff_eq;
use camino::{Utf8Path, Utf8PathBuf};
use snxroster::reconcile::StationRecord;

pub const SCENARIO_ID: &str = "011888";

/// Path of a fixture under `tests/data`
pub fn data_path(name: &str) -> Utf8PathBuf {
    Utf8Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

pub fn known(codes: &[&str]) -> BTreeSet<String> {
    codes.iter().map(|code| code.to_string()).collect()
}

pub fn utf8_tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
    let tmp = tempfile::tempdir().unwrap();
    let dir = Utf8Path::from_path(tmp.path()).unwrap().to_path_buf();
    (tmp, dir)
}

/// Seed a CSV store directory with one scenario, optional station rows and roster links.
pub fn seed_store(dir: &Utf8Path, calculation_epoch: &str, stations: &[&str], links: &[&str]) {
    fs::write(
        dir.join("scenarios.csv"),
        format!("scenario_id,calculation_epoch\n{SCENARIO_ID},{calculation_epoch}\n"),
    )
    .unwrap();

    let mut station_rows =
        String::from("station_id,x,y,z,latitude,longitude,height,valid_from,epoch\n");
    for row in stations {
        station_rows.push_str(row);
        station_rows.push('\n');
    }
    fs::write(dir.join("stations.csv"), station_rows).unwrap();

    let mut link_rows = String::from("scenario_id,station_id\n");
    for station_id in links {
        link_rows.push_str(&format!("{SCENARIO_ID},{station_id}\n"));
    }
    fs::write(dir.join("scenario_stations.csv"), link_rows).unwrap();
}

pub fn assert_geodetic_close(
    record: &StationRecord,
    latitude: f64,
    longitude: f64,
    height: f64,
    angle_epsilon: f64,
    height_epsilon: f64,
) {
    assert_abs_diff_eq!(record.latitude, latitude, epsilon = angle_epsilon);
    assert_abs_diff_eq!(record.longitude, longitude, epsilon = angle_epsilon);
    assert_abs_diff_eq!(record.height, height, epsilon = height_epsilon);
}
