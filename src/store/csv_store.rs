//! # CSV station store
//!
//! A directory holding three tables:
//!
//! | file                    | columns                                                              |
//! |-------------------------|----------------------------------------------------------------------|
//! | `scenarios.csv`         | `scenario_id, calculation_epoch`                                     |
//! | `stations.csv`          | `station_id, x, y, z, latitude, longitude, height, valid_from, epoch` |
//! | `scenario_stations.csv` | `scenario_id, station_id`                                            |
//!
//! Timestamps use the `YYYY-MM-DD HH:MM:SS` (UTC) layout. A missing file is read as an empty
//! table. After a diff has been accepted, all three tables are written to temporary files
//! and only then renamed over the previous ones.
use std::collections::BTreeSet;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{InMemoryStore, Scenario, StationStore};
use crate::{
    constants::{Degree, Meter, ScenarioId, StationId},
    reconcile::{RosterDiff, StationRecord},
    snxroster_errors::SnxRosterError,
    time::{format_datetime, parse_datetime},
};

const SCENARIOS_FILE: &str = "scenarios.csv";
const STATIONS_FILE: &str = "stations.csv";
const LINKS_FILE: &str = "scenario_stations.csv";

#[derive(Debug, Serialize, Deserialize)]
struct ScenarioRow {
    scenario_id: ScenarioId,
    calculation_epoch: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct StationRow {
    station_id: StationId,
    x: Meter,
    y: Meter,
    z: Meter,
    latitude: Degree,
    longitude: Degree,
    height: Meter,
    valid_from: String,
    epoch: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct LinkRow {
    scenario_id: ScenarioId,
    station_id: StationId,
}

impl TryFrom<StationRow> for StationRecord {
    type Error = SnxRosterError;

    fn try_from(row: StationRow) -> Result<Self, Self::Error> {
        Ok(StationRecord {
            station_id: row.station_id,
            x: row.x,
            y: row.y,
            z: row.z,
            latitude: row.latitude,
            longitude: row.longitude,
            height: row.height,
            valid_from: parse_datetime(&row.valid_from)?,
            epoch: parse_datetime(&row.epoch)?,
        })
    }
}

impl From<&StationRecord> for StationRow {
    fn from(record: &StationRecord) -> Self {
        StationRow {
            station_id: record.station_id.clone(),
            x: record.x,
            y: record.y,
            z: record.z,
            latitude: record.latitude,
            longitude: record.longitude,
            height: record.height,
            valid_from: format_datetime(&record.valid_from),
            epoch: format_datetime(&record.epoch),
        }
    }
}

/// Station store persisted as CSV files in one directory.
#[derive(Debug)]
pub struct CsvStore {
    dir: Utf8PathBuf,
    tables: InMemoryStore,
}

/// Read every row of a table, or nothing when the file does not exist.
fn read_rows<T: for<'de> Deserialize<'de>>(path: &Utf8Path) -> Result<Vec<T>, SnxRosterError> {
    if !path.exists() {
        debug!(%path, "table missing, read as empty");
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path)?;
    reader
        .deserialize::<T>()
        .map(|row| row.map_err(SnxRosterError::from))
        .collect()
}

/// Write a table next to its final location and return the temporary path.
fn write_rows<T: Serialize>(
    path: &Utf8Path,
    rows: impl IntoIterator<Item = T>,
) -> Result<Utf8PathBuf, SnxRosterError> {
    let tmp_path = path.with_extension("csv.tmp");
    let mut writer = csv::Writer::from_path(&tmp_path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(tmp_path)
}

/// Write the temporary files of the three tables, in the order of `targets`.
fn write_table_files(
    targets: &[Utf8PathBuf; 3],
    tables: &InMemoryStore,
) -> Result<[Utf8PathBuf; 3], SnxRosterError> {
    Ok([
        write_rows(
            &targets[0],
            tables.scenarios().map(|scenario| ScenarioRow {
                scenario_id: scenario.scenario_id.clone(),
                calculation_epoch: format_datetime(&scenario.calculation_epoch),
            }),
        )?,
        write_rows(&targets[1], tables.stations().map(StationRow::from))?,
        write_rows(
            &targets[2],
            tables.links().map(|(scenario_id, station_id)| LinkRow {
                scenario_id: scenario_id.clone(),
                station_id: station_id.clone(),
            }),
        )?,
    ])
}

/// Write the three tables of `tables` into `dir`.
///
/// Every temporary file is complete before the first rename, so a failed write leaves the
/// previous tables on disk untouched.
fn save_tables(dir: &Utf8Path, tables: &InMemoryStore) -> Result<(), SnxRosterError> {
    fs::create_dir_all(dir)?;

    let targets = [
        dir.join(SCENARIOS_FILE),
        dir.join(STATIONS_FILE),
        dir.join(LINKS_FILE),
    ];
    let tmp_paths = match write_table_files(&targets, tables) {
        Ok(tmp_paths) => tmp_paths,
        Err(e) => {
            for target in &targets {
                let _ = fs::remove_file(target.with_extension("csv.tmp"));
            }
            return Err(e);
        }
    };
    for (tmp_path, target) in tmp_paths.iter().zip(&targets) {
        fs::rename(tmp_path, target)?;
    }
    Ok(())
}

impl CsvStore {
    /// Load the store kept in `dir`. The directory is created on the first save.
    pub fn open(dir: &Utf8Path) -> Result<Self, SnxRosterError> {
        let mut tables = InMemoryStore::new();

        for row in read_rows::<ScenarioRow>(&dir.join(SCENARIOS_FILE))? {
            tables.insert_scenario(Scenario {
                scenario_id: row.scenario_id,
                calculation_epoch: parse_datetime(&row.calculation_epoch)?,
            });
        }
        for row in read_rows::<StationRow>(&dir.join(STATIONS_FILE))? {
            tables.load_station(row.try_into()?);
        }
        for row in read_rows::<LinkRow>(&dir.join(LINKS_FILE))? {
            tables.load_link(row.scenario_id, row.station_id);
        }

        info!(
            %dir,
            scenarios = tables.scenarios().count(),
            stations = tables.stations().count(),
            "csv store loaded"
        );
        Ok(CsvStore {
            dir: dir.to_path_buf(),
            tables,
        })
    }

    /// Current content of the store
    pub fn tables(&self) -> &InMemoryStore {
        &self.tables
    }

    /// Register a scenario; persisted by the next [`CsvStore::save`]
    pub fn insert_scenario(&mut self, scenario: Scenario) {
        self.tables.insert_scenario(scenario);
    }

    /// Write the three tables to the store directory.
    pub fn save(&self) -> Result<(), SnxRosterError> {
        save_tables(&self.dir, &self.tables)?;
        debug!(dir = %self.dir, "csv store saved");
        Ok(())
    }
}

impl StationStore for CsvStore {
    fn scenario(&self, scenario_id: &str) -> Result<Option<Scenario>, SnxRosterError> {
        self.tables.scenario(scenario_id)
    }

    fn station_ids(&self) -> Result<BTreeSet<StationId>, SnxRosterError> {
        self.tables.station_ids()
    }

    fn roster(&self, scenario_id: &str) -> Result<BTreeSet<StationId>, SnxRosterError> {
        self.tables.roster(scenario_id)
    }

    /// The new tables replace the loaded ones only once they are written to disk.
    fn apply(&mut self, diff: &RosterDiff) -> Result<(), SnxRosterError> {
        let mut tables = self.tables.clone();
        tables.apply(diff)?;
        save_tables(&self.dir, &tables)?;
        self.tables = tables;
        debug!(dir = %self.dir, "csv store saved");
        Ok(())
    }
}
