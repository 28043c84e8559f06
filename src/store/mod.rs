//! # Station store
//!
//! Persistence seam of the crate. The pipeline reads a scenario, the known station ids and
//! the current roster through [`StationStore`], and hands back a [`RosterDiff`] to apply.
//!
//! ## Implementations
//! -----------------
//! * [`InMemoryStore`] – maps in memory; validates a whole diff before applying any of it.
//! * [`CsvStore`] – a directory of three CSV tables loaded into an [`InMemoryStore`] and
//!   rewritten after each successful application.
//!
//! [`write_plan_csv`] exports a diff without applying it (dry runs).
pub mod csv_store;
pub mod memory;

use std::collections::BTreeSet;
use std::io::Write;

use hifitime::Epoch;
use serde::Serialize;

use crate::{
    constants::{ScenarioId, StationId},
    reconcile::{Mutation, RosterDiff},
    snxroster_errors::SnxRosterError,
    time::format_datetime,
};

pub use csv_store::CsvStore;
pub use memory::InMemoryStore;

/// An analysis scenario and the epoch its calculation refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub scenario_id: ScenarioId,
    pub calculation_epoch: Epoch,
}

/// Read and write access to station coordinates and scenario rosters.
pub trait StationStore {
    /// The scenario, or `None` when the store does not know it
    fn scenario(&self, scenario_id: &str) -> Result<Option<Scenario>, SnxRosterError>;

    /// Ids of every station with a coordinate record
    fn station_ids(&self) -> Result<BTreeSet<StationId>, SnxRosterError>;

    /// Ids of the stations linked to a scenario
    fn roster(&self, scenario_id: &str) -> Result<BTreeSet<StationId>, SnxRosterError>;

    /// Apply every mutation of `diff`, in order, or none of them.
    fn apply(&mut self, diff: &RosterDiff) -> Result<(), SnxRosterError>;
}

#[derive(Debug, Serialize)]
struct PlanRow<'a> {
    operation: &'static str,
    scenario_id: &'a str,
    station_id: Option<&'a str>,
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    height: Option<f64>,
    valid_from: Option<String>,
    epoch: Option<String>,
}

/// Write the mutation list of `diff` as CSV, one row per mutation, in application order.
///
/// Columns: `operation, scenario_id, station_id, x, y, z, latitude, longitude, height,
/// valid_from, epoch`. Fields that do not apply to an operation are left empty.
pub fn write_plan_csv<W: Write>(diff: &RosterDiff, writer: W) -> Result<(), SnxRosterError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for mutation in &diff.mutations {
        let row = match mutation {
            Mutation::Insert(record) | Mutation::Update(record) => PlanRow {
                operation: mutation.kind(),
                scenario_id: &diff.scenario_id,
                station_id: Some(&record.station_id),
                x: Some(record.x),
                y: Some(record.y),
                z: Some(record.z),
                latitude: Some(record.latitude),
                longitude: Some(record.longitude),
                height: Some(record.height),
                valid_from: Some(format_datetime(&record.valid_from)),
                epoch: Some(format_datetime(&record.epoch)),
            },
            Mutation::ClearRoster { scenario_id } => PlanRow {
                operation: mutation.kind(),
                scenario_id,
                station_id: None,
                x: None,
                y: None,
                z: None,
                latitude: None,
                longitude: None,
                height: None,
                valid_from: None,
                epoch: None,
            },
            Mutation::LinkToRoster {
                scenario_id,
                station_id,
            } => PlanRow {
                operation: mutation.kind(),
                scenario_id,
                station_id: Some(station_id),
                x: None,
                y: None,
                z: None,
                latitude: None,
                longitude: None,
                height: None,
                valid_from: None,
                epoch: None,
            },
        };
        csv_writer.serialize(row)?;
    }

    csv_writer.flush()?;
    Ok(())
}
