use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use super::{Scenario, StationStore};
use crate::{
    constants::{ScenarioId, StationId},
    reconcile::{Mutation, RosterDiff, StationRecord},
    snxroster_errors::SnxRosterError,
};

/// In-memory station store.
///
/// A diff is applied to a working copy first; the store state is replaced only when every
/// mutation passed its checks:
///
/// * `Insert` requires the station to be absent, `Update` requires it to be present,
/// * `ClearRoster` and `LinkToRoster` require a known scenario,
/// * `LinkToRoster` requires the station to have a coordinate record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryStore {
    scenarios: BTreeMap<ScenarioId, Scenario>,
    stations: BTreeMap<StationId, StationRecord>,
    rosters: BTreeMap<ScenarioId, BTreeSet<StationId>>,
}

#[derive(Debug, Clone)]
struct Tables {
    stations: BTreeMap<StationId, StationRecord>,
    rosters: BTreeMap<ScenarioId, BTreeSet<StationId>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration of a scenario
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.insert_scenario(scenario);
        self
    }

    pub fn insert_scenario(&mut self, scenario: Scenario) {
        self.rosters.entry(scenario.scenario_id.clone()).or_default();
        self.scenarios.insert(scenario.scenario_id.clone(), scenario);
    }

    /// Load a coordinate record directly, bypassing mutation checks
    pub fn load_station(&mut self, record: StationRecord) {
        self.stations.insert(record.station_id.clone(), record);
    }

    /// Load a roster link directly, bypassing mutation checks
    pub fn load_link(&mut self, scenario_id: ScenarioId, station_id: StationId) {
        self.rosters.entry(scenario_id).or_default().insert(station_id);
    }

    pub fn station(&self, station_id: &str) -> Option<&StationRecord> {
        self.stations.get(station_id)
    }

    pub fn scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.values()
    }

    pub fn stations(&self) -> impl Iterator<Item = &StationRecord> {
        self.stations.values()
    }

    /// `(scenario_id, station_id)` pairs, ordered
    pub fn links(&self) -> impl Iterator<Item = (&ScenarioId, &StationId)> {
        self.rosters
            .iter()
            .flat_map(|(scenario_id, roster)| roster.iter().map(move |id| (scenario_id, id)))
    }

    fn check_scenario(&self, scenario_id: &str) -> Result<(), SnxRosterError> {
        if self.scenarios.contains_key(scenario_id) {
            Ok(())
        } else {
            Err(SnxRosterError::StoreConsistency(format!(
                "scenario {scenario_id} does not exist"
            )))
        }
    }

    fn apply_one(&self, tables: &mut Tables, mutation: &Mutation) -> Result<(), SnxRosterError> {
        match mutation {
            Mutation::Insert(record) => {
                if tables.stations.contains_key(&record.station_id) {
                    return Err(SnxRosterError::StoreConsistency(format!(
                        "insert of station {} which already exists",
                        record.station_id
                    )));
                }
                tables
                    .stations
                    .insert(record.station_id.clone(), record.clone());
            }
            Mutation::Update(record) => match tables.stations.get_mut(&record.station_id) {
                Some(existing) => *existing = record.clone(),
                None => {
                    return Err(SnxRosterError::StoreConsistency(format!(
                        "update of station {} which does not exist",
                        record.station_id
                    )))
                }
            },
            Mutation::ClearRoster { scenario_id } => {
                self.check_scenario(scenario_id)?;
                tables.rosters.insert(scenario_id.clone(), BTreeSet::new());
            }
            Mutation::LinkToRoster {
                scenario_id,
                station_id,
            } => {
                self.check_scenario(scenario_id)?;
                if !tables.stations.contains_key(station_id) {
                    return Err(SnxRosterError::StoreConsistency(format!(
                        "link of station {station_id} which has no coordinate record"
                    )));
                }
                tables
                    .rosters
                    .entry(scenario_id.clone())
                    .or_default()
                    .insert(station_id.clone());
            }
        }
        Ok(())
    }
}

impl StationStore for InMemoryStore {
    fn scenario(&self, scenario_id: &str) -> Result<Option<Scenario>, SnxRosterError> {
        Ok(self.scenarios.get(scenario_id).cloned())
    }

    fn station_ids(&self) -> Result<BTreeSet<StationId>, SnxRosterError> {
        Ok(self.stations.keys().cloned().collect())
    }

    fn roster(&self, scenario_id: &str) -> Result<BTreeSet<StationId>, SnxRosterError> {
        Ok(self.rosters.get(scenario_id).cloned().unwrap_or_default())
    }

    fn apply(&mut self, diff: &RosterDiff) -> Result<(), SnxRosterError> {
        let mut tables = Tables {
            stations: self.stations.clone(),
            rosters: self.rosters.clone(),
        };

        for mutation in &diff.mutations {
            debug!(operation = mutation.kind(), "applying mutation");
            self.apply_one(&mut tables, mutation)?;
        }

        self.stations = tables.stations;
        self.rosters = tables.rosters;

        let (inserted, updated, linked) = diff.counts();
        info!(
            scenario = %diff.scenario_id,
            inserted,
            updated,
            linked,
            "roster diff applied"
        );
        Ok(())
    }
}
