//! # Roster reconciliation
//!
//! Turns a transformed [`ParseResult`] into the ordered list of store mutations that brings a
//! scenario's station roster in line with the solution file.
//!
//! ## Mutation order
//! -----------------
//! ```text
//! Insert / Update   one per parsed station, ascending station id
//! ClearRoster       once
//! LinkToRoster      one per parsed station, ascending station id
//! ```
//!
//! Every coordinate write precedes the roster sequence, so a store applying the list in order
//! never links a station that has no coordinate record. The roster is replaced as a whole:
//! stations linked before the run but absent from the file lose their link (they are listed in
//! [`RosterDiff::unlinked`]), their coordinate records are left untouched.
use std::collections::BTreeSet;

use hifitime::Epoch;
use tracing::{debug, info};

use crate::{
    constants::{Degree, Meter, ScenarioId, StationId},
    snxroster_errors::SnxRosterError,
    station::{ParseResult, StationCoordinate},
    store::Scenario,
};

/// Coordinate record written by [`Mutation::Insert`] and [`Mutation::Update`].
#[derive(Debug, Clone, PartialEq)]
pub struct StationRecord {
    pub station_id: StationId,
    pub x: Meter,
    pub y: Meter,
    pub z: Meter,
    pub latitude: Degree,
    pub longitude: Degree,
    pub height: Meter,
    pub valid_from: Epoch,
    pub epoch: Epoch,
}

impl From<&StationCoordinate> for StationRecord {
    fn from(station: &StationCoordinate) -> Self {
        StationRecord {
            station_id: station.station_id.clone(),
            x: station.x,
            y: station.y,
            z: station.z,
            latitude: station.latitude,
            longitude: station.longitude,
            height: station.height,
            valid_from: station.valid_from(),
            epoch: station.epoch,
        }
    }
}

/// One store operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Create the coordinate record of a station unknown to the store
    Insert(StationRecord),
    /// Overwrite the coordinate record of a known station
    Update(StationRecord),
    /// Remove every station from the scenario roster
    ClearRoster { scenario_id: ScenarioId },
    /// Add a station to the scenario roster
    LinkToRoster {
        scenario_id: ScenarioId,
        station_id: StationId,
    },
}

impl Mutation {
    /// Short operation name, as written in plan exports
    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::Insert(_) => "insert",
            Mutation::Update(_) => "update",
            Mutation::ClearRoster { .. } => "clear_roster",
            Mutation::LinkToRoster { .. } => "link",
        }
    }
}

/// Outcome of a reconciliation, applied by a [`crate::store::StationStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct RosterDiff {
    pub scenario_id: ScenarioId,
    pub mutations: Vec<Mutation>,
    /// Stations linked before the run that the roster replacement drops
    pub unlinked: Vec<StationId>,
}

impl RosterDiff {
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Number of `(Insert, Update, LinkToRoster)` mutations
    pub fn counts(&self) -> (usize, usize, usize) {
        self.mutations
            .iter()
            .fold((0, 0, 0), |(ins, upd, lnk), mutation| match mutation {
                Mutation::Insert(_) => (ins + 1, upd, lnk),
                Mutation::Update(_) => (ins, upd + 1, lnk),
                Mutation::LinkToRoster { .. } => (ins, upd, lnk + 1),
                Mutation::ClearRoster { .. } => (ins, upd, lnk),
            })
    }
}

/// Compute the mutations for one scenario.
///
/// Arguments
/// -----------------
/// * `scenario_id`: scenario to reconcile.
/// * `scenario`: the scenario as read from the store, `None` when the store does not know it.
/// * `parsed`: transformed stations of the solution file.
/// * `existing_coords`: station ids that already have a coordinate record.
/// * `existing_roster`: station ids currently linked to the scenario.
///
/// Return
/// ----------
/// * The complete [`RosterDiff`], or [`SnxRosterError::UnknownScenario`] when `scenario` is
///   `None`. An empty `parsed` gives an empty mutation list and leaves the roster alone.
pub fn reconcile(
    scenario_id: &str,
    scenario: Option<&Scenario>,
    parsed: &ParseResult,
    existing_coords: &BTreeSet<StationId>,
    existing_roster: &BTreeSet<StationId>,
) -> Result<RosterDiff, SnxRosterError> {
    if scenario.is_none() {
        return Err(SnxRosterError::UnknownScenario(scenario_id.to_string()));
    }

    if parsed.is_empty() {
        info!(scenario = scenario_id, "no station parsed, roster left unchanged");
        return Ok(RosterDiff {
            scenario_id: scenario_id.to_string(),
            mutations: Vec::new(),
            unlinked: Vec::new(),
        });
    }

    let mut mutations = Vec::with_capacity(2 * parsed.len() + 1);

    for station in parsed {
        let record = StationRecord::from(station);
        if existing_coords.contains(&station.station_id) {
            mutations.push(Mutation::Update(record));
        } else {
            mutations.push(Mutation::Insert(record));
        }
    }

    mutations.push(Mutation::ClearRoster {
        scenario_id: scenario_id.to_string(),
    });
    mutations.extend(parsed.station_ids().map(|station_id| Mutation::LinkToRoster {
        scenario_id: scenario_id.to_string(),
        station_id: station_id.clone(),
    }));

    let unlinked: Vec<StationId> = existing_roster
        .iter()
        .filter(|station_id| !parsed.contains(station_id))
        .cloned()
        .collect();
    if !unlinked.is_empty() {
        debug!(scenario = scenario_id, unlinked = ?unlinked, "stations leaving the roster");
    }

    Ok(RosterDiff {
        scenario_id: scenario_id.to_string(),
        mutations,
        unlinked,
    })
}

#[cfg(test)]
mod reconcile_test {
    use super::*;
    use crate::sinex::Axis;

    fn scenario() -> Scenario {
        Scenario {
            scenario_id: "011888".into(),
            calculation_epoch: Epoch::from_gregorian_utc_at_midnight(2024, 3, 15),
        }
    }

    fn parsed(ids: &[&str]) -> ParseResult {
        let epoch = Epoch::from_gregorian_utc_at_midnight(2024, 3, 14);
        ParseResult::from_stations(
            epoch,
            ids.iter().map(|id| {
                let mut station = StationCoordinate::new(id.to_string(), epoch);
                station.set_axis(Axis::X, 1.0);
                station.set_axis(Axis::Y, 2.0);
                station.set_axis(Axis::Z, 3.0);
                station
            }),
        )
    }

    fn ids(ids: &[&str]) -> BTreeSet<StationId> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_insert_update_and_relink() {
        let scenario = scenario();
        let diff = reconcile(
            "011888",
            Some(&scenario),
            &parsed(&["b", "a"]),
            &ids(&["a"]),
            &ids(&["a", "c"]),
        )
        .unwrap();

        let kinds: Vec<(&str, Option<&str>)> = diff
            .mutations
            .iter()
            .map(|m| match m {
                Mutation::Insert(r) | Mutation::Update(r) => (m.kind(), Some(r.station_id.as_str())),
                Mutation::LinkToRoster { station_id, .. } => (m.kind(), Some(station_id.as_str())),
                Mutation::ClearRoster { .. } => (m.kind(), None),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("update", Some("a")),
                ("insert", Some("b")),
                ("clear_roster", None),
                ("link", Some("a")),
                ("link", Some("b")),
            ]
        );
        assert_eq!(diff.unlinked, vec!["c".to_string()]);
        assert_eq!(diff.counts(), (1, 1, 2));
    }

    #[test]
    fn test_record_fields() {
        let scenario = scenario();
        let diff = reconcile(
            "011888",
            Some(&scenario),
            &parsed(&["brst"]),
            &BTreeSet::new(),
            &BTreeSet::new(),
        )
        .unwrap();

        let Mutation::Insert(record) = &diff.mutations[0] else {
            panic!("expected an insert, got {:?}", diff.mutations[0]);
        };
        assert_eq!(record.station_id, "brst");
        assert_eq!((record.x, record.y, record.z), (1.0, 2.0, 3.0));
        assert_eq!(record.epoch, Epoch::from_gregorian_utc_at_midnight(2024, 3, 14));
        assert_eq!(
            record.valid_from,
            Epoch::from_gregorian_utc_at_midnight(2024, 3, 13)
        );
    }

    #[test]
    fn test_unknown_scenario() {
        let result = reconcile(
            "999999",
            None,
            &parsed(&["a"]),
            &BTreeSet::new(),
            &BTreeSet::new(),
        );
        assert_eq!(
            result,
            Err(SnxRosterError::UnknownScenario("999999".into()))
        );
    }

    #[test]
    fn test_empty_parse_is_a_no_op() {
        let scenario = scenario();
        let diff = reconcile(
            "011888",
            Some(&scenario),
            &parsed(&[]),
            &ids(&["a"]),
            &ids(&["a"]),
        )
        .unwrap();
        assert!(diff.is_empty());
        assert!(diff.unlinked.is_empty());
    }

    #[test]
    fn test_writes_precede_roster_sequence() {
        let scenario = scenario();
        let diff = reconcile(
            "011888",
            Some(&scenario),
            &parsed(&["d", "c", "b", "a"]),
            &ids(&["b", "d"]),
            &BTreeSet::new(),
        )
        .unwrap();

        let clear = diff
            .mutations
            .iter()
            .position(|m| matches!(m, Mutation::ClearRoster { .. }))
            .unwrap();
        assert_eq!(clear, 4);
        assert!(diff.mutations[..clear]
            .iter()
            .all(|m| matches!(m, Mutation::Insert(_) | Mutation::Update(_))));
        assert!(diff.mutations[clear + 1..]
            .iter()
            .all(|m| matches!(m, Mutation::LinkToRoster { .. })));
    }
}
