//! # Station coordinates
//!
//! Data carried from the SINEX reader to the reconciler:
//!
//! - [`StationCoordinate`] – one reference station, its ECEF position as estimated in the
//!   solution file and, once transformed, its WGS84 geodetic position.
//! - [`ParseResult`] – the stations of one solution file, keyed and ordered by station id.
//!
//! A [`ParseResult`] is filled by [`crate::sinex::SinexParser`] only; once handed out it
//! exposes read-only access, or is consumed whole by [`crate::geodesy::Transformer`].
use std::collections::{btree_map, BTreeMap};

use hifitime::Epoch;
use nalgebra::Vector3;

use crate::{
    constants::{Degree, Meter, StationId},
    sinex::Axis,
    time::days_before,
};

/// Axes of a station that were actually read from the estimate block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisSet {
    x: bool,
    y: bool,
    z: bool,
}

impl AxisSet {
    pub fn insert(&mut self, axis: Axis) {
        match axis {
            Axis::X => self.x = true,
            Axis::Y => self.y = true,
            Axis::Z => self.z = true,
        }
    }

    pub fn contains(&self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn is_full(&self) -> bool {
        self.x && self.y && self.z
    }
}

/// A reference station position.
///
/// `x`, `y`, `z` are ECEF meters as read from the solution file; `latitude`, `longitude`
/// and `height` stay at `0.0` until [`crate::geodesy::Transformer`] fills them.
#[derive(Debug, Clone, PartialEq)]
pub struct StationCoordinate {
    /// Lowercase 4-character code
    pub station_id: StationId,
    /// Reference epoch shared by all stations of the file
    pub epoch: Epoch,
    pub x: Meter,
    pub y: Meter,
    pub z: Meter,
    pub latitude: Degree,
    pub longitude: Degree,
    pub height: Meter,
    axes: AxisSet,
}

impl StationCoordinate {
    /// New station at `epoch`, all coordinates `0.0`, no axis read yet.
    pub fn new(station_id: StationId, epoch: Epoch) -> Self {
        StationCoordinate {
            station_id,
            epoch,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            latitude: 0.0,
            longitude: 0.0,
            height: 0.0,
            axes: AxisSet::default(),
        }
    }

    /// Set one ECEF component and remember that it was read.
    ///
    /// A second value for the same axis overwrites the first.
    pub fn set_axis(&mut self, axis: Axis, value: Meter) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
        self.axes.insert(axis);
    }

    pub fn axes(&self) -> AxisSet {
        self.axes
    }

    /// `true` when all three ECEF components were read
    pub fn is_complete(&self) -> bool {
        self.axes.is_full()
    }

    /// ECEF components not found in the estimate block, in `X`, `Y`, `Z` order
    pub fn missing_axes(&self) -> Vec<Axis> {
        [Axis::X, Axis::Y, Axis::Z]
            .into_iter()
            .filter(|axis| !self.axes.contains(*axis))
            .collect()
    }

    /// ECEF position as a vector, meters
    pub fn ecef(&self) -> Vector3<Meter> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Start of validity recorded by the station store: one day before [`Self::epoch`].
    pub fn valid_from(&self) -> Epoch {
        days_before(&self.epoch, 1)
    }
}

/// Stations parsed from one solution file, ordered by station id.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    epoch: Epoch,
    stations: BTreeMap<StationId, StationCoordinate>,
}

impl ParseResult {
    pub fn new(epoch: Epoch) -> Self {
        ParseResult {
            epoch,
            stations: BTreeMap::new(),
        }
    }

    /// Reference epoch given to the parser
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub(crate) fn entry(
        &mut self,
        station_id: StationId,
    ) -> btree_map::Entry<'_, StationId, StationCoordinate> {
        self.stations.entry(station_id)
    }

    pub(crate) fn from_stations(
        epoch: Epoch,
        stations: impl IntoIterator<Item = StationCoordinate>,
    ) -> Self {
        ParseResult {
            epoch,
            stations: stations
                .into_iter()
                .map(|station| (station.station_id.clone(), station))
                .collect(),
        }
    }

    pub fn get(&self, station_id: &str) -> Option<&StationCoordinate> {
        self.stations.get(station_id)
    }

    pub fn contains(&self, station_id: &str) -> bool {
        self.stations.contains_key(station_id)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Station ids in ascending order
    pub fn station_ids(&self) -> impl Iterator<Item = &StationId> {
        self.stations.keys()
    }

    /// Stations in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &StationCoordinate> {
        self.stations.values()
    }
}

impl IntoIterator for ParseResult {
    type Item = StationCoordinate;
    type IntoIter = btree_map::IntoValues<StationId, StationCoordinate>;

    fn into_iter(self) -> Self::IntoIter {
        self.stations.into_values()
    }
}

impl<'a> IntoIterator for &'a ParseResult {
    type Item = &'a StationCoordinate;
    type IntoIter = btree_map::Values<'a, StationId, StationCoordinate>;

    fn into_iter(self) -> Self::IntoIter {
        self.stations.values()
    }
}

#[cfg(test)]
mod station_test {
    use super::*;

    fn epoch() -> Epoch {
        Epoch::from_gregorian_utc_at_midnight(2024, 3, 13)
    }

    #[test]
    fn test_new_station_is_empty() {
        let station = StationCoordinate::new("brst".into(), epoch());
        assert_eq!(station.ecef(), Vector3::zeros());
        assert!(!station.is_complete());
        assert_eq!(station.missing_axes(), vec![Axis::X, Axis::Y, Axis::Z]);
    }

    #[test]
    fn test_set_axis() {
        let mut station = StationCoordinate::new("brst".into(), epoch());
        station.set_axis(Axis::Y, -2.0);
        station.set_axis(Axis::X, 1.0);
        assert_eq!(station.missing_axes(), vec![Axis::Z]);

        station.set_axis(Axis::Z, 3.0);
        station.set_axis(Axis::Z, 4.0);
        assert!(station.is_complete());
        assert_eq!(station.ecef(), Vector3::new(1.0, -2.0, 4.0));
    }

    #[test]
    fn test_valid_from() {
        let station = StationCoordinate::new("brst".into(), epoch());
        assert_eq!(
            station.valid_from(),
            Epoch::from_gregorian_utc_at_midnight(2024, 3, 12)
        );
    }

    #[test]
    fn test_parse_result_order() {
        let result = ParseResult::from_stations(
            epoch(),
            ["wtzr", "algo", "brst"]
                .into_iter()
                .map(|id| StationCoordinate::new(id.into(), epoch())),
        );
        let ids: Vec<&str> = result.station_ids().map(String::as_str).collect();
        assert_eq!(ids, ["algo", "brst", "wtzr"]);
        assert!(result.contains("brst"));
        assert_eq!(result.epoch(), epoch());

        let owned: Vec<StationId> = result.into_iter().map(|s| s.station_id).collect();
        assert_eq!(owned, ["algo", "brst", "wtzr"]);
    }
}
