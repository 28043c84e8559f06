//! # Update pipeline
//!
//! One roster refresh for one scenario:
//!
//! ```text
//! solution text ──► parse ──► transform ──► reconcile ──► RosterDiff ──► StationStore::apply
//! ```
//!
//! ## Epochs
//! -----------------
//! The solution used for a scenario is the one of the day before its calculation epoch
//! ([`file_epoch`]). Every parsed station gets that epoch, and the store records it as valid
//! from one day earlier still ([`crate::station::StationCoordinate::valid_from`]).
//!
//! ## Usage
//! -----------------
//! ```rust,no_run
//! use camino::Utf8Path;
//! use snxroster::{
//!     archive::prepare_solution,
//!     listing::read_listing_file,
//!     pipeline::{Pipeline, PipelineConfig},
//!     store::CsvStore,
//! };
//!
//! let known = read_listing_file(Utf8Path::new("stations.txt")).unwrap();
//! let pipeline = Pipeline::new(PipelineConfig::new(known));
//! let mut store = CsvStore::open(Utf8Path::new("store")).unwrap();
//! let reader = prepare_solution(Utf8Path::new("igs24P23053.snx.Z")).unwrap();
//! let report = pipeline.run("011888", reader, &mut store).unwrap();
//! println!("{report}");
//! ```
use std::collections::BTreeSet;
use std::fmt;
use std::io::BufRead;

use hifitime::Epoch;
use itertools::Itertools;
use tracing::info;

use crate::{
    archive::{prepare_solution, Fetch, SolutionReader},
    constants::{ScenarioId, StationId},
    geodesy::{Ellipsoid, Transformer},
    products::{solution_file_name, solution_url},
    reconcile::{reconcile, RosterDiff},
    sinex::{parse_solution_estimate, BlockPolicy},
    snxroster_errors::SnxRosterError,
    store::{Scenario, StationStore},
    time::{days_before, format_datetime},
};

/// Epoch of the solution file used for `scenario`: its calculation epoch minus one day.
pub fn file_epoch(scenario: &Scenario) -> Epoch {
    days_before(&scenario.calculation_epoch, 1)
}

/// Archive name of the solution for a file epoch, `igs{YY}P{WWWW}{D}.snx.Z`.
pub fn product_file_name(file_epoch: &Epoch) -> Result<String, SnxRosterError> {
    solution_file_name(file_epoch)
}

/// Explicit settings of a [`Pipeline`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Lowercase station codes to keep
    pub known_stations: BTreeSet<StationId>,
    pub ellipsoid: Ellipsoid,
    pub block_policy: BlockPolicy,
}

impl PipelineConfig {
    /// WGS84, first estimate block only
    pub fn new(known_stations: BTreeSet<StationId>) -> Self {
        PipelineConfig {
            known_stations,
            ellipsoid: Ellipsoid::WGS84,
            block_policy: BlockPolicy::default(),
        }
    }
}

/// Summary of an applied run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub scenario_id: ScenarioId,
    pub file_epoch: Epoch,
    pub inserted: usize,
    pub updated: usize,
    pub linked: usize,
    pub unlinked: Vec<StationId>,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scenario {} (solution of {}): {} inserted, {} updated, {} linked",
            self.scenario_id,
            format_datetime(&self.file_epoch),
            self.inserted,
            self.updated,
            self.linked
        )?;
        if !self.unlinked.is_empty() {
            write!(f, ", unlinked: {}", self.unlinked.iter().join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    transformer: Transformer,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let transformer = Transformer::new(config.ellipsoid);
        Pipeline {
            config,
            transformer,
        }
    }

    /// Read a scenario, failing with [`SnxRosterError::UnknownScenario`] when it is absent.
    pub fn scenario<S: StationStore + ?Sized>(
        &self,
        scenario_id: &str,
        store: &S,
    ) -> Result<Scenario, SnxRosterError> {
        store
            .scenario(scenario_id)?
            .ok_or_else(|| SnxRosterError::UnknownScenario(scenario_id.to_string()))
    }

    /// Fetch and open the solution file of a scenario.
    ///
    /// Arguments
    /// -----------------
    /// * `fetcher`: source of the archive files.
    /// * `base_url`: root of the weekly products tree.
    /// * `scenario`: the scenario whose [`file_epoch`] selects the product.
    pub fn retrieve<F: Fetch + ?Sized>(
        &self,
        fetcher: &F,
        base_url: &str,
        scenario: &Scenario,
    ) -> Result<SolutionReader, SnxRosterError> {
        let url = solution_url(base_url, &file_epoch(scenario))?;
        info!(scenario = %scenario.scenario_id, %url, "retrieving solution");
        let path = fetcher.fetch(&url)?;
        prepare_solution(&path)
    }

    /// Compute the mutations for `scenario_id` without applying them.
    ///
    /// Arguments
    /// -----------------
    /// * `scenario_id`: scenario to refresh.
    /// * `reader`: decompressed solution text.
    /// * `store`: source of the scenario, the known coordinates and the current roster.
    ///
    /// Return
    /// ----------
    /// * The [`RosterDiff`], or the first error among unknown scenario, malformed solution
    ///   and store read failure.
    pub fn plan<R: BufRead, S: StationStore + ?Sized>(
        &self,
        scenario_id: &str,
        reader: R,
        store: &S,
    ) -> Result<RosterDiff, SnxRosterError> {
        let scenario = self.scenario(scenario_id, store)?;
        self.plan_for(&scenario, reader, store)
    }

    fn plan_for<R: BufRead, S: StationStore + ?Sized>(
        &self,
        scenario: &Scenario,
        reader: R,
        store: &S,
    ) -> Result<RosterDiff, SnxRosterError> {
        let scenario_id = scenario.scenario_id.as_str();
        let epoch = file_epoch(scenario);
        info!(
            scenario = scenario_id,
            file_epoch = %format_datetime(&epoch),
            known_stations = self.config.known_stations.len(),
            "planning roster update"
        );

        let parsed = parse_solution_estimate(
            reader,
            &self.config.known_stations,
            epoch,
            self.config.block_policy,
        )?;
        info!(scenario = scenario_id, stations = parsed.len(), "solution parsed");

        let transformed = self.transformer.transform(parsed);
        let existing_coords = store.station_ids()?;
        let existing_roster = store.roster(scenario_id)?;

        reconcile(
            scenario_id,
            Some(scenario),
            &transformed,
            &existing_coords,
            &existing_roster,
        )
    }

    /// Plan, then apply the mutations to `store`.
    pub fn run<R: BufRead, S: StationStore + ?Sized>(
        &self,
        scenario_id: &str,
        reader: R,
        store: &mut S,
    ) -> Result<RunReport, SnxRosterError> {
        let scenario = self.scenario(scenario_id, store)?;
        let diff = self.plan_for(&scenario, reader, store)?;

        if diff.is_empty() {
            info!(scenario = scenario_id, "nothing to apply");
        } else {
            store.apply(&diff)?;
        }

        let (inserted, updated, linked) = diff.counts();
        let report = RunReport {
            scenario_id: diff.scenario_id,
            file_epoch: file_epoch(&scenario),
            inserted,
            updated,
            linked,
            unlinked: diff.unlinked,
        };
        info!(
            scenario = scenario_id,
            inserted,
            updated,
            linked,
            unlinked = %report.unlinked.iter().join(","),
            "roster update finished"
        );
        Ok(report)
    }
}
