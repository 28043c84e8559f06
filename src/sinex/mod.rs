//! # SINEX solution reader
//!
//! Extraction of refined station positions from the `SOLUTION/ESTIMATE` block of a SINEX
//! solution file (IGS weekly `igsYYPWWWWD.snx` products).
//!
//! ## Overview
//! -----------------
//! The reader is a three state scanner driven line by line:
//!
//! ```text
//!              +SOLUTION/ESTIMATE                 -SOLUTION/ESTIMATE
//!  Scanning ───────────────────────► InEstimateBlock ─────────────────► Scanning | stop
//!     ▲  any other line: skipped          │ station record: fold into ParseResult
//!     └───────────────────────────────────┘ other line: skipped
//! ```
//!
//! With [`BlockPolicy::FirstBlockOnly`] (the default) the scan stops at the first closing
//! marker; with [`BlockPolicy::AllBlocks`] later blocks are read as well and folded into the
//! same result.
//!
//! Records are matched by [`estimate::match_estimate_line`]. A record is kept only when its
//! lowercased station code belongs to the caller's allow-list, and only kept records have
//! their estimate decoded; the first accepted record of a
//! station creates a [`StationCoordinate`] at the supplied epoch with all axes at `0.0`, later
//! records only set the axis they name.
//!
//! ## Errors
//! -----------------
//! * A read failure of the underlying reader → [`ParseEstimateError::Read`].
//! * A malformed estimate on a station record → [`ParseEstimateError::InvalidValue`].
//!
//! Both are fatal for the run. A file without estimate block, or without any allowed
//! station, is a valid empty [`ParseResult`].
pub mod estimate;

use std::collections::BTreeSet;
use std::io::BufRead;

use hifitime::Epoch;
use tracing::{debug, trace};

use crate::{
    constants::{StationId, ESTIMATE_BLOCK_END, ESTIMATE_BLOCK_START},
    station::{ParseResult, StationCoordinate},
};

pub use estimate::{match_estimate_line, Axis, EstimateFields, EstimateRecord, ParseEstimateError};

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Outside of any estimate block (initial state)
    Scanning,
    /// Between `+SOLUTION/ESTIMATE` and `-SOLUTION/ESTIMATE`
    InEstimateBlock,
}

/// What to do once an estimate block has been closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockPolicy {
    /// Stop reading at the first `-SOLUTION/ESTIMATE`
    #[default]
    FirstBlockOnly,
    /// Keep scanning and merge every estimate block of the file
    AllBlocks,
}

/// Incremental SINEX estimate reader.
///
/// The parser borrows the allow-list and owns the [`ParseResult`] under construction;
/// [`SinexParser::finish`] hands the result over and consumes the parser.
#[derive(Debug)]
pub struct SinexParser<'a> {
    known_stations: &'a BTreeSet<StationId>,
    epoch: Epoch,
    policy: BlockPolicy,
    state: ParseState,
    done: bool,
    line_number: usize,
    blocks_read: usize,
    result: ParseResult,
}

impl<'a> SinexParser<'a> {
    /// Create a parser.
    ///
    /// Arguments
    /// -----------------
    /// * `known_stations`: lowercase station codes to keep.
    /// * `epoch`: reference epoch assigned to every station of this file.
    /// * `policy`: behaviour after the first closing marker.
    pub fn new(known_stations: &'a BTreeSet<StationId>, epoch: Epoch, policy: BlockPolicy) -> Self {
        SinexParser {
            known_stations,
            epoch,
            policy,
            state: ParseState::Scanning,
            done: false,
            line_number: 0,
            blocks_read: 0,
            result: ParseResult::new(epoch),
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// `true` once the scan has reached a terminal closing marker
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one line to the scanner.
    ///
    /// Lines given after the scanner is done are ignored.
    pub fn feed_line(&mut self, line: &str) -> Result<(), ParseEstimateError> {
        if self.done {
            return Ok(());
        }
        self.line_number += 1;

        match self.state {
            ParseState::Scanning => {
                if line.starts_with(ESTIMATE_BLOCK_START) {
                    debug!(line = self.line_number, "entering solution estimate block");
                    self.state = ParseState::InEstimateBlock;
                }
            }
            ParseState::InEstimateBlock => {
                if line.starts_with(ESTIMATE_BLOCK_END) {
                    self.blocks_read += 1;
                    self.state = ParseState::Scanning;
                    debug!(
                        line = self.line_number,
                        stations = self.result.len(),
                        "leaving solution estimate block"
                    );
                    if self.policy == BlockPolicy::FirstBlockOnly {
                        self.done = true;
                    }
                    return Ok(());
                }

                if let Some(fields) = match_estimate_line(line) {
                    let station_id = fields.station_id();
                    if !self.known_stations.contains(&station_id) {
                        trace!(station = %station_id, "station not in allow-list");
                        return Ok(());
                    }
                    let record = fields.decode(self.line_number)?;
                    self.accept(record);
                }
            }
        }
        Ok(())
    }

    fn accept(&mut self, record: EstimateRecord) {
        if record.axis_letter != 'X' && record.axis_letter != 'Y' && record.axis_letter != 'Z' {
            debug!(
                station = %record.station_id,
                letter = %record.axis_letter,
                fallback = %Axis::FALLBACK,
                "unexpected axis letter mapped to the fallback axis"
            );
        }

        let epoch = self.epoch;
        self.result
            .entry(record.station_id)
            .or_insert_with_key(|station_id| StationCoordinate::new(station_id.clone(), epoch))
            .set_axis(record.axis, record.value);
    }

    /// Number of estimate blocks closed so far
    pub fn blocks_read(&self) -> usize {
        self.blocks_read
    }

    /// Terminate the scan and return the collected stations.
    pub fn finish(self) -> ParseResult {
        debug!(
            lines = self.line_number,
            blocks = self.blocks_read,
            stations = self.result.len(),
            "solution estimate scan finished"
        );
        self.result
    }
}

/// Read a whole SINEX solution and extract the allowed station coordinates.
///
/// Arguments
/// -----------------
/// * `reader`: buffered source of the solution text (already decompressed).
/// * `known_stations`: lowercase allow-list of station codes.
/// * `epoch`: reference epoch assigned uniformly to every parsed station.
/// * `policy`: see [`BlockPolicy`].
///
/// Return
/// ----------
/// * The [`ParseResult`], possibly empty, or a [`ParseEstimateError`] on a read fault or a
///   malformed estimate.
///
/// See also
/// ------------
/// * [`SinexParser`] – the underlying line-by-line state machine.
/// * [`EstimateFields::decode`] – the record decoder.
pub fn parse_solution_estimate<R: BufRead>(
    mut reader: R,
    known_stations: &BTreeSet<StationId>,
    epoch: Epoch,
    policy: BlockPolicy,
) -> Result<ParseResult, ParseEstimateError> {
    let mut parser = SinexParser::new(known_stations, epoch, policy);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| ParseEstimateError::Read {
                line: parser.line_number,
                reason: e.to_string(),
            })?;
        if read == 0 {
            break;
        }

        // site descriptions are not always UTF-8
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        parser.feed_line(line)?;
        if parser.is_done() {
            break;
        }
    }

    Ok(parser.finish())
}
