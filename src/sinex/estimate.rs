//! # SINEX station-coordinate estimate records
//!
//! Line-level parsing of the `SOLUTION/ESTIMATE` records that carry station
//! coordinates. A record looks like:
//!
//! ```text
//! *INDEX TYPE__ CODE PT SOLN _REF_EPOCH__ UNIT S __ESTIMATED VALUE____ _STD_DEV___
//!      1 STAX   BRST  A    1 24:073:43200 m    2  0.423116232414131E+07 0.1031E-02
//! ```
//!
//! Only three things are kept: the axis letter following `STA`, the 4-character
//! station code, and the estimated value. The standard deviation is matched but discarded.
//!
//! ## Numeric tokens
//! -----------------
//! Values are decimal scientific-notation strings: optional sign, a mantissa that may start
//! with the decimal point (`-.234E+07`), and an optional `E`/`e` exponent with optional sign.
//! The record pattern captures the value token loosely so that a damaged number on an
//! otherwise valid record surfaces as [`ParseEstimateError::InvalidValue`] instead of being
//! skipped.
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::constants::{Meter, StationId};

/// Station coordinate record: index, `STA<axis>`, code, point code, solution id,
/// reference epoch (`YY:DDD:SSSSS`, or `YYYY:DDD:SSSSS` in SINEX 3), unit, constraint,
/// estimate and standard deviation.
static ESTIMATE_RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s+\d+\s+STA(\S)\s+(\S{4})\s+\S+\s+\S+\s+\d{2,4}:\d{3}:\d{5}\s+\S+\s+\S+\s+(\S+)\s+\S+\s*$",
    )
    .unwrap()
});

/// Decimal number with optional scientific exponent.
static SCIENTIFIC_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").unwrap());

/// Line-level parsing errors of a SINEX solution file.
///
/// Variants
/// -----------------
/// * `InvalidValue` – The estimate token of a station record is not a decimal number.
/// * `Read` – The underlying reader failed before the line could be decoded.
#[derive(Error, Debug, PartialEq)]
pub enum ParseEstimateError {
    #[error("line {line}: invalid estimate `{token}` for station {station} axis {axis}")]
    InvalidValue {
        line: usize,
        station: StationId,
        axis: Axis,
        token: String,
    },
    #[error("read failure after line {line}: {reason}")]
    Read { line: usize, reason: String },
}

/// ECEF axis addressed by a `STA<axis>` parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Axis used for any letter other than `X` or `Y`.
    ///
    /// Solution files only carry `STAX`, `STAY` and `STAZ`; an unexpected character is
    /// mapped here rather than rejected.
    pub const FALLBACK: Axis = Axis::Z;

    /// Map the character following `STA` to an axis.
    pub fn from_letter(letter: char) -> Self {
        match letter {
            'X' => Axis::X,
            'Y' => Axis::Y,
            'Z' => Axis::Z,
            _ => Axis::FALLBACK,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "X"),
            Axis::Y => write!(f, "Y"),
            Axis::Z => write!(f, "Z"),
        }
    }
}

/// A decoded station coordinate record.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateRecord {
    /// Raw axis character following `STA`
    pub axis_letter: char,
    /// Axis after applying [`Axis::from_letter`]
    pub axis: Axis,
    /// Lowercased station code
    pub station_id: StationId,
    /// Estimated value, meters
    pub value: Meter,
}

/// Parse a decimal scientific-notation token.
///
/// Return
/// ----------
/// * `Some(value)` for tokens such as `0.423116232414131E+07`, `-.5e-3`, `+12`, `12.`;
///   `None` for anything else, including `inf` and `nan`.
pub fn parse_scientific(token: &str) -> Option<f64> {
    if !SCIENTIFIC_NUMBER.is_match(token) {
        return None;
    }
    token.parse::<f64>().ok()
}

/// Fields of a station coordinate record, borrowed from the line and not yet decoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimateFields<'l> {
    /// Raw axis character following `STA`
    pub axis_letter: char,
    /// Station code as written in the file
    pub code: &'l str,
    /// Estimate token, not yet validated
    pub token: &'l str,
}

impl EstimateFields<'_> {
    /// Lowercased station code
    pub fn station_id(&self) -> StationId {
        self.code.to_lowercase()
    }

    /// Decode the estimate token.
    ///
    /// Arguments
    /// -----------------
    /// * `line_number`: 1-based position of the line in the file, for diagnostics.
    ///
    /// Return
    /// ----------
    /// * The decoded [`EstimateRecord`] or [`ParseEstimateError::InvalidValue`].
    pub fn decode(&self, line_number: usize) -> Result<EstimateRecord, ParseEstimateError> {
        let axis = Axis::from_letter(self.axis_letter);
        let station_id = self.station_id();
        let value =
            parse_scientific(self.token).ok_or_else(|| ParseEstimateError::InvalidValue {
                line: line_number,
                station: station_id.clone(),
                axis,
                token: self.token.to_string(),
            })?;

        Ok(EstimateRecord {
            axis_letter: self.axis_letter,
            axis,
            station_id,
            value,
        })
    }
}

/// Match a line against the station coordinate record layout.
///
/// Return
/// ----------
/// * `None` when the line is not a station coordinate record (comments, velocities,
///   other parameter types, block markers).
pub fn match_estimate_line(line: &str) -> Option<EstimateFields<'_>> {
    let captures = ESTIMATE_RECORD.captures(line)?;
    Some(EstimateFields {
        axis_letter: captures.get(1)?.as_str().chars().next()?,
        code: captures.get(2)?.as_str(),
        token: captures.get(3)?.as_str(),
    })
}

#[cfg(test)]
mod estimate_test {
    use super::*;

    fn decode_line(
        line_number: usize,
        line: &str,
    ) -> Result<Option<EstimateRecord>, ParseEstimateError> {
        match_estimate_line(line)
            .map(|fields| fields.decode(line_number))
            .transpose()
    }

    const STAX_BRST: &str =
        "     1 STAX   BRST  A    1 24:073:43200 m    2  0.423116232414131E+07 0.1031E-02";

    #[test]
    fn test_parse_station_record() {
        let record = decode_line(10, STAX_BRST).unwrap().unwrap();
        assert_eq!(record.axis, Axis::X);
        assert_eq!(record.axis_letter, 'X');
        assert_eq!(record.station_id, "brst");
        assert_eq!(record.value, 0.423116232414131E+07);
    }

    #[test]
    fn test_parse_negative_leading_dot() {
        let line =
            "     2 STAY   BRST  A    1 24:073:43200 m    2 -.332746712340000e+06 .1100E-02";
        let record = decode_line(11, line).unwrap().unwrap();
        assert_eq!(record.axis, Axis::Y);
        assert_eq!(record.value, -332746.71234);
    }

    #[test]
    fn test_non_station_lines_are_skipped() {
        for line in [
            "*INDEX TYPE__ CODE PT SOLN _REF_EPOCH__ UNIT S __ESTIMATED VALUE____ _STD_DEV___",
            "     4 VELX   BRST  A    1 24:073:43200 m/y  2 -.123400000000000E-01 .2000E-04",
            " This is not a record",
            "",
        ] {
            assert_eq!(decode_line(1, line), Ok(None), "line: {line}");
        }
    }

    #[test]
    fn test_malformed_value() {
        let line =
            "     3 STAZ   BRST  A    1 24:073:43200 m    2  0.47451X1000000E+07 0.1031E-02";
        assert_eq!(
            decode_line(12, line),
            Err(ParseEstimateError::InvalidValue {
                line: 12,
                station: "brst".into(),
                axis: Axis::Z,
                token: "0.47451X1000000E+07".into(),
            })
        );
    }

    #[test]
    fn test_axis_fallback() {
        assert_eq!(Axis::from_letter('X'), Axis::X);
        assert_eq!(Axis::from_letter('Y'), Axis::Y);
        assert_eq!(Axis::from_letter('Z'), Axis::Z);
        assert_eq!(Axis::from_letter('W'), Axis::FALLBACK);
        assert_eq!(Axis::from_letter('x'), Axis::FALLBACK);

        let line =
            "     5 STAQ   BRST  A    1 24:073:43200 m    2  0.100000000000000E+01 0.1000E-02";
        let record = decode_line(1, line).unwrap().unwrap();
        assert_eq!(record.axis_letter, 'Q');
        assert_eq!(record.axis, Axis::Z);
    }

    #[test]
    fn test_parse_scientific() {
        assert_eq!(parse_scientific("0.5E+02"), Some(50.0));
        assert_eq!(parse_scientific("0.5e-02"), Some(0.005));
        assert_eq!(parse_scientific("-.25E1"), Some(-2.5));
        assert_eq!(parse_scientific("+3"), Some(3.0));
        assert_eq!(parse_scientific("12."), Some(12.0));
        assert_eq!(parse_scientific("inf"), None);
        assert_eq!(parse_scientific("NaN"), None);
        assert_eq!(parse_scientific("1.0D+03"), None);
        assert_eq!(parse_scientific("E+03"), None);
    }

    #[test]
    fn test_four_digit_year_reference_epoch() {
        let line =
            "     1 STAX   BRST  A    1 2024:073:43200 m    2  0.423116232414131E+07 0.1031E-02";
        let record = decode_line(1, line).unwrap().unwrap();
        assert_eq!(record.station_id, "brst");
        assert_eq!(record.value, 0.423116232414131E+07);
    }
}
