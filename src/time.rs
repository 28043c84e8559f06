use hifitime::{Duration, Epoch};
use std::str::FromStr;

use crate::constants::{DAYS_PER_WEEK, GPS_EPOCH_DATE, SECONDS_PER_DAY, STORE_DATETIME_FORMAT};
use crate::snxroster_errors::SnxRosterError;

/// Shift an epoch back by a whole number of days
///
/// Argument
/// --------
/// * `epoch`: the reference epoch
/// * `days`: number of days to remove
///
/// Return
/// ------
/// * `epoch - days`
pub fn days_before(epoch: &Epoch, days: u32) -> Epoch {
    *epoch - Duration::from_days(days as f64)
}

/// UTC midnight of the calendar day holding `epoch`
pub fn midnight_utc(epoch: &Epoch) -> Epoch {
    let (year, month, day, ..) = epoch.to_gregorian_utc();
    Epoch::from_gregorian_utc_at_midnight(year, month, day)
}

/// Whole days elapsed between two UTC calendar dates.
///
/// Leap seconds make the raw difference slightly larger than a multiple of a day,
/// hence the floor.
fn whole_days_between(start: &Epoch, end: &Epoch) -> i64 {
    ((midnight_utc(end) - midnight_utc(start)).to_seconds() / SECONDS_PER_DAY).floor() as i64
}

/// GPS week number and day of week (Sunday = 0) of the calendar day holding `epoch`
///
/// Argument
/// --------
/// * `epoch`: any epoch on or after the GPS time origin (1980-01-06)
///
/// Return
/// ------
/// * `(week, day_of_week)`, or [`SnxRosterError::InvalidEpoch`] before the GPS origin
pub fn gps_week_day(epoch: &Epoch) -> Result<(u32, u8), SnxRosterError> {
    let (year, month, day) = GPS_EPOCH_DATE;
    let origin = Epoch::from_gregorian_utc_at_midnight(year, month, day);
    let days = whole_days_between(&origin, epoch);
    if days < 0 {
        return Err(SnxRosterError::InvalidEpoch(format!(
            "{} is before the GPS time origin",
            format_datetime(epoch)
        )));
    }
    Ok((
        (days / DAYS_PER_WEEK) as u32,
        (days % DAYS_PER_WEEK) as u8,
    ))
}

/// Day of year (1-based) of the calendar day holding `epoch`
pub fn day_of_year(epoch: &Epoch) -> u16 {
    let (year, ..) = epoch.to_gregorian_utc();
    let january_first = Epoch::from_gregorian_utc_at_midnight(year, 1, 1);
    (whole_days_between(&january_first, epoch) + 1) as u16
}

/// Day of year as the three digit string used in archive paths (`"007"`, `"074"`, `"365"`)
pub fn doy_str(epoch: &Epoch) -> String {
    format!("{:03}", day_of_year(epoch))
}

/// Two digit year (`2024` → `"24"`)
pub fn two_digit_year(epoch: &Epoch) -> String {
    let (year, ..) = epoch.to_gregorian_utc();
    format!("{:02}", year.rem_euclid(100))
}

/// Format an epoch as `YYYY-MM-DD HH:MM:SS` in UTC, the layout expected by the station store
pub fn format_datetime(epoch: &Epoch) -> String {
    let (year, month, day, hour, minute, second, _) = epoch.to_gregorian_utc();
    format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}")
}

/// Parse a store timestamp (`YYYY-MM-DD HH:MM:SS`, UTC).
///
/// Any other layout understood by [`Epoch::from_str`] (e.g. `2024-03-15T00:00:00 UTC`)
/// is accepted as a fallback.
pub fn parse_datetime(content: &str) -> Result<Epoch, SnxRosterError> {
    let content = content.trim();
    Epoch::from_format_str(content, STORE_DATETIME_FORMAT)
        .or_else(|_| Epoch::from_str(content))
        .map_err(|e| SnxRosterError::InvalidEpoch(format!("{content}: {e}")))
}
