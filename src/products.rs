//! # IGS product naming
//!
//! Names and locations of the archive products used by an update run:
//!
//! * the weekly combined SINEX solution `igs{YY}P{WWWW}{D}.snx.Z`, stored under its GPS week,
//! * the daily observation directory `{YYYY}/{DDD}/{YY}o`, whose listing gives the station
//!   allow-list.
//!
//! All helpers take the file epoch (scenario calculation epoch minus one day).
use crate::{
    constants::DAILY_DATA_ROOT,
    snxroster_errors::SnxRosterError,
    time::{doy_str, gps_week_day, two_digit_year},
};

/// File name of the IGS SINEX solution for the day holding `epoch`.
///
/// Return
/// ----------
/// * `igs{YY}P{week}{day_of_week}.snx.Z`, e.g. `igs24P23054.snx.Z` for 2024-03-14, or
///   [`SnxRosterError::InvalidEpoch`] before the GPS time origin.
pub fn solution_file_name(epoch: &hifitime::Epoch) -> Result<String, SnxRosterError> {
    let (week, day) = gps_week_day(epoch)?;
    Ok(format!("igs{}P{week:04}{day}.snx.Z", two_digit_year(epoch)))
}

/// Full URL of the SINEX solution: `{base_url}/{week}/{file name}`.
pub fn solution_url(base_url: &str, epoch: &hifitime::Epoch) -> Result<String, SnxRosterError> {
    let (week, _) = gps_week_day(epoch)?;
    Ok(format!(
        "{}/{week:04}/{}",
        base_url.trim_end_matches('/'),
        solution_file_name(epoch)?
    ))
}

/// Daily observation directory listed to build the allow-list,
/// `LOCAL/FREE/CDIS/DATA/DAILY/{YYYY}/{DDD}/{YY}o`.
pub fn daily_observation_dir(epoch: &hifitime::Epoch) -> String {
    let (year, ..) = epoch.to_gregorian_utc();
    format!(
        "{DAILY_DATA_ROOT}/{year}/{}/{}o",
        doy_str(epoch),
        two_digit_year(epoch)
    )
}
