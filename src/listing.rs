//! # Station allow-list
//!
//! The stations worth keeping are those with daily observation files in the archive. A file
//! in the daily directory is named after its station (`brst0740.24o`, `WTZR00DEU_R_...`), so
//! the allow-list is the set of lowercased 4-character prefixes of the listing.
use std::collections::BTreeSet;
use std::fs;

use camino::Utf8Path;
use tracing::{debug, info};

use crate::{constants::StationId, snxroster_errors::SnxRosterError};

/// Build the allow-list from file names.
///
/// Entries whose first four characters are not all ASCII alphanumerics (`.`, `..`,
/// `README`-like short names, blank lines) are skipped.
pub fn known_stations_from_listing<I, S>(names: I) -> BTreeSet<StationId>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter_map(|name| {
            let name = name.as_ref().trim();
            let code = name.get(..4)?;
            if code.chars().all(|c| c.is_ascii_alphanumeric()) {
                Some(code.to_ascii_lowercase())
            } else {
                debug!(entry = name, "listing entry skipped");
                None
            }
        })
        .collect()
}

/// Read a saved directory listing, one file name per line.
pub fn read_listing_file(path: &Utf8Path) -> Result<BTreeSet<StationId>, SnxRosterError> {
    let content = fs::read_to_string(path)?;
    let stations = known_stations_from_listing(content.lines());
    info!(%path, stations = stations.len(), "station allow-list loaded");
    Ok(stations)
}
