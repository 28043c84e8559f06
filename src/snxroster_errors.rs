use thiserror::Error;

use crate::{constants::ScenarioId, sinex::ParseEstimateError};

#[derive(Error, Debug)]
pub enum SnxRosterError {
    #[error("Malformed solution file: {0}")]
    MalformedInput(#[from] ParseEstimateError),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(ScenarioId),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid configuration file: {0}")]
    ConfigError(#[from] toml::de::Error),

    #[error("Download of {url} failed after {attempts} attempt(s): {reason}")]
    DownloadFailed {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("Too many redirects while fetching: {0}")]
    TooManyRedirects(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unable to decompress {0}")]
    Decompression(String),

    #[error("Invalid epoch: {0}")]
    InvalidEpoch(String),

    #[error("UTF-8 Path error: {0}")]
    Utf8PathError(String),

    #[error("Store rejected the mutation set: {0}")]
    StoreConsistency(String),
}

impl PartialEq for SnxRosterError {
    fn eq(&self, other: &Self) -> bool {
        use SnxRosterError::*;
        match (self, other) {
            (MalformedInput(a), MalformedInput(b)) => a == b,
            (UnknownScenario(a), UnknownScenario(b)) => a == b,

            // foreign errors are not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,
            (ReqwestError(_), ReqwestError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (ConfigError(_), ConfigError(_)) => true,

            (
                DownloadFailed {
                    url: u1,
                    attempts: a1,
                    ..
                },
                DownloadFailed {
                    url: u2,
                    attempts: a2,
                    ..
                },
            ) => u1 == u2 && a1 == a2,
            (TooManyRedirects(a), TooManyRedirects(b)) => a == b,
            (InvalidUrl(a), InvalidUrl(b)) => a == b,
            (Decompression(a), Decompression(b)) => a == b,
            (InvalidEpoch(a), InvalidEpoch(b)) => a == b,
            (Utf8PathError(a), Utf8PathError(b)) => a == b,
            (StoreConsistency(a), StoreConsistency(b)) => a == b,

            _ => false,
        }
    }
}
