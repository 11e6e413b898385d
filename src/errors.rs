use std::io;

use thiserror::Error;

use crate::types::{BackendId, EndpointUrl, LocationLabel};

/// Error type for record-source reads and decoding.
///
/// These never escape `RecordLoader::load_records`; the loader logs them and
/// degrades to an empty record list, keeping the failure in its report.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source '{location}' was not found")]
    NotFound { location: LocationLabel },
    #[error("backend '{backend}' has no storage credential configured")]
    MissingCredential { backend: BackendId },
    #[error("no registered backend can read '{location}'")]
    NoBackend { location: LocationLabel },
    #[error("source '{location}' is unavailable: {reason}")]
    Unavailable {
        location: LocationLabel,
        reason: String,
    },
    #[error("source '{location}' could not be decoded: {reason}")]
    Decode {
        location: LocationLabel,
        reason: String,
    },
    #[error("invalid storage connection string: {0}")]
    ConnectionString(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failure outcomes of a single recommendation request.
///
/// Each variant is distinguishable so callers can present them differently.
#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("no endpoint access key configured")]
    MissingCredential,
    #[error("could not connect to recommendation endpoint '{endpoint}': {reason}")]
    Connection {
        endpoint: EndpointUrl,
        reason: String,
    },
    #[error("request to recommendation endpoint '{endpoint}' timed out")]
    Timeout { endpoint: EndpointUrl },
    #[error("recommendation endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("could not decode recommendation response: {0}")]
    Decode(String),
    #[error("unexpected error during recommendation request: {0}")]
    Transport(String),
}

/// Error type for configuration values that are present but unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Conditions that stop the workflow before any recommendation can be made.
#[derive(Debug, Error)]
pub enum WorkflowHalt {
    #[error("blob storage selected but no storage connection string is configured")]
    MissingStorageCredential,
    #[error("storage connection string is unusable: {0}")]
    InvalidStorageCredential(String),
    #[error("no user ids found in '{location}'")]
    NoUsers { location: LocationLabel },
}
