//! Error types shared by the persistence boundary, history decoding and the parameter editor.

use std::path::PathBuf;
use thiserror::Error;

/// Failures at the filesystem persistence boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid name {0:?}: nothing left after sanitizing")]
    InvalidName(String),

    #[error("{} not found", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no data to save")]
    NothingToSave,

    #[error("malformed JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A history document that parsed as JSON but breaks the snapshot invariants.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("history is not a step map: {0}")]
    Json(#[from] serde_json::Error),

    #[error("history has no snapshots")]
    Empty,

    #[error("time step key {0:?} is not a non-negative integer")]
    BadStepKey(String),

    #[error("time step {0} is missing")]
    MissingStep(usize),

    #[error("time step {0} appears more than once")]
    DuplicateStep(usize),

    #[error("step {step}: {group} has {positions} positions but {statuses} statuses")]
    LengthMismatch {
        step: usize,
        group: &'static str,
        positions: usize,
        statuses: usize,
    },

    #[error("step {step}: {group} changed from {expected} to {found} entries")]
    FixedGroupResized {
        step: usize,
        group: &'static str,
        expected: usize,
        found: usize,
    },
}

/// Failures reading or editing a configuration.
#[derive(Error, Debug)]
pub enum ParamsError {
    #[error("configuration field {field}: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid parameter path {0:?}")]
    BadPath(String),

    #[error("parameter path {0:?} does not exist")]
    UnknownPath(String),

    #[error("index {index} out of range at {path:?}")]
    IndexOutOfRange { path: String, index: usize },
}

/// Anything that can abort loading a recorded run.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error("no configuration is loaded in the editor")]
    NoConfiguration,
}

/// A package map that does not decode, or an edit that does not apply to it.
#[derive(Error, Debug)]
pub enum MapError {
    #[error("invalid map document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("point {index} does not exist, the map has {len} points")]
    PointOutOfRange { index: usize, len: usize },

    #[error("unknown package color {0:?}")]
    UnknownColor(String),
}
