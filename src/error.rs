// Error types: one enum for everything that can stop a run, plus the
// HTTP-level errors the API client produces.

use std::path::PathBuf;

use thiserror::Error;

use crate::api::PassFailDrop;

/// Errors raised by the HTTP client while uploading a batch.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("authentication token contains characters not allowed in a header")]
    InvalidToken,

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Every way a run can end early.
#[derive(Error, Debug)]
pub enum Error {
    #[error("path to spreadsheet is invalid or doesn't exist: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("invalid layout: {0}")]
    Layout(String),

    #[error("failed to read spreadsheet: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: field {field} is not valid UTF-8")]
    Encoding { line: u64, field: usize },

    #[error("line {line}: column '{column}' has invalid count '{value}'")]
    InvalidCount {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("could not parse {record}: {reason}")]
    MalformedRecord { reason: String, record: String },

    #[error("parse preview was rejected")]
    UserDeclined,

    #[error("batch {batch} failed to upload ({} records): {source}", .records.len())]
    Upload {
        batch: usize,
        records: Vec<PassFailDrop>,
        #[source]
        source: ApiError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
