//! Error types for the sheet_export crate.

use std::path::PathBuf;

use thiserror::Error;

/// Transport-level failures when talking to Google APIs.
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("JWT encoding error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Token refresh failed: {0}")]
    TokenRefreshError(String),
}

/// Errors raised by the export pipeline, one kind per stage.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to load credentials from {path:?}: {reason}")]
    Credential { path: PathBuf, reason: String },

    #[error("Failed to list spreadsheets in folder {folder_id}: {source}")]
    Listing {
        folder_id: String,
        #[source]
        source: DriveError,
    },

    #[error("Failed to download file {file_id}: {source}")]
    Download {
        file_id: String,
        #[source]
        source: DriveError,
    },

    #[error("Failed to convert file {file_id}: {source}")]
    Conversion {
        file_id: String,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("Workbook for file {0} contains no sheets")]
    NoSheets(String),

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to create output directory {path:?}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid URL or ID: {0}")]
    InvalidUrlOrId(String),
}

impl ExportError {
    pub(crate) fn credential(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ExportError::Credential {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for ExportError.
pub type Result<T> = std::result::Result<T, ExportError>;
