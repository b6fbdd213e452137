//! Full-history CSV export through the browser's logged-in session.
//!
//! The bank serves the whole history as a windows-1250 CSV from an internal
//! endpoint. Requests reuse the session cookies of the browser the user
//! logged in with; nothing here logs in or keeps a session alive.

mod client;
mod csv;
mod payload;

use chrono::NaiveDate;
use thiserror::Error;

pub use client::{cookie_header, ExportClient, EXPORT_PATH};
pub use csv::{normalize_export_csv, HEADER_MARKER};
pub use payload::{format_date, DownloadRequest, ExportRange, PfmFilters};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("The CSV fetch request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("The CSV fetch request has failed. Response status: {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("The export has no \"#Data\" header line")]
    MissingHeader,

    #[error("Invalid export range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },
}
