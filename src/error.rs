use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Order source request failed: {0}")]
    TransientFetch(#[from] reqwest::Error),

    #[error("Malformed page {page}: {details}")]
    MalformedPage { page: u32, details: String },

    #[error("Invalid report range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Ingestion cancelled before completion")]
    Cancelled,

    #[error("Export error: {0}")]
    ExportError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
