use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    /// The spreadsheet writer could not be obtained; nothing was written.
    #[error("spreadsheet writer unavailable: {0}")]
    Load(String),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("workbook packaging failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;
