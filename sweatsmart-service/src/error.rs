use thiserror::Error;

/// Failures while producing or saving an episode report.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Document error: {0}")]
    Document(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<std::fmt::Error> for ExportError {
    fn from(e: std::fmt::Error) -> Self {
        ExportError::Format(e.to_string())
    }
}
