//! Error types for the tgscout host.

use tgscout_search::SearchError;

/// Top-level error type for the host shell.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration could not be parsed or is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Gateway bind or serve error.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Error from the search core.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AppError>;
