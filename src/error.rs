//! Error types for catalog access

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Failure of a primary catalog request.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The requested work does not exist upstream.
    #[error("book not found: {id}")]
    NotFound { id: String },

    /// Non-success status, transport failure, or an unreadable body.
    /// `status` is only set when the server answered.
    #[error("{}", upstream_message(.status, .message))]
    Upstream { status: Option<u16>, message: String },

    /// Bad base URL, request URL or HTTP client settings.
    #[error("invalid client configuration: {0}")]
    Client(String),
}

fn upstream_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("upstream request failed with status {status}: {message}"),
        None => format!("upstream request failed: {message}"),
    }
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::NotFound { .. } => Some(404),
            CatalogError::Upstream { status, .. } => *status,
            CatalogError::Client(_) => None,
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::Upstream {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Failure of a session cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
