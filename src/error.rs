use thiserror::Error;

use crate::host::HostError;

pub type Result<T> = std::result::Result<T, PurgeError>;

#[derive(Debug, Error)]
pub enum PurgeError {
    /// A control did not show up in time. Callers decide whether this matters.
    #[error("element {descriptor} not found within {timeout_ms}ms")]
    NotFound { descriptor: String, timeout_ms: u64 },

    #[error("failed to delete \"{entry}\": {cause}")]
    DeleteFailed {
        entry: String,
        #[source]
        cause: Box<PurgeError>,
    },

    #[error("scan for \"{query}\" failed: {cause}")]
    ScanFailed {
        query: String,
        #[source]
        cause: HostError,
    },

    #[error("could not navigate past page {page}")]
    NavigationFailed { page: u32 },

    #[error("search text cannot be empty")]
    EmptyQuery,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Host(#[from] HostError),
}

impl PurgeError {
    pub fn delete_failed(entry: impl Into<String>, cause: PurgeError) -> Self {
        PurgeError::DeleteFailed {
            entry: entry.into(),
            cause: Box::new(cause),
        }
    }

    /// Whether this is the recoverable "control never appeared" case.
    pub fn is_not_found(&self) -> bool {
        match self {
            PurgeError::NotFound { .. } => true,
            PurgeError::DeleteFailed { cause, .. } => cause.is_not_found(),
            _ => false,
        }
    }
}
