use thiserror::Error;

use crate::types::IndexKind;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    /// The entity carries an empty unique key; nothing was written.
    #[error("Missing unique key for {0} entity")]
    MissingKey(IndexKind),

    #[error("Entity of kind {found} routed to the {expected} indexer")]
    KindMismatch { expected: IndexKind, found: IndexKind },

    /// Failure reported by the underlying index store (commit, lookup, open).
    #[error("Index store error: {0}")]
    Store(#[source] BoxError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn store<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Store(err.into())
    }

    /// Resource errors are the ones a full rebuild is expected to reconcile.
    pub fn is_resource(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
