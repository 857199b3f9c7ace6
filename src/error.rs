use thiserror::Error;

/// Local persistence failures. These surface to the caller: ad eligibility
/// is decided from persisted values, so a failed write must not be ignored.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value for `{key}` is corrupted: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize value for `{key}`: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("identity store lock poisoned")]
    LockPoisoned,
}

/// Failures on the leg to the external ad/analytics collector. Never
/// surfaced past `EventReporter`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("collector unreachable")]
    Unreachable,

    #[error("collector rejected request with status {status}")]
    Rejected { status: u16 },

    #[error("malformed collector response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A write would replace a non-empty attribution id with an empty or
    /// absent one. Use `IdentityStore::clear` to reset explicitly.
    #[error("refusing to clear stored attribution id `{stored}`")]
    WouldClearAttributionId { stored: String },
}

/// The requesting screen was dismissed before its request completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("screen dismissed before the request completed")]
pub struct Cancelled;
