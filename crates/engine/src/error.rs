use stonks_api::PlatformError;
use stonks_storage::StoreError;

/// Failure of a single user's update cycle.
///
/// Never escapes a batch: the batch logs it and moves on to the next user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CycleError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Failure handling an ingestion event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    /// The event did not carry a required field.
    #[error("event is missing {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cycle(#[from] CycleError),
}
