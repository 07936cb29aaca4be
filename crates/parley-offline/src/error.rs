use parley_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the offline layer's outer operations.
///
/// Repository calls return [`StoreError`] directly; this type wraps it for
/// context construction and sync passes.
#[derive(Error, Debug)]
pub enum OfflineError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, OfflineError>;
