//! Sync-status transitions driven by remote submission outcomes.
//!
//! ```text
//! SyncNeeded --ok--------> Completed
//!            --permanent-> FailedPermanently   (terminal)
//!            --transient-> SyncNeeded
//! Completed / FailedPermanently --local edit--> SyncNeeded
//! ```

use chrono::{DateTime, Utc};
use parley_shared::{ChatError, SyncStatus};
use parley_store::{Channel, Message};

/// An entity whose local mutations are reconciled with the remote service.
pub trait Syncable: Clone + Send + Sync + 'static {
    /// Store key (message id, channel cid).
    fn sync_key(&self) -> &str;

    /// Channel the entity belongs to, handed to the error classifier.
    fn cid(&self) -> &str;

    fn sync_status(&self) -> SyncStatus;

    fn with_sync_status(self, status: SyncStatus) -> Self;

    /// Snapshot for a permanent rejection.
    fn with_permanent_failure(self, _description: String, _at: DateTime<Utc>) -> Self {
        self.with_sync_status(SyncStatus::FailedPermanently)
    }

    /// Re-enter the sync cycle after a local edit. This is the only way out
    /// of `FailedPermanently`.
    fn mark_sync_needed(self) -> Self {
        self.with_sync_status(SyncStatus::SyncNeeded)
    }
}

impl Syncable for Message {
    fn sync_key(&self) -> &str {
        &self.id
    }

    fn cid(&self) -> &str {
        &self.cid
    }

    fn sync_status(&self) -> SyncStatus {
        self.sync_status
    }

    fn with_sync_status(self, status: SyncStatus) -> Self {
        Message {
            sync_status: status,
            ..self
        }
    }

    fn with_permanent_failure(self, description: String, at: DateTime<Utc>) -> Self {
        Message {
            sync_status: SyncStatus::FailedPermanently,
            sync_description: Some(description),
            updated_locally_at: Some(at),
            ..self
        }
    }

    fn mark_sync_needed(self) -> Self {
        Message {
            sync_status: SyncStatus::SyncNeeded,
            sync_description: None,
            updated_locally_at: Some(Utc::now()),
            ..self
        }
    }
}

impl Syncable for Channel {
    fn sync_key(&self) -> &str {
        &self.cid
    }

    fn cid(&self) -> &str {
        &self.cid
    }

    fn sync_status(&self) -> SyncStatus {
        self.sync_status
    }

    fn with_sync_status(self, status: SyncStatus) -> Self {
        Channel {
            sync_status: status,
            ..self
        }
    }
}

/// Decides whether a remote failure must never be retried.
///
/// The sync engine trusts the answer absolutely.
pub trait ErrorClassifier: Send + Sync {
    fn is_permanent(&self, error: &ChatError, cid: &str) -> bool;
}

/// Classification by HTTP status and error code, see
/// [`ChatError::is_permanent`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorClassifier;

impl ErrorClassifier for DefaultErrorClassifier {
    fn is_permanent(&self, error: &ChatError, _cid: &str) -> bool {
        error.is_permanent()
    }
}

/// Where one submission left its entity.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome<E> {
    Completed(E),
    FailedPermanently(E),
    Pending(E),
}

impl<E: Syncable> SyncOutcome<E> {
    /// Apply a remote `result` for the local snapshot `local`.
    pub fn resolve(
        local: E,
        result: Result<E, ChatError>,
        classifier: &dyn ErrorClassifier,
    ) -> Self {
        if local.sync_status().is_terminal() {
            return SyncOutcome::FailedPermanently(local);
        }

        match result {
            Ok(acknowledged) if acknowledged.sync_key() == local.sync_key() => {
                SyncOutcome::Completed(acknowledged.with_sync_status(SyncStatus::Completed))
            }
            Ok(acknowledged) => {
                tracing::warn!(
                    local = local.sync_key(),
                    remote = acknowledged.sync_key(),
                    "remote acknowledged a different key, keeping local snapshot"
                );
                SyncOutcome::Completed(local.with_sync_status(SyncStatus::Completed))
            }
            Err(error) if classifier.is_permanent(&error, local.cid()) => {
                tracing::warn!(
                    key = local.sync_key(),
                    cid = local.cid(),
                    %error,
                    "permanent sync failure"
                );
                SyncOutcome::FailedPermanently(
                    local.with_permanent_failure(error.sync_description(), Utc::now()),
                )
            }
            Err(error) => {
                tracing::debug!(key = local.sync_key(), %error, "transient sync failure");
                SyncOutcome::Pending(local.with_sync_status(SyncStatus::SyncNeeded))
            }
        }
    }

    pub fn entity(&self) -> &E {
        match self {
            SyncOutcome::Completed(e) | SyncOutcome::FailedPermanently(e) | SyncOutcome::Pending(e) => e,
        }
    }

    pub fn into_entity(self) -> E {
        match self {
            SyncOutcome::Completed(e) | SyncOutcome::FailedPermanently(e) | SyncOutcome::Pending(e) => e,
        }
    }
}
