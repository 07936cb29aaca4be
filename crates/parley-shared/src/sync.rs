//! Synchronization status of a locally mutated entity.

use serde::{Deserialize, Serialize};

/// Whether local state has been durably propagated to the remote service.
///
/// The integer codes are what the store persists; they must never change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncStatus {
    /// A local change is waiting to be uploaded.
    SyncNeeded,
    /// Acknowledged by the remote service.
    #[default]
    Completed,
    /// Rejected for good (validation, moderation). Never retried.
    FailedPermanently,
    /// Claimed by a submission that has not returned yet.
    InProgress,
    /// A message whose attachments are still being uploaded.
    AwaitingAttachments,
}

impl SyncStatus {
    pub fn code(self) -> i32 {
        match self {
            SyncStatus::SyncNeeded => -1,
            SyncStatus::Completed => 1,
            SyncStatus::FailedPermanently => 2,
            SyncStatus::InProgress => 3,
            SyncStatus::AwaitingAttachments => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(SyncStatus::SyncNeeded),
            1 => Some(SyncStatus::Completed),
            2 => Some(SyncStatus::FailedPermanently),
            3 => Some(SyncStatus::InProgress),
            4 => Some(SyncStatus::AwaitingAttachments),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == SyncStatus::FailedPermanently
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SyncStatus::SyncNeeded => "SYNC_NEEDED",
            SyncStatus::Completed => "COMPLETED",
            SyncStatus::FailedPermanently => "FAILED_PERMANENTLY",
            SyncStatus::InProgress => "IN_PROGRESS",
            SyncStatus::AwaitingAttachments => "AWAITING_ATTACHMENTS",
        };
        f.write_str(name)
    }
}
