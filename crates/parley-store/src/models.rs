//! Domain model structs persisted in the local database.
//!
//! Every struct is an immutable value snapshot: callers derive a new snapshot
//! and re-persist it instead of mutating shared state.  All of them derive
//! `Serialize`/`Deserialize` so they can be handed to the UI layer as-is.

use chrono::{DateTime, Utc};
use parley_shared::{ChannelCid, SyncStatus};
use serde::{Deserialize, Serialize};

/// Open-ended key/value data carried by every entity for forward-compatible
/// schema growth.
pub type ExtraData = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A known chat user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub role: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_active: Option<DateTime<Utc>>,
    pub invisible: bool,
    pub banned: bool,
    /// Ids of users muted by this user.
    pub mutes: Vec<String>,
    pub extra_data: ExtraData,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: "user".to_string(),
            ..Default::default()
        }
    }
}

/// A raw `users` row: the user plus the real id kept next to the sentinel
/// `me` row.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub user: User,
    pub original_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// A conversation channel, keyed by its `type:id` cid.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Channel {
    pub cid: String,
    pub channel_type: String,
    pub channel_id: String,
    /// Slow-mode delay in seconds.
    pub cooldown: i32,
    pub frozen: bool,
    pub hidden: Option<bool>,
    pub created_by_user_id: String,
    pub member_count: i32,
    pub last_message_id: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub team: String,
    pub extra_data: ExtraData,
    pub sync_status: SyncStatus,
}

impl Channel {
    pub fn new(channel_type: impl Into<String>, channel_id: impl Into<String>) -> Self {
        let cid = ChannelCid::new(channel_type, channel_id);
        Self {
            cid: cid.to_string(),
            channel_type: cid.channel_type,
            channel_id: cid.channel_id,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message.
///
/// Only the ids of `user` and `mentioned_users` are persisted with the
/// message; full user records live in the `users` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub cid: String,
    pub user: User,
    pub text: String,
    pub attachments: Vec<Attachment>,
    pub mentioned_users: Vec<User>,
    pub created_at: Option<DateTime<Utc>>,
    pub created_locally_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_locally_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub extra_data: ExtraData,
    pub sync_status: SyncStatus,
    /// Why the last submission was rejected, for display next to the message.
    pub sync_description: Option<String>,
}

impl Message {
    /// Every user referenced by this message (author first, no duplicates).
    pub fn users(&self) -> Vec<User> {
        let mut users = vec![self.user.clone()];
        for mentioned in &self.mentioned_users {
            if users.iter().all(|u| u.id != mentioned.id) {
                users.push(mentioned.clone());
            }
        }
        users
    }

    /// Most relevant timestamp for ordering: server time, else local time.
    pub fn effective_created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.or(self.created_locally_at)
    }
}

// ---------------------------------------------------------------------------
// Attachment
// ---------------------------------------------------------------------------

/// A file attached to a message. Stored inline in the message row as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub title: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: i64,
    pub url: Option<String>,
    pub upload_state: UploadState,
    pub extra_data: ExtraData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadState {
    #[default]
    Idle,
    InProgress {
        bytes_uploaded: i64,
        total_bytes: i64,
    },
    Success,
    Failed {
        reason: String,
    },
}
