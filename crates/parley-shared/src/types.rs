use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Channel identity = "{type}:{id}"
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChannelCid {
    pub channel_type: String,
    pub channel_id: String,
}

impl ChannelCid {
    pub fn new(channel_type: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            channel_type: channel_type.into(),
            channel_id: channel_id.into(),
        }
    }
}

impl std::fmt::Display for ChannelCid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.channel_type, self.channel_id)
    }
}

/// Client-side message id: `{user_id}-{uuid v4}`.
///
/// Generating ids locally lets a message be persisted before the remote
/// service has ever seen it, and makes resubmission idempotent.
pub fn generate_message_id(user_id: &str) -> String {
    format!("{user_id}-{}", Uuid::new_v4())
}
