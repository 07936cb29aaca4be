use thiserror::Error;

use crate::constants::{CODE_MESSAGE_MODERATION_FAILED, CODE_RATE_LIMITED, HTTP_TOO_MANY_REQUESTS};

/// Failure reported by the remote chat service for a single submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// The service answered with an error payload.
    #[error("Network error {status_code} (code {stream_code}): {message}")]
    Network {
        stream_code: i32,
        status_code: u16,
        message: String,
    },

    #[error("Request timed out")]
    Timeout,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

impl ChatError {
    pub fn network(stream_code: i32, status_code: u16, message: impl Into<String>) -> Self {
        ChatError::Network {
            stream_code,
            status_code,
            message: message.into(),
        }
    }

    pub fn is_moderation_failure(&self) -> bool {
        matches!(
            self,
            ChatError::Network { stream_code, .. } if *stream_code == CODE_MESSAGE_MODERATION_FAILED
        )
    }

    /// Client errors are permanent unless they ask us to slow down.
    /// Moderation rejections are always permanent.
    pub fn is_permanent(&self) -> bool {
        match self {
            ChatError::Network {
                stream_code,
                status_code,
                ..
            } => {
                if *stream_code == CODE_MESSAGE_MODERATION_FAILED {
                    return true;
                }
                (400..500).contains(status_code)
                    && *status_code != HTTP_TOO_MANY_REQUESTS
                    && *stream_code != CODE_RATE_LIMITED
            }
            ChatError::Timeout
            | ChatError::Connection(_)
            | ChatError::Parse(_)
            | ChatError::Other(_) => false,
        }
    }

    /// Human-readable reason stored next to a permanently failed entity.
    pub fn sync_description(&self) -> String {
        match self {
            ChatError::Network { message, .. } if self.is_moderation_failure() => {
                format!("message failed moderation: {message}")
            }
            other => other.to_string(),
        }
    }
}
