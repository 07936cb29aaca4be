//! Stand-in for the remote chat service.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parley_offline::RemoteService;
use parley_shared::constants::CODE_MESSAGE_MODERATION_FAILED;
use parley_shared::ChatError;
use parley_store::{Channel, Message};

const LATENCY: Duration = Duration::from_millis(200);

/// Acknowledges every submission after a fixed delay, optionally rejecting
/// every `fail_every`-th one as a moderation failure.
pub struct SimulatedBackend {
    fail_every: Option<usize>,
    submissions: AtomicUsize,
}

impl SimulatedBackend {
    pub fn new(fail_every: Option<usize>) -> Self {
        Self {
            fail_every: fail_every.filter(|k| *k > 0),
            submissions: AtomicUsize::new(0),
        }
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::Relaxed)
    }

    async fn round_trip(&self) -> Result<(), ChatError> {
        let n = self.submissions.fetch_add(1, Ordering::Relaxed) + 1;
        tokio::time::sleep(LATENCY).await;
        match self.fail_every {
            Some(k) if n % k == 0 => Err(ChatError::network(
                CODE_MESSAGE_MODERATION_FAILED,
                400,
                format!("submission {n} rejected by simulated backend"),
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteService for SimulatedBackend {
    async fn send_message(&self, message: Message) -> Result<Message, ChatError> {
        self.round_trip().await?;
        Ok(Message {
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
            ..message
        })
    }

    async fn update_channel(&self, channel: Channel) -> Result<Channel, ChatError> {
        self.round_trip().await?;
        Ok(Channel {
            updated_at: Some(Utc::now()),
            ..channel
        })
    }
}
