//! The remote chat service as seen by the sync engine.
//!
//! The wire client itself lives outside this crate; all the engine needs is
//! a request/response call per mutation that either acknowledges the entity
//! or fails with a [`ChatError`].

use std::sync::Arc;

use async_trait::async_trait;
use parley_shared::ChatError;
use parley_store::{Channel, Message};

#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Submit a locally created or edited message.
    async fn send_message(&self, message: Message) -> Result<Message, ChatError>;

    /// Submit a locally created or edited channel.
    async fn update_channel(&self, channel: Channel) -> Result<Channel, ChatError>;
}

/// One submission per entity, as used by the retry loop.
#[async_trait]
pub trait Submitter<E>: Send + Sync {
    async fn submit(&self, entity: E) -> Result<E, ChatError>;
}

/// Resubmits messages through [`RemoteService::send_message`].
pub struct MessageSubmitter {
    remote: Arc<dyn RemoteService>,
}

impl MessageSubmitter {
    pub fn new(remote: Arc<dyn RemoteService>) -> Self {
        Self { remote }
    }
}

#[async_trait]
impl Submitter<Message> for MessageSubmitter {
    async fn submit(&self, message: Message) -> Result<Message, ChatError> {
        self.remote.send_message(message).await
    }
}

/// Resubmits channels through [`RemoteService::update_channel`].
pub struct ChannelSubmitter {
    remote: Arc<dyn RemoteService>,
}

impl ChannelSubmitter {
    pub fn new(remote: Arc<dyn RemoteService>) -> Self {
        Self { remote }
    }
}

#[async_trait]
impl Submitter<Channel> for ChannelSubmitter {
    async fn submit(&self, channel: Channel) -> Result<Channel, ChatError> {
        self.remote.update_channel(channel).await
    }
}
