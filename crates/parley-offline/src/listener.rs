//! Local bookkeeping around attachment uploads.
//!
//! A message with attachments is written to the store before the upload
//! starts so it survives a crash; if the upload later fails the message is
//! rewritten with its new sync status and the rejection reason.

use std::sync::Arc;

use chrono::Utc;
use parley_shared::{ChatError, SyncStatus};
use parley_store::{Message, Result};

use crate::repository::{ChannelRepository, MessageRepository, UserRepository};
use crate::sync::ErrorClassifier;

pub struct AttachmentSendListener {
    messages: Arc<MessageRepository>,
    channels: Arc<ChannelRepository>,
    users: Arc<UserRepository>,
    classifier: Arc<dyn ErrorClassifier>,
}

impl AttachmentSendListener {
    pub fn new(
        messages: Arc<MessageRepository>,
        channels: Arc<ChannelRepository>,
        users: Arc<UserRepository>,
        classifier: Arc<dyn ErrorClassifier>,
    ) -> Self {
        Self {
            messages,
            channels,
            users,
            classifier,
        }
    }

    /// Called before attachments are sent.
    pub async fn on_attachment_send_request(&self, message: &Message) -> Result<()> {
        self.messages.insert_message(message.clone(), true).await?;
        self.channels
            .update_last_message_for_channel(&message.cid, message)
            .await?;
        Ok(())
    }

    /// Called with the upload outcome.  Success is persisted by the regular
    /// send path, so only failures are handled here.
    pub async fn on_attachment_send_result(
        &self,
        message: &Message,
        result: &std::result::Result<Message, ChatError>,
    ) -> Result<()> {
        if let Err(error) = result {
            self.handle_send_failure(message, error).await?;
        }
        Ok(())
    }

    async fn handle_send_failure(&self, message: &Message, error: &ChatError) -> Result<()> {
        let permanent = self.classifier.is_permanent(error, &message.cid);
        tracing::warn!(
            message_id = %message.id,
            permanent,
            moderation = error.is_moderation_failure(),
            %error,
            "attachment send failed"
        );

        let failed = Message {
            sync_status: if permanent {
                SyncStatus::FailedPermanently
            } else {
                SyncStatus::SyncNeeded
            },
            sync_description: Some(error.sync_description()),
            updated_locally_at: Some(Utc::now()),
            ..message.clone()
        };

        self.users.insert(failed.users()).await?;
        self.messages.insert_message(failed, false).await
    }
}
