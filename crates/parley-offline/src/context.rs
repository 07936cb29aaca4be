//! Explicitly constructed root object of the offline layer.
//!
//! Owned by the application and shared by `Arc`; there is no global
//! instance.

use std::sync::Arc;

use parley_store::{Database, SqliteStore, User};
use tokio::task::JoinHandle;

use crate::config::SyncConfig;
use crate::error::Result;
use crate::listener::AttachmentSendListener;
use crate::remote::{ChannelSubmitter, MessageSubmitter, RemoteService};
use crate::repository::{ChannelRepository, MessageRepository, UserRepository};
use crate::retry::{RetryConfig, RetryLoop};
use crate::service::SyncService;
use crate::sync::{DefaultErrorClassifier, ErrorClassifier};

pub struct ChatContext {
    config: SyncConfig,
    store: SqliteStore,
    users: Arc<UserRepository>,
    messages: Arc<MessageRepository>,
    channels: Arc<ChannelRepository>,
    attachments: AttachmentSendListener,
    sync: Arc<SyncService>,
}

impl ChatContext {
    /// Open the database named by `config` and wire every component with the
    /// default error classifier.
    pub fn open(
        config: SyncConfig,
        remote: Arc<dyn RemoteService>,
        current_user: Option<User>,
    ) -> Result<Self> {
        let db = match &config.database_path {
            Some(path) => Database::open_at(path)?,
            None => Database::open_default()?,
        };
        Ok(Self::new(
            config,
            SqliteStore::new(db),
            remote,
            Arc::new(DefaultErrorClassifier),
            current_user,
        ))
    }

    pub fn new(
        config: SyncConfig,
        store: SqliteStore,
        remote: Arc<dyn RemoteService>,
        classifier: Arc<dyn ErrorClassifier>,
        current_user: Option<User>,
    ) -> Self {
        let dao = Arc::new(store.clone());

        let users = Arc::new(UserRepository::new(
            dao.clone(),
            current_user,
            config.user_cache_size,
        ));
        let messages = Arc::new(MessageRepository::new(
            dao.clone(),
            Arc::clone(&users),
            config.message_cache_size,
        ));
        let channels = Arc::new(ChannelRepository::new(dao, config.channel_cache_size));

        let retry = RetryConfig {
            page_size: config.retry_page_size,
            max_pages: config.max_retry_pages,
        };
        let sync = Arc::new(SyncService::new(
            RetryLoop::new(
                "channels",
                channels.clone(),
                Arc::new(ChannelSubmitter::new(Arc::clone(&remote))),
                Arc::clone(&classifier),
                retry,
            ),
            RetryLoop::new(
                "messages",
                messages.clone(),
                Arc::new(MessageSubmitter::new(remote)),
                Arc::clone(&classifier),
                retry,
            ),
        ));

        let attachments = AttachmentSendListener::new(
            Arc::clone(&messages),
            Arc::clone(&channels),
            Arc::clone(&users),
            classifier,
        );

        tracing::debug!(
            current_user = users.current_user().map(|u| u.id.as_str()),
            page_size = config.retry_page_size,
            "chat context ready"
        );

        Self {
            config,
            store,
            users,
            messages,
            channels,
            attachments,
            sync,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn users(&self) -> &Arc<UserRepository> {
        &self.users
    }

    pub fn messages(&self) -> &Arc<MessageRepository> {
        &self.messages
    }

    pub fn channels(&self) -> &Arc<ChannelRepository> {
        &self.channels
    }

    pub fn attachments(&self) -> &AttachmentSendListener {
        &self.attachments
    }

    pub fn sync(&self) -> &Arc<SyncService> {
        &self.sync
    }

    /// Schedule sync passes every `config.retry_interval`.  Abort the handle
    /// to stop them.
    pub fn spawn_periodic_sync(&self) -> JoinHandle<()> {
        Arc::clone(&self.sync).spawn_periodic(self.config.retry_interval)
    }

    /// Wipe caches and the local store, e.g. on logout.
    pub async fn clear_local_data(&self) -> Result<usize> {
        self.users.cache().clear();
        self.messages.cache().clear();
        self.channels.cache().clear();
        Ok(self.store.clear_all().await?)
    }
}
