//! Async data-access traits, one per entity table, and their SQLite
//! implementation.
//!
//! The offline layer only talks to the store through these traits so tests
//! can substitute counting stubs, and so the blocking SQLite calls stay on
//! tokio's blocking pool instead of stalling async workers.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use parley_shared::SyncStatus;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Channel, Message, User, UserRecord};

#[async_trait]
pub trait UserDao: Send + Sync {
    async fn insert_many(&self, users: Vec<User>) -> Result<()>;
    /// Write a raw row, including `original_id`.
    async fn insert_record(&self, record: UserRecord) -> Result<()>;
    async fn select(&self, id: &str) -> Result<Option<User>>;
    async fn select_record(&self, id: &str) -> Result<Option<UserRecord>>;
    async fn select_many(&self, ids: Vec<String>) -> Result<Vec<User>>;
    async fn delete_all(&self) -> Result<usize>;
}

#[async_trait]
pub trait ChannelDao: Send + Sync {
    async fn insert_many(&self, channels: Vec<Channel>) -> Result<()>;
    async fn select(&self, cid: &str) -> Result<Option<Channel>>;
    async fn select_many(&self, cids: Vec<String>) -> Result<Vec<Channel>>;
    /// Keyset page: channels in `status` with cid greater than `after`.
    async fn select_by_sync_status(
        &self,
        status: SyncStatus,
        after: Option<String>,
        limit: usize,
    ) -> Result<Vec<Channel>>;
    async fn select_cids_by_sync_status(&self, status: SyncStatus) -> Result<Vec<String>>;
    async fn delete_all(&self) -> Result<usize>;
}

#[async_trait]
pub trait MessageDao: Send + Sync {
    async fn insert_many(&self, messages: Vec<Message>) -> Result<()>;
    async fn select(&self, id: &str) -> Result<Option<Message>>;
    async fn select_many(&self, ids: Vec<String>) -> Result<Vec<Message>>;
    async fn select_for_channel(&self, cid: &str, limit: usize) -> Result<Vec<Message>>;
    /// Keyset page: messages in `status` with id greater than `after`.
    async fn select_by_sync_status(
        &self,
        status: SyncStatus,
        after: Option<String>,
        limit: usize,
    ) -> Result<Vec<Message>>;
    async fn delete_all(&self) -> Result<usize>;
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

/// Shared handle to one [`Database`], usable from any task.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Run `f` against the database on the blocking pool.
    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&guard)
        })
        .await?
    }

    /// Wipe every entity table.
    pub async fn clear_all(&self) -> Result<usize> {
        self.with_db(|db| db.clear_all()).await
    }
}

#[async_trait]
impl UserDao for SqliteStore {
    async fn insert_many(&self, users: Vec<User>) -> Result<()> {
        self.with_db(move |db| db.upsert_users(&users)).await
    }

    async fn insert_record(&self, record: UserRecord) -> Result<()> {
        self.with_db(move |db| db.upsert_user_records(std::slice::from_ref(&record)))
            .await
    }

    async fn select(&self, id: &str) -> Result<Option<User>> {
        Ok(UserDao::select_record(self, id).await?.map(|r| r.user))
    }

    async fn select_record(&self, id: &str) -> Result<Option<UserRecord>> {
        let id = id.to_owned();
        self.with_db(move |db| db.get_user_record(&id)).await
    }

    async fn select_many(&self, ids: Vec<String>) -> Result<Vec<User>> {
        self.with_db(move |db| db.get_users(&ids)).await
    }

    async fn delete_all(&self) -> Result<usize> {
        self.with_db(|db| db.delete_all_users()).await
    }
}

#[async_trait]
impl ChannelDao for SqliteStore {
    async fn insert_many(&self, channels: Vec<Channel>) -> Result<()> {
        self.with_db(move |db| db.upsert_channels(&channels)).await
    }

    async fn select(&self, cid: &str) -> Result<Option<Channel>> {
        let cid = cid.to_owned();
        self.with_db(move |db| db.get_channel(&cid)).await
    }

    async fn select_many(&self, cids: Vec<String>) -> Result<Vec<Channel>> {
        self.with_db(move |db| db.get_channels(&cids)).await
    }

    async fn select_by_sync_status(
        &self,
        status: SyncStatus,
        after: Option<String>,
        limit: usize,
    ) -> Result<Vec<Channel>> {
        self.with_db(move |db| db.get_channels_by_sync_status(status, after.as_deref(), limit))
            .await
    }

    async fn select_cids_by_sync_status(&self, status: SyncStatus) -> Result<Vec<String>> {
        self.with_db(move |db| db.get_channel_cids_by_sync_status(status))
            .await
    }

    async fn delete_all(&self) -> Result<usize> {
        self.with_db(|db| db.delete_all_channels()).await
    }
}

#[async_trait]
impl MessageDao for SqliteStore {
    async fn insert_many(&self, messages: Vec<Message>) -> Result<()> {
        self.with_db(move |db| db.upsert_messages(&messages)).await
    }

    async fn select(&self, id: &str) -> Result<Option<Message>> {
        let id = id.to_owned();
        self.with_db(move |db| db.get_message(&id)).await
    }

    async fn select_many(&self, ids: Vec<String>) -> Result<Vec<Message>> {
        self.with_db(move |db| db.get_messages(&ids)).await
    }

    async fn select_for_channel(&self, cid: &str, limit: usize) -> Result<Vec<Message>> {
        let cid = cid.to_owned();
        self.with_db(move |db| db.get_messages_for_channel(&cid, limit))
            .await
    }

    async fn select_by_sync_status(
        &self,
        status: SyncStatus,
        after: Option<String>,
        limit: usize,
    ) -> Result<Vec<Message>> {
        self.with_db(move |db| db.get_messages_by_sync_status(status, after.as_deref(), limit))
            .await
    }

    async fn delete_all(&self) -> Result<usize> {
        self.with_db(|db| db.delete_all_messages()).await
    }
}
