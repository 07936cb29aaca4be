use std::sync::Arc;

use parley_shared::SyncStatus;
use parley_store::{Message, MessageDao, Result, User};

use super::{partition_cached, UserRepository};
use crate::cache::BoundedCache;

/// Messages, cached by id.  Rows read from the store carry stub users which
/// are hydrated from the [`UserRepository`] before being returned.
pub struct MessageRepository {
    dao: Arc<dyn MessageDao>,
    users: Arc<UserRepository>,
    cache: BoundedCache<String, Message>,
}

impl MessageRepository {
    pub fn new(dao: Arc<dyn MessageDao>, users: Arc<UserRepository>, cache_size: usize) -> Self {
        Self {
            dao,
            users,
            cache: BoundedCache::new(cache_size),
        }
    }

    pub fn cache(&self) -> &BoundedCache<String, Message> {
        &self.cache
    }

    /// Persist `messages`.  With `cache == false` any cached copy is evicted
    /// instead of refreshed, so the next read is served by the store.
    pub async fn insert(&self, messages: Vec<Message>, cache: bool) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        if cache {
            self.cache
                .put_all(messages.iter().map(|m| (m.id.clone(), m.clone())));
        } else {
            for message in &messages {
                self.cache.remove(message.id.as_str());
            }
        }
        self.dao.insert_many(messages).await
    }

    pub async fn insert_message(&self, message: Message, cache: bool) -> Result<()> {
        self.insert(vec![message], cache).await
    }

    pub async fn select(&self, id: &str) -> Result<Option<Message>> {
        if let Some(message) = self.cache.get(id) {
            return Ok(Some(message));
        }
        match self.dao.select(id).await? {
            Some(message) => Ok(self.hydrate(vec![message]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn select_many(&self, ids: &[String]) -> Result<Vec<Message>> {
        let (mut messages, misses) = partition_cached(&self.cache, ids);
        if !misses.is_empty() {
            let stored = self.dao.select_many(misses).await?;
            messages.extend(self.hydrate(stored).await?);
        }
        Ok(messages)
    }

    /// Newest `limit` messages of channel `cid`, newest first.
    pub async fn select_for_channel(&self, cid: &str, limit: usize) -> Result<Vec<Message>> {
        let stored = self.dao.select_for_channel(cid, limit).await?;
        self.hydrate(stored).await
    }

    /// Predicate queries always go to the store.
    pub async fn select_by_sync_status(
        &self,
        status: SyncStatus,
        limit: usize,
    ) -> Result<Vec<Message>> {
        self.select_by_sync_status_after(status, None, limit).await
    }

    /// Next page of messages in `status` whose id sorts after `after`.
    pub async fn select_by_sync_status_after(
        &self,
        status: SyncStatus,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Message>> {
        let stored = self
            .dao
            .select_by_sync_status(status, after.map(str::to_owned), limit)
            .await?;
        self.hydrate(stored).await
    }

    pub async fn clear_all(&self) -> Result<usize> {
        self.cache.clear();
        self.dao.delete_all().await
    }

    /// Replace stub users with full records where known.
    async fn hydrate(&self, mut messages: Vec<Message>) -> Result<Vec<Message>> {
        if messages.is_empty() {
            return Ok(messages);
        }
        let mut ids: Vec<String> = Vec::new();
        for message in &messages {
            ids.push(message.user.id.clone());
            ids.extend(message.mentioned_users.iter().map(|u| u.id.clone()));
        }
        let users = self.users.select_map(&ids).await?;

        let resolve = |stub: &mut User| {
            if let Some(full) = users.get(&stub.id) {
                *stub = full.clone();
            }
        };
        for message in &mut messages {
            resolve(&mut message.user);
            message.mentioned_users.iter_mut().for_each(resolve);
        }
        Ok(messages)
    }
}
