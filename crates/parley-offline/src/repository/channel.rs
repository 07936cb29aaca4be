use std::sync::Arc;

use parley_shared::SyncStatus;
use parley_store::{Channel, ChannelDao, Message, Result};

use super::partition_cached;
use crate::cache::BoundedCache;

/// Channels, cached by cid.
pub struct ChannelRepository {
    dao: Arc<dyn ChannelDao>,
    cache: BoundedCache<String, Channel>,
}

impl ChannelRepository {
    pub fn new(dao: Arc<dyn ChannelDao>, cache_size: usize) -> Self {
        Self {
            dao,
            cache: BoundedCache::new(cache_size),
        }
    }

    pub fn cache(&self) -> &BoundedCache<String, Channel> {
        &self.cache
    }

    pub async fn insert(&self, channels: Vec<Channel>) -> Result<()> {
        if channels.is_empty() {
            return Ok(());
        }
        self.cache
            .put_all(channels.iter().map(|c| (c.cid.clone(), c.clone())));
        self.dao.insert_many(channels).await
    }

    pub async fn insert_channel(&self, channel: Channel) -> Result<()> {
        self.insert(vec![channel]).await
    }

    pub async fn select(&self, cid: &str) -> Result<Option<Channel>> {
        if let Some(channel) = self.cache.get(cid) {
            return Ok(Some(channel));
        }
        self.dao.select(cid).await
    }

    pub async fn select_many(&self, cids: &[String]) -> Result<Vec<Channel>> {
        let (mut channels, misses) = partition_cached(&self.cache, cids);
        if !misses.is_empty() {
            channels.extend(self.dao.select_many(misses).await?);
        }
        Ok(channels)
    }

    pub async fn select_by_sync_status(
        &self,
        status: SyncStatus,
        limit: usize,
    ) -> Result<Vec<Channel>> {
        self.select_by_sync_status_after(status, None, limit).await
    }

    /// Next page of channels in `status` whose cid sorts after `after`.
    pub async fn select_by_sync_status_after(
        &self,
        status: SyncStatus,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Channel>> {
        self.dao
            .select_by_sync_status(status, after.map(str::to_owned), limit)
            .await
    }

    pub async fn select_cids_by_sync_status(&self, status: SyncStatus) -> Result<Vec<String>> {
        self.dao.select_cids_by_sync_status(status).await
    }

    /// Point the channel's last-message fields at `message` if it is newer
    /// than the current one.  Returns whether the channel was rewritten; an
    /// unknown channel is left alone.
    pub async fn update_last_message_for_channel(
        &self,
        cid: &str,
        message: &Message,
    ) -> Result<bool> {
        let Some(channel) = self.select(cid).await? else {
            return Ok(false);
        };
        let Some(message_at) = message.effective_created_at() else {
            return Ok(false);
        };
        let is_newer = channel
            .last_message_at
            .map_or(true, |current| message_at >= current);
        if !is_newer {
            return Ok(false);
        }

        self.insert_channel(Channel {
            last_message_id: Some(message.id.clone()),
            last_message_at: Some(message_at),
            ..channel
        })
        .await?;
        Ok(true)
    }

    pub async fn clear_all(&self) -> Result<usize> {
        self.cache.clear();
        self.dao.delete_all().await
    }
}
