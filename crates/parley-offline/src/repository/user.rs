use std::collections::HashMap;
use std::sync::Arc;

use parley_shared::constants::ME_ID;
use parley_store::{Result, User, UserDao, UserRecord};

use super::partition_cached;
use crate::cache::BoundedCache;

/// Users, with an LRU cache of the most recently touched records and a
/// sentinel row for the authenticated user.
pub struct UserRepository {
    dao: Arc<dyn UserDao>,
    cache: BoundedCache<String, User>,
    current_user: Option<User>,
}

impl UserRepository {
    pub fn new(dao: Arc<dyn UserDao>, current_user: Option<User>, cache_size: usize) -> Self {
        Self {
            dao,
            cache: BoundedCache::new(cache_size),
            current_user,
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn cache(&self) -> &BoundedCache<String, User> {
        &self.cache
    }

    pub async fn insert(&self, users: Vec<User>) -> Result<()> {
        if users.is_empty() {
            return Ok(());
        }
        self.cache
            .put_all(users.iter().map(|user| (user.id.clone(), user.clone())));
        self.dao.insert_many(users).await
    }

    pub async fn insert_user(&self, user: User) -> Result<()> {
        self.insert(vec![user]).await
    }

    /// Persist the authenticated user under the sentinel key, keeping the
    /// real id alongside.
    pub async fn insert_me(&self, user: User) -> Result<()> {
        let original_id = user.id.clone();
        let record = UserRecord {
            user: User {
                id: ME_ID.to_string(),
                ..user
            },
            original_id: Some(original_id),
        };
        self.dao.insert_record(record).await
    }

    /// The authenticated user as last persisted, with its real id restored.
    /// Always read from the store.
    pub async fn select_me(&self) -> Result<Option<User>> {
        let record = self.dao.select_record(ME_ID).await?;
        Ok(record.map(|r| User {
            id: r.original_id.unwrap_or(r.user.id),
            ..r.user
        }))
    }

    pub async fn select(&self, id: &str) -> Result<Option<User>> {
        if let Some(user) = self.cache.get(id) {
            return Ok(Some(user));
        }
        self.dao.select(id).await
    }

    pub async fn select_many(&self, ids: &[String]) -> Result<Vec<User>> {
        let (mut users, misses) = partition_cached(&self.cache, ids);
        if !misses.is_empty() {
            tracing::trace!(hits = users.len(), misses = misses.len(), "user cache lookup");
            users.extend(self.dao.select_many(misses).await?);
        }
        Ok(users)
    }

    /// Users keyed by id, with the authenticated user overlaid so that
    /// self-lookups never miss.
    pub async fn select_map(&self, ids: &[String]) -> Result<HashMap<String, User>> {
        let mut map: HashMap<String, User> = self
            .select_many(ids)
            .await?
            .into_iter()
            .map(|user| (user.id.clone(), user))
            .collect();
        if let Some(me) = &self.current_user {
            map.insert(me.id.clone(), me.clone());
        }
        Ok(map)
    }

    /// Drop every cached and stored user.
    pub async fn clear_all(&self) -> Result<usize> {
        self.cache.clear();
        self.dao.delete_all().await
    }
}
