//! Stubs shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use parley_offline::{PendingStore, RemoteService, Submitter, Syncable};
use parley_shared::{ChatError, SyncStatus};
use parley_store::{Channel, Database, Message, Result, SqliteStore, StoreError, User, UserDao, UserRecord};

pub fn store_error() -> StoreError {
    StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"))
}

pub fn memory_store() -> SqliteStore {
    SqliteStore::new(Database::open_in_memory().expect("in-memory database"))
}

pub fn user(id: &str) -> User {
    User {
        name: Some(format!("User {id}")),
        ..User::new(id)
    }
}

pub fn pending_channel(id: &str) -> Channel {
    Channel {
        sync_status: SyncStatus::SyncNeeded,
        created_by_user_id: "alice".into(),
        ..Channel::new("messaging", id)
    }
}

pub fn pending_message(id: &str, cid: &str) -> Message {
    Message {
        id: id.into(),
        cid: cid.into(),
        user: User::new("alice"),
        text: format!("text of {id}"),
        created_locally_at: Some(chrono::Utc::now()),
        sync_status: SyncStatus::SyncNeeded,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// UserDao with call counters
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct CountingUserDao {
    rows: Mutex<HashMap<String, UserRecord>>,
    pub insert_calls: AtomicUsize,
    pub point_reads: AtomicUsize,
    pub batch_reads: Mutex<Vec<Vec<String>>>,
    pub fail: AtomicBool,
}

impl CountingUserDao {
    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(store_error());
        }
        Ok(())
    }

    pub fn seed(&self, users: &[User]) {
        let mut rows = self.rows.lock().unwrap();
        for user in users {
            rows.insert(
                user.id.clone(),
                UserRecord {
                    user: user.clone(),
                    original_id: None,
                },
            );
        }
    }

    pub fn batch_reads(&self) -> Vec<Vec<String>> {
        self.batch_reads.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserDao for CountingUserDao {
    async fn insert_many(&self, users: Vec<User>) -> Result<()> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.seed(&users);
        Ok(())
    }

    async fn insert_record(&self, record: UserRecord) -> Result<()> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.rows
            .lock()
            .unwrap()
            .insert(record.user.id.clone(), record);
        Ok(())
    }

    async fn select(&self, id: &str) -> Result<Option<User>> {
        Ok(self.select_record(id).await?.map(|r| r.user))
    }

    async fn select_record(&self, id: &str) -> Result<Option<UserRecord>> {
        self.point_reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn select_many(&self, ids: Vec<String>) -> Result<Vec<User>> {
        self.batch_reads.lock().unwrap().push(ids.clone());
        self.check()?;
        let rows = self.rows.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| rows.get(id).map(|r| r.user.clone()))
            .collect())
    }

    async fn delete_all(&self) -> Result<usize> {
        let mut rows = self.rows.lock().unwrap();
        let n = rows.len();
        rows.clear();
        Ok(n)
    }
}

// ---------------------------------------------------------------------------
// In-memory PendingStore
// ---------------------------------------------------------------------------

pub struct MemoryPending<E> {
    rows: Mutex<BTreeMap<String, E>>,
    pub selects: AtomicUsize,
    pub writes: AtomicUsize,
    pub fail_writes: AtomicBool,
    /// Return every page twice over to exercise duplicate handling.
    pub duplicate_rows: AtomicBool,
}

impl<E: Syncable> MemoryPending<E> {
    pub fn new(entities: Vec<E>) -> Self {
        Self {
            rows: Mutex::new(
                entities
                    .into_iter()
                    .map(|e| (e.sync_key().to_string(), e))
                    .collect(),
            ),
            selects: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
            duplicate_rows: AtomicBool::new(false),
        }
    }

    pub fn status_of(&self, key: &str) -> Option<SyncStatus> {
        self.rows.lock().unwrap().get(key).map(|e| e.sync_status())
    }

    pub fn get(&self, key: &str) -> Option<E> {
        self.rows.lock().unwrap().get(key).cloned()
    }

    pub fn count(&self, status: SyncStatus) -> usize {
        self.rows
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.sync_status() == status)
            .count()
    }

    pub fn upsert(&self, entity: E) {
        self.rows
            .lock()
            .unwrap()
            .insert(entity.sync_key().to_string(), entity);
    }
}

#[async_trait]
impl<E: Syncable> PendingStore<E> for MemoryPending<E> {
    async fn select_sync_needed(&self, after: Option<&str>, limit: usize) -> Result<Vec<E>> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        let page: Vec<E> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.sync_status() == SyncStatus::SyncNeeded)
            .filter(|e| after.map_or(true, |after| e.sync_key() > after))
            .take(limit)
            .cloned()
            .collect();
        if self.duplicate_rows.load(Ordering::SeqCst) {
            let mut doubled = page.clone();
            doubled.extend(page);
            return Ok(doubled);
        }
        Ok(page)
    }

    async fn write_back(&self, entities: Vec<E>) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(store_error());
        }
        for entity in entities {
            self.upsert(entity);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Remote stubs
// ---------------------------------------------------------------------------

type Script = dyn Fn(&str) -> std::result::Result<(), ChatError> + Send + Sync;

/// Remote whose answer per key is decided by a script, tracking how many
/// submissions overlap.
pub struct ScriptedRemote {
    script: Box<Script>,
    delay: Duration,
    pub calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedRemote {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<(), ChatError> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            delay: Duration::from_millis(5),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn always_ok() -> Self {
        Self::new(|_| Ok(()))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, key: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|k| *k == key).count()
    }

    async fn answer(&self, key: &str) -> std::result::Result<(), ChatError> {
        self.calls.lock().unwrap().push(key.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.script)(key)
    }
}

#[async_trait]
impl<E: Syncable> Submitter<E> for ScriptedRemote {
    async fn submit(&self, entity: E) -> std::result::Result<E, ChatError> {
        let key = entity.sync_key().to_string();
        self.answer(&key).await?;
        Ok(entity)
    }
}

#[async_trait]
impl RemoteService for ScriptedRemote {
    async fn send_message(&self, message: Message) -> std::result::Result<Message, ChatError> {
        let key = message.id.clone();
        self.answer(&key).await?;
        Ok(Message {
            created_at: Some(chrono::Utc::now()),
            ..message
        })
    }

    async fn update_channel(&self, channel: Channel) -> std::result::Result<Channel, ChatError> {
        let key = channel.cid.clone();
        self.answer(&key).await?;
        Ok(channel)
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
