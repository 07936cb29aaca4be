//! Paged resubmission of entities waiting in `SyncNeeded`.
//!
//! Each pass:
//! 1. selects up to `page_size` pending entities whose key sorts after the
//!    last key seen so far in this pass (stable key order),
//! 2. submits the whole page concurrently and waits for every submission,
//! 3. writes the reclassified page back as one batch,
//! 4. stops on an empty or short page, otherwise moves the cursor past the
//!    page's last key and selects the next page.
//!
//! The cursor means an entity is submitted at most once per pass, and a page
//! that stays `SyncNeeded` never hides the keys behind it.  Only one page is
//! ever in flight.  Dropping the pass future cancels it at the next await;
//! entities of an unfinished page stay `SyncNeeded`.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use parley_shared::SyncStatus;
use parley_store::{Channel, Message, Result};
use serde::Serialize;

use crate::remote::Submitter;
use crate::repository::{ChannelRepository, MessageRepository};
use crate::sync::{ErrorClassifier, SyncOutcome, Syncable};

/// Store side of the retry loop.
#[async_trait]
pub trait PendingStore<E>: Send + Sync {
    /// Up to `limit` entities in `SyncNeeded` whose key sorts strictly after
    /// `after`, in ascending key order.
    async fn select_sync_needed(&self, after: Option<&str>, limit: usize) -> Result<Vec<E>>;

    /// Persist one reclassified page.
    async fn write_back(&self, entities: Vec<E>) -> Result<()>;
}

#[async_trait]
impl PendingStore<Message> for MessageRepository {
    async fn select_sync_needed(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Message>> {
        self.select_by_sync_status_after(SyncStatus::SyncNeeded, after, limit)
            .await
    }

    async fn write_back(&self, messages: Vec<Message>) -> Result<()> {
        self.insert(messages, true).await
    }
}

#[async_trait]
impl PendingStore<Channel> for ChannelRepository {
    async fn select_sync_needed(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Channel>> {
        self.select_by_sync_status_after(SyncStatus::SyncNeeded, after, limit)
            .await
    }

    async fn write_back(&self, channels: Vec<Channel>) -> Result<()> {
        self.insert(channels).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub page_size: usize,
    /// Stop a pass after this many pages even if work remains.
    pub max_pages: Option<usize>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            page_size: parley_shared::constants::DEFAULT_RETRY_PAGE_SIZE,
            max_pages: None,
        }
    }
}

/// Tally of one retry pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RetryReport {
    pub pages: usize,
    pub submitted: usize,
    pub completed: usize,
    pub failed_permanently: usize,
    pub still_pending: usize,
}

impl RetryReport {
    fn absorb<E>(&mut self, outcome: &SyncOutcome<E>) {
        match outcome {
            SyncOutcome::Completed(_) => self.completed += 1,
            SyncOutcome::FailedPermanently(_) => self.failed_permanently += 1,
            SyncOutcome::Pending(_) => self.still_pending += 1,
        }
    }
}

pub struct RetryLoop<E: Syncable> {
    name: &'static str,
    store: Arc<dyn PendingStore<E>>,
    submitter: Arc<dyn Submitter<E>>,
    classifier: Arc<dyn ErrorClassifier>,
    config: RetryConfig,
}

impl<E: Syncable> RetryLoop<E> {
    /// `name` labels the loop in logs ("messages", "channels").
    pub fn new(
        name: &'static str,
        store: Arc<dyn PendingStore<E>>,
        submitter: Arc<dyn Submitter<E>>,
        classifier: Arc<dyn ErrorClassifier>,
        config: RetryConfig,
    ) -> Self {
        let config = RetryConfig {
            page_size: config.page_size.max(1),
            ..config
        };
        Self {
            name,
            store,
            submitter,
            classifier,
            config,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Drain pending entities.  Store errors abort the pass.
    pub async fn run(&self) -> Result<RetryReport> {
        let limit = self.config.page_size;
        let mut report = RetryReport::default();
        let mut cursor: Option<String> = None;

        loop {
            if self.config.max_pages.is_some_and(|max| report.pages >= max) {
                tracing::info!(loop_name = self.name, pages = report.pages, "page budget exhausted");
                break;
            }

            let page = self
                .store
                .select_sync_needed(cursor.as_deref(), limit)
                .await?;
            tracing::debug!(loop_name = self.name, found = page.len(), "selected pending page");
            if page.is_empty() {
                break;
            }
            let fetched = page.len();
            cursor = page.iter().map(|entity| entity.sync_key()).max().map(str::to_owned);

            let page = dedup_by_key(page);
            report.pages += 1;
            report.submitted += page.len();

            let results = join_all(page.into_iter().map(|entity| {
                let submitter = Arc::clone(&self.submitter);
                async move {
                    let result = submitter.submit(entity.clone()).await;
                    (entity, result)
                }
            }))
            .await;

            let mut page_report = RetryReport::default();
            let resolved: Vec<E> = results
                .into_iter()
                .map(|(entity, result)| {
                    let outcome = SyncOutcome::resolve(entity, result, self.classifier.as_ref());
                    page_report.absorb(&outcome);
                    outcome.into_entity()
                })
                .collect();

            self.store.write_back(resolved).await?;
            tracing::debug!(
                loop_name = self.name,
                completed = page_report.completed,
                failed = page_report.failed_permanently,
                pending = page_report.still_pending,
                "page written back"
            );

            report.completed += page_report.completed;
            report.failed_permanently += page_report.failed_permanently;
            report.still_pending += page_report.still_pending;

            if fetched < limit {
                break;
            }
        }

        tracing::info!(
            loop_name = self.name,
            pages = report.pages,
            completed = report.completed,
            failed = report.failed_permanently,
            pending = report.still_pending,
            "retry pass finished"
        );
        Ok(report)
    }
}

/// Keep the first occurrence of each key.
fn dedup_by_key<E: Syncable>(page: Vec<E>) -> Vec<E> {
    let mut seen = HashSet::with_capacity(page.len());
    page.into_iter()
        .filter(|entity| seen.insert(entity.sync_key().to_owned()))
        .collect()
}
