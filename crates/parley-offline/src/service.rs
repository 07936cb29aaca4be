//! On-demand and scheduled sync passes with observable progress.
//!
//! Progress is published as immutable [`SyncState`] snapshots on a watch
//! channel: a new subscriber immediately sees the latest state and then every
//! later one.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parley_store::{Channel, Message};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::retry::{RetryLoop, RetryReport};

/// Shortest period accepted by [`SyncService::spawn_periodic`].
const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncEntity {
    Channels,
    Messages,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub channels: RetryReport,
    pub messages: RetryReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SyncState {
    Idle,
    Running { entity: SyncEntity },
    Completed { report: SyncReport, at: DateTime<Utc> },
    Failed { error: String, at: DateTime<Utc> },
}

pub struct SyncService {
    channels: RetryLoop<Channel>,
    messages: RetryLoop<Message>,
    state: watch::Sender<SyncState>,
    pass_lock: Mutex<()>,
}

impl SyncService {
    pub fn new(channels: RetryLoop<Channel>, messages: RetryLoop<Message>) -> Self {
        let (state, _) = watch::channel(SyncState::Idle);
        Self {
            channels,
            messages,
            state,
            pass_lock: Mutex::new(()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Run one pass: channels first so that messages never reference a
    /// channel the server has not seen, then messages.
    ///
    /// Returns `Ok(None)` without doing anything if another pass is running.
    /// If the returned future is dropped mid-pass the state falls back to
    /// [`SyncState::Idle`].
    pub async fn sync_now(&self) -> Result<Option<SyncReport>> {
        let Ok(_guard) = self.pass_lock.try_lock() else {
            tracing::debug!("sync pass already running, skipping");
            return Ok(None);
        };

        let mut running = RunningState::new(&self.state);
        let result = self.run_pass().await;
        running.finish();

        match result {
            Ok(report) => {
                self.state.send_replace(SyncState::Completed {
                    report,
                    at: Utc::now(),
                });
                Ok(Some(report))
            }
            Err(e) => {
                tracing::error!(error = %e, "sync pass failed");
                self.state.send_replace(SyncState::Failed {
                    error: e.to_string(),
                    at: Utc::now(),
                });
                Err(e)
            }
        }
    }

    async fn run_pass(&self) -> Result<SyncReport> {
        self.state.send_replace(SyncState::Running {
            entity: SyncEntity::Channels,
        });
        let channels = self.channels.run().await?;

        self.state.send_replace(SyncState::Running {
            entity: SyncEntity::Messages,
        });
        let messages = self.messages.run().await?;

        Ok(SyncReport { channels, messages })
    }

    /// Run [`sync_now`](Self::sync_now) every `interval` until the returned
    /// handle is aborted.  Failed passes are logged and retried on the next
    /// tick.  Periods below one millisecond are raised to one millisecond.
    pub fn spawn_periodic(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let period = interval.max(MIN_PERIOD);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.sync_now().await {
                    tracing::warn!(error = %e, "scheduled sync failed");
                }
            }
        })
    }
}

/// Resets the published state to `Idle` unless the pass reached its end.
struct RunningState<'a> {
    state: &'a watch::Sender<SyncState>,
    finished: bool,
}

impl<'a> RunningState<'a> {
    fn new(state: &'a watch::Sender<SyncState>) -> Self {
        Self {
            state,
            finished: false,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

impl Drop for RunningState<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("sync pass cancelled");
            self.state.send_replace(SyncState::Idle);
        }
    }
}
