//! # parley-offline
//!
//! Offline-first cache and synchronization layer of the Parley chat SDK.
//!
//! Domain code writes through per-entity repositories ([`UserRepository`],
//! [`MessageRepository`], [`ChannelRepository`]) that keep a bounded LRU
//! cache in front of the SQLite store.  Entities whose local changes have not
//! reached the server carry `SyncStatus::SyncNeeded`; a [`RetryLoop`] per
//! entity type drains them in pages and reclassifies each one from the remote
//! outcome.  [`ChatContext`] wires all of it together.

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod listener;
pub mod logging;
pub mod remote;
pub mod repository;
pub mod retry;
pub mod service;
pub mod sync;

pub use cache::BoundedCache;
pub use config::SyncConfig;
pub use context::ChatContext;
pub use error::OfflineError;
pub use listener::AttachmentSendListener;
pub use remote::{ChannelSubmitter, MessageSubmitter, RemoteService, Submitter};
pub use repository::{ChannelRepository, MessageRepository, UserRepository};
pub use retry::{PendingStore, RetryConfig, RetryLoop, RetryReport};
pub use service::{SyncEntity, SyncReport, SyncService, SyncState};
pub use sync::{DefaultErrorClassifier, ErrorClassifier, SyncOutcome, Syncable};
