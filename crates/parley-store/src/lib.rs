//! # parley-store
//!
//! Durable local storage for the Parley offline layer, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle wrapping a
//! `rusqlite::Connection` with typed batch helpers for users, channels and
//! messages, and an async [`SqliteStore`] that implements the per-entity DAO
//! traits on top of it by running every query on tokio's blocking pool.

pub mod channels;
pub mod codec;
pub mod dao;
pub mod database;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod users;

mod error;

pub use dao::{ChannelDao, MessageDao, SqliteStore, UserDao};
pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
