//! # parley-shared
//!
//! Types shared by every Parley crate: entity identifiers, the
//! synchronization status attached to locally mutated entities, and the
//! error taxonomy returned by the remote chat service.

pub mod constants;
pub mod error;
pub mod sync;
pub mod types;

pub use error::ChatError;
pub use sync::SyncStatus;
pub use types::ChannelCid;
