//! Key-value persistence for planwise.
//!
//! The domain never touches storage directly; it goes through the
//! [`KeyValueStore`] collaborator, backed by SQLite in production and by an
//! in-memory map in tests.

mod error;
pub mod models;
mod pool;
pub mod stores;

pub use error::*;
pub use models::KvEntryRow;
pub use pool::*;
pub use stores::*;
