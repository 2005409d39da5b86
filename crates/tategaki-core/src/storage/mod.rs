//! Project persistence backends
//!
//! Two interchangeable backends back the store: the primary structured
//! SQLite database and a flat-file fallback that keeps the whole project
//! collection as one JSON blob. Backend selection happens once, in
//! `Store::open`.

pub mod error;
pub mod fallback;
pub mod sqlite;

pub use error::{StorageError, StorageResult};
pub use fallback::FlatFileBackend;
pub use sqlite::SqliteBackend;
