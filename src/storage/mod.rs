pub mod db;
pub mod session_store;
mod tables;

pub use db::{Database, DatabaseError};
pub use session_store::{PersistError, PersistedSession, TOKEN_KEY, USER_KEY};
pub use tables::*;

/// Durable string key-value storage backing the persisted session.
///
/// `set_many` and `remove_many` must be all-or-nothing so the token and the
/// user record never diverge on disk.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError>;

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), DatabaseError>;

    fn remove_many(&self, keys: &[&str]) -> Result<(), DatabaseError>;

    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.set_many(&[(key, value)])
    }

    fn remove(&self, key: &str) -> Result<(), DatabaseError> {
        self.remove_many(&[key])
    }
}
