use redb::{Database as RedbDatabase, ReadTransaction, ReadableTableMetadata, WriteTransaction};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::tables::*;
use super::KeyValueStore;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Redb(#[from] redb::Error),
    #[error("Database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),
    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),
    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),
    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),
}

#[derive(Clone)]
pub struct Database {
    db: Arc<RedbDatabase>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let db_path = data_dir.as_ref().join("helpdesk-session.redb");
        let db = RedbDatabase::create(db_path)?;

        // Create the table up front so read transactions never miss it
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(LOCAL_STORAGE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a read transaction
    pub fn begin_read(&self) -> Result<ReadTransaction, DatabaseError> {
        Ok(self.db.begin_read()?)
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> Result<WriteTransaction, DatabaseError> {
        Ok(self.db.begin_write()?)
    }

    /// Number of stored keys
    pub fn len(&self) -> Result<u64, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(LOCAL_STORAGE)?;
        Ok(table.len()?)
    }

    pub fn is_empty(&self) -> Result<bool, DatabaseError> {
        Ok(self.len()? == 0)
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(LOCAL_STORAGE)?;

        match table.get(key)? {
            Some(data) => Ok(Some(data.value().to_string())),
            None => Ok(None),
        }
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(LOCAL_STORAGE)?;
            for (key, value) in entries {
                table.insert(*key, *value)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(LOCAL_STORAGE)?;
            for key in keys {
                table.remove(*key)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::setup_db;

    #[test]
    fn test_set_get_remove() {
        let (db, _temp) = setup_db();

        assert!(db.get("auth-token").unwrap().is_none());
        db.set("auth-token", "tok1").unwrap();
        assert_eq!(db.get("auth-token").unwrap().as_deref(), Some("tok1"));

        db.set("auth-token", "tok2").unwrap();
        assert_eq!(db.get("auth-token").unwrap().as_deref(), Some("tok2"));

        db.remove("auth-token").unwrap();
        assert!(db.get("auth-token").unwrap().is_none());
        // Removing a missing key is not an error
        db.remove("auth-token").unwrap();
    }

    #[test]
    fn test_set_many_and_remove_many() {
        let (db, _temp) = setup_db();

        db.set_many(&[("a", "1"), ("b", "2")]).unwrap();
        assert_eq!(db.len().unwrap(), 2);

        db.remove_many(&["a", "b"]).unwrap();
        assert!(db.is_empty().unwrap());
    }

    #[test]
    fn test_values_survive_reopen() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        {
            let db = Database::open(temp_dir.path()).unwrap();
            db.set("auth-user", r#"{"id":"u1"}"#).unwrap();
        }

        let db = Database::open(temp_dir.path()).unwrap();
        assert_eq!(db.get("auth-user").unwrap().as_deref(), Some(r#"{"id":"u1"}"#));
    }
}
