use std::sync::Arc;

use thiserror::Error;

use super::{DatabaseError, KeyValueStore};
use crate::models::User;
use crate::session::Session;

/// Raw bearer token
pub const TOKEN_KEY: &str = "auth-token";
/// JSON-serialized [`User`]
pub const USER_KEY: &str = "auth-user";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
    #[error("Persisted user is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Persisted session is incomplete (missing {missing})")]
    Incomplete { missing: &'static str },
}

/// The session as it lives in durable storage.
///
/// Token and user are always written and removed together.
#[derive(Clone)]
pub struct PersistedSession {
    store: Arc<dyn KeyValueStore>,
}

impl PersistedSession {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the persisted session.
    ///
    /// Returns `Ok(None)` when nothing is stored. An empty token counts as
    /// missing.
    pub fn read(&self) -> Result<Option<Session>, PersistError> {
        let token = self.store.get(TOKEN_KEY)?.filter(|t| !t.is_empty());
        let user = self.store.get(USER_KEY)?;

        match (token, user) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(PersistError::Incomplete { missing: USER_KEY }),
            (None, Some(_)) => Err(PersistError::Incomplete { missing: TOKEN_KEY }),
            (Some(token), Some(raw_user)) => {
                let user: User = serde_json::from_str(&raw_user)?;
                Ok(Some(Session { user, token }))
            }
        }
    }

    pub fn write(&self, session: &Session) -> Result<(), PersistError> {
        let user = serde_json::to_string(&session.user)?;
        self.store
            .set_many(&[(TOKEN_KEY, session.token.as_str()), (USER_KEY, user.as_str())])?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), DatabaseError> {
        self.store.remove_many(&[TOKEN_KEY, USER_KEY])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::testutil::{make_user, MemoryStore};

    fn setup() -> (Arc<MemoryStore>, PersistedSession) {
        let store = Arc::new(MemoryStore::default());
        let persisted = PersistedSession::new(store.clone());
        (store, persisted)
    }

    #[test]
    fn test_empty_store_reads_none() {
        let (_store, persisted) = setup();
        assert!(persisted.read().unwrap().is_none());
    }

    #[test]
    fn test_write_then_read() {
        let (store, persisted) = setup();
        let session = Session {
            user: make_user("u1", Role::Admin),
            token: "tok1".to_string(),
        };

        persisted.write(&session).unwrap();
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("tok1"));
        assert_eq!(persisted.read().unwrap(), Some(session));
    }

    #[test]
    fn test_half_written_session_is_incomplete() {
        let (store, persisted) = setup();
        store.set(TOKEN_KEY, "tok1").unwrap();
        assert!(matches!(
            persisted.read(),
            Err(PersistError::Incomplete { missing: USER_KEY })
        ));

        store.remove(TOKEN_KEY).unwrap();
        store.set(USER_KEY, r#"{"id":"u1"}"#).unwrap();
        assert!(matches!(
            persisted.read(),
            Err(PersistError::Incomplete { missing: TOKEN_KEY })
        ));
    }

    #[test]
    fn test_corrupt_user_is_parse_error() {
        let (store, persisted) = setup();
        store
            .set_many(&[(TOKEN_KEY, "tok1"), (USER_KEY, "{not json")])
            .unwrap();
        assert!(matches!(persisted.read(), Err(PersistError::Parse(_))));
    }

    #[test]
    fn test_clear_removes_both_keys() {
        let (store, persisted) = setup();
        store
            .set_many(&[(TOKEN_KEY, "tok1"), (USER_KEY, r#"{"id":"u1"}"#)])
            .unwrap();

        persisted.clear().unwrap();
        assert!(store.is_empty());
    }
}
