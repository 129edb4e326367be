//! Transient per-session storage
//!
//! Stand-in for the browser's per-tab session storage: a string key/value
//! store of JSON-serialized records, scoped to a session id and dropped
//! after an idle TTL. Reading a missing session or key yields `None`,
//! never an error.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Key holding the pending order between capture and checkout
pub const KEY_ORDER_DATA: &str = "orderData";

/// Key holding the order while the customer is away at a payment link
pub const KEY_PENDING_ORDER: &str = "pendingOrder";

/// Key holding post-payment confirmation bookkeeping
pub const KEY_CONFIRMATION: &str = "confirmationData";

#[derive(Debug)]
struct Session {
    values: HashMap<String, String>,
    last_seen: Instant,
}

impl Session {
    fn new() -> Self {
        Self {
            values: HashMap::new(),
            last_seen: Instant::now(),
        }
    }
}

/// Session-scoped key/value store with idle expiry
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Serialize and store a value under a key in the session
    pub async fn put<T: Serialize>(&self, session_id: Uuid, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)
            .map_err(|e| Error::Internal(format!("Serialize {}: {}", key, e)))?;
        let mut sessions = self.sessions.write().await;
        prune_expired(&mut sessions, self.ttl);
        let session = sessions.entry(session_id).or_insert_with(Session::new);
        session.last_seen = Instant::now();
        session.values.insert(key.to_string(), json);
        Ok(())
    }

    /// Read a value without removing it
    pub async fn get<T: DeserializeOwned>(&self, session_id: Uuid, key: &str) -> Option<T> {
        let mut sessions = self.sessions.write().await;
        prune_expired(&mut sessions, self.ttl);
        let session = sessions.get_mut(&session_id)?;
        session.last_seen = Instant::now();
        let json = session.values.get(key)?;
        serde_json::from_str(json).ok()
    }

    /// Remove a key from the session, returning its value
    pub async fn take<T: DeserializeOwned>(&self, session_id: Uuid, key: &str) -> Option<T> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&session_id)?;
        session.last_seen = Instant::now();
        let json = session.values.remove(key)?;
        serde_json::from_str(&json).ok()
    }

    /// Remove a key from the session
    pub async fn remove(&self, session_id: Uuid, key: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(&session_id) {
            session.values.remove(key);
        }
    }

    /// Number of live sessions (expired ones excluded)
    pub async fn session_count(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        prune_expired(&mut sessions, self.ttl);
        sessions.len()
    }
}

fn prune_expired(sessions: &mut HashMap<Uuid, Session>, ttl: Duration) {
    sessions.retain(|_, session| session.last_seen.elapsed() < ttl);
}
