//! Reference-counted connection pool keyed by caller identity.
//!
//! UI toolkits are fond of double-invoking setup code; instead of a
//! process-wide singleton connection guard, callers acquire a handle under
//! an identity of their choosing. All handles with the same identity share
//! one underlying session; when the last handle drops, the entry is
//! retired and the connection closes with it.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::SessionClient;

struct PoolEntry {
    client: Arc<SessionClient>,
    refs: usize,
}

/// A process-local session pool keyed by caller-supplied identity.
#[derive(Clone, Default)]
pub struct ClientPool {
    entries: Arc<Mutex<HashMap<String, PoolEntry>>>,
}

impl ClientPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a handle for `identity`, connecting to `addr` only when no
    /// live handle with that identity exists yet.
    pub async fn acquire(&self, identity: &str, addr: &str) -> Result<PoolHandle> {
        if let Some(handle) = self.try_share(identity) {
            return Ok(handle);
        }

        // Connect outside the lock; a concurrent acquire for the same
        // identity may win the race, in which case the later insert joins
        // the existing entry and this connection is simply dropped.
        let client = Arc::new(SessionClient::connect(addr).await?);

        let mut entries = self.entries.lock().expect("pool lock poisoned");
        let entry = entries
            .entry(identity.to_string())
            .and_modify(|entry| entry.refs += 1)
            .or_insert(PoolEntry { client, refs: 1 });

        tracing::debug!(identity, refs = entry.refs, "pool handle acquired");
        Ok(PoolHandle {
            pool: self.clone(),
            identity: identity.to_string(),
            client: entry.client.clone(),
        })
    }

    /// Number of distinct live connections in the pool.
    pub fn active_connections(&self) -> usize {
        self.entries.lock().expect("pool lock poisoned").len()
    }

    fn try_share(&self, identity: &str) -> Option<PoolHandle> {
        let mut entries = self.entries.lock().expect("pool lock poisoned");
        let entry = entries.get_mut(identity)?;
        entry.refs += 1;
        Some(PoolHandle {
            pool: self.clone(),
            identity: identity.to_string(),
            client: entry.client.clone(),
        })
    }

    fn release(&self, identity: &str) {
        let mut entries = self.entries.lock().expect("pool lock poisoned");
        if let Some(entry) = entries.get_mut(identity) {
            entry.refs -= 1;
            if entry.refs == 0 {
                entries.remove(identity);
                tracing::debug!(identity, "pool entry retired");
            }
        }
    }
}

/// A counted reference to a pooled session.
///
/// Dereferences to [`SessionClient`]; dropping the last handle for an
/// identity retires the pooled connection.
pub struct PoolHandle {
    pool: ClientPool,
    identity: String,
    client: Arc<SessionClient>,
}

impl PoolHandle {
    /// The shared session this handle refers to.
    pub fn session(&self) -> &Arc<SessionClient> {
        &self.client
    }
}

impl Deref for PoolHandle {
    type Target = SessionClient;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

impl Drop for PoolHandle {
    fn drop(&mut self) {
        self.pool.release(&self.identity);
    }
}
