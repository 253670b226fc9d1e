//! Process-local session store

use async_trait::async_trait;
use sesscgi_core::{storage_error, SessionResult, SessionStore, SessionToken};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

/// In-memory map from token to value. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<RwLock<HashMap<SessionToken, String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> SessionResult<usize> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> SessionResult<bool> {
        Ok(self.len()? == 0)
    }
}

fn poisoned() -> sesscgi_core::SessionError {
    storage_error!("Session map lock poisoned", "memory_store")
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn read(&self, token: &SessionToken) -> SessionResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(token).filter(|v| !v.is_empty()).cloned())
    }

    async fn write(&self, token: &SessionToken, value: &str) -> SessionResult<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(token.clone(), value.to_string());
        Ok(())
    }

    async fn delete(&self, token: &SessionToken) -> SessionResult<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(token);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
