//! Core trait definitions

use crate::error::SessionResult;
use crate::types::SessionToken;
use async_trait::async_trait;

/// Per-token slot holding a single string value.
///
/// The token is the key; there is no hierarchy. Concurrent writers to the same
/// token race with last-writer-wins semantics, and operations on different
/// tokens never contend. Implementations that add per-token locking can do so
/// without changing callers.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stored value, or `None` when no record exists or the slot is empty
    async fn read(&self, token: &SessionToken) -> SessionResult<Option<String>>;

    /// Replace the record for `token` as a whole; readers see either the old or the new value
    async fn write(&self, token: &SessionToken, value: &str) -> SessionResult<()>;

    /// Remove the record. Removing a missing record succeeds.
    async fn delete(&self, token: &SessionToken) -> SessionResult<()>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}
