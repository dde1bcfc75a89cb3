//! # Storage Trait
//!
//! The seam between the session store and whatever actually keeps bytes on
//! the device.
//!
//! ```text
//!                 Arc<dyn KeyValueStorage>
//!                          │
//!          ┌───────────────┼────────────────┐
//!          ▼               ▼                ▼
//!   MemoryStorage     KvRepository     (test fakes)
//!   (HashMap)         (SQLite)
//! ```

use async_trait::async_trait;

use crate::error::StorageResult;

/// Async string key-value storage.
///
/// Values are UTF-8 text. A `set` always replaces the whole value for the
/// key; there are no partial updates.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Returns the value for a key, or `None` if it was never set or has
    /// been removed.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Inserts or replaces the value for a key.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes a key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// Short backend name for logs (`memory`, `sqlite`).
    fn backend_name(&self) -> &'static str;
}
