//! # petsy-storage: On-Device Key-Value Storage
//!
//! The persistence side of the session store: a small async key-value
//! trait and the backends that implement it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Petsy Persistence                                │
//! │                                                                         │
//! │  StoreActor (petsy-store)                                              │
//! │       │  get / set / remove                                            │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 petsy-storage (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ KeyValue      │    │ MemoryStorage │    │ KvRepository │  │   │
//! │  │   │ Storage trait │◄───│ (HashMap)     │    │ (SQLite)     │  │   │
//! │  │   │ (traits.rs)   │◄───┴───────────────┴────│ pool.rs      │  │   │
//! │  │   └───────────────┘                         └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   <data dir>/petsy.db   (kv_store table)                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`traits`] - The `KeyValueStorage` trait
//! - [`keys`] - Key names used by the store
//! - [`memory`] - In-memory backend
//! - [`pool`] - SQLite pool creation and configuration
//! - [`repository`] - SQLite `kv_store` repository
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use petsy_storage::{Database, DbConfig, KeyValueStorage};
//!
//! let db = Database::new(DbConfig::new("./petsy.db")).await?;
//! let storage: Arc<dyn KeyValueStorage> = Arc::new(db.kv());
//! storage.set("language", "ar").await?;
//! ```

pub mod error;
pub mod keys;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStorage;
pub use pool::{Database, DbConfig};
pub use repository::KvRepository;
pub use traits::KeyValueStorage;
