//! # petsy-store: Session & Cart Store for Petsy
//!
//! Holds the signed-in session, device preferences, pet selection and the
//! shopping cart behind a single actor, and keeps the persisted subset in
//! device storage.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Session Store Architecture                       │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 StoreActor (single tokio task)                   │  │
//! │  │                                                                  │  │
//! │  │  Owns AppState, applies commands in arrival order               │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ KeyValueStorage│  │SessionValidator│  │  watch<AppState>       │    │
//! │  │                │  │                │  │                        │    │
//! │  │ auth_token     │  │ GET            │  │ Snapshot published     │    │
//! │  │ language       │  │ /api/auth/me   │  │ after every command    │    │
//! │  │ theme_mode     │  │ on rehydration │  │                        │    │
//! │  │ cart           │  │                │  │                        │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`actor`] - `StoreActor`, `StoreHandle`, `StoreBuilder`
//! - [`config`] - Storage backend, backend URL, timeouts (TOML + env)
//! - [`error`] - Store error types and screen-facing error codes
//! - [`session`] - Token validation against the REST backend
//! - [`state`] - The `AppState` snapshot
//!
//! ## Usage
//!
//! ```rust,ignore
//! use petsy_store::{StoreBuilder, StoreConfig};
//! use petsy_core::{Money, NewCartItem};
//!
//! let config = StoreConfig::load_or_default(None);
//! let store = StoreBuilder::from_config(&config).await?.spawn()?;
//!
//! // Must run once at startup; screens wait for is_loading == false
//! store.load_stored_auth().await?;
//!
//! store.add_to_cart(NewCartItem::new("p1", "Dry Food 2kg", Money::from_cents(999))).await?;
//! println!("Total: {}", store.snapshot().cart_total);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod actor;
pub mod config;
pub mod error;
pub mod session;
pub mod state;

// =============================================================================
// Re-exports
// =============================================================================

pub use actor::{StoreActor, StoreBuilder, StoreHandle};
pub use config::{ActorSettings, SessionSettings, StorageBackend, StorageSettings, StoreConfig};
pub use error::{ErrorCode, ErrorPayload, SessionError, StoreError, StoreResult};
pub use session::{HttpSessionValidator, SessionValidator};
pub use state::AppState;
