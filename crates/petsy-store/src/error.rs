//! # Store Error Types
//!
//! What screens see when a store command fails.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         StoreError                                      │
//! │                                                                         │
//! │  Persistence          Domain             Session / Config / Runtime    │
//! │  ───────────          ──────             ───────────────────────────   │
//! │  Storage(..)          Core(..)           Session(SessionError)         │
//! │  StorageTimeout                          InvalidConfig / InvalidUrl    │
//! │                                          ConfigLoadFailed / SaveFailed │
//! │                                          MailboxClosed                 │
//! │                                                                         │
//! │  Every variant maps to a stable ErrorCode via StoreError::code().      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! Screens receive an [`ErrorPayload`]:
//! ```json
//! { "code": "CART_LIMIT", "message": "Cart cannot have more than 100 items" }
//! ```

use petsy_core::{CoreError, ValidationError};
use petsy_storage::StorageError;
use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Store Error
// =============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    // =========================================================================
    // Persistence Errors
    // =========================================================================
    /// The storage backend rejected a read or write.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The storage backend did not answer in time.
    #[error("Storage {operation} on '{key}' timed out after {timeout_ms} ms")]
    StorageTimeout {
        operation: &'static str,
        key: &'static str,
        timeout_ms: u64,
    },

    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// Cart rule or input validation failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Session Errors
    // =========================================================================
    #[error("Session validation failed: {0}")]
    Session(#[from] SessionError),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Runtime Errors
    // =========================================================================
    /// The store actor has stopped; the handle is no longer usable.
    #[error("Session store is not running")]
    MailboxClosed,
}

// =============================================================================
// Session Error
// =============================================================================

/// Outcome of a failed `/api/auth/me` check.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backend refused the token (401/403).
    #[error("Token rejected by backend (HTTP {status})")]
    Rejected { status: u16 },

    /// The backend answered 2xx but the body was not a user record.
    #[error("Unexpected session response: {0}")]
    InvalidResponse(String),

    /// Network failure or a non-auth error status (5xx, 404, ...).
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl SessionError {
    /// True when the stored token must be discarded.
    ///
    /// ```text
    /// Rejected         → drop token (definitely invalid)
    /// InvalidResponse  → drop token (cannot restore a user from it)
    /// Unavailable      → keep token (may still be valid once online)
    /// ```
    pub fn invalidates_token(&self) -> bool {
        matches!(
            self,
            SessionError::Rejected { .. } | SessionError::InvalidResponse(_)
        )
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        StoreError::Core(CoreError::Validation(err))
    }
}

impl From<url::ParseError> for StoreError {
    fn from(err: url::ParseError) -> Self {
        StoreError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        StoreError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(err: toml::ser::Error) -> Self {
        StoreError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Codes (for screens)
// =============================================================================

/// Machine-readable error codes.
///
/// ## Usage in Screens
/// ```typescript
/// try {
///   await store.addToCart(item);
/// } catch (e) {
///   switch (e.code) {
///     case 'CART_LIMIT':
///       toast(t('cart.limitReached'));
///       break;
///     case 'STORAGE_ERROR':
///     case 'STORAGE_TIMEOUT':
///       toast(t('errors.saveFailed'));
///       break;
///   }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    StorageError,
    StorageTimeout,
    /// Line, quantity or total cap reached.
    CartLimit,
    ValidationError,
    /// Stored data could not be decoded or encoded.
    CorruptData,
    SessionError,
    ConfigError,
    /// Store actor stopped.
    Unavailable,
}

impl StoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            StoreError::Storage(_) => ErrorCode::StorageError,
            StoreError::StorageTimeout { .. } => ErrorCode::StorageTimeout,
            StoreError::Core(core) => match core {
                CoreError::CartTooLarge { .. }
                | CoreError::QuantityTooLarge { .. }
                | CoreError::TotalOverflow => ErrorCode::CartLimit,
                CoreError::CorruptCart(_) | CoreError::Encode(_) => ErrorCode::CorruptData,
                CoreError::Validation(_) => ErrorCode::ValidationError,
            },
            StoreError::Session(_) => ErrorCode::SessionError,
            StoreError::InvalidConfig(_)
            | StoreError::InvalidUrl(_)
            | StoreError::ConfigLoadFailed(_)
            | StoreError::ConfigSaveFailed(_) => ErrorCode::ConfigError,
            StoreError::MailboxClosed => ErrorCode::Unavailable,
        }
    }

    /// Returns true if this error came from the persistence layer.
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            StoreError::Storage(_) | StoreError::StorageTimeout { .. }
        )
    }

    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Error as delivered to a screen.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
}
