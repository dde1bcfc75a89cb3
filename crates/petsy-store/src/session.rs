//! # Session Validation
//!
//! Checks a rehydrated token against the backend before the store trusts it.
//!
//! ## Startup Flow
//! ```text
//! load_stored_auth()
//!     │
//!     ├── no token ─────────────────────────────► signed out
//!     │
//!     ▼
//! GET {backend}/api/auth/me   Authorization: Bearer <token>
//!     │
//!     ├── 2xx + application/json User ──────────► signed in, user restored
//!     ├── 401 / 403 / non-JSON or bad body ─────► token removed, signed out
//!     └── network error / 5xx ──────────────────► token kept, no user yet
//! ```

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;
use url::Url;

use petsy_core::User;

use crate::error::{SessionError, StoreError, StoreResult};

/// Asks some authority whether a bearer token still identifies a user.
#[async_trait]
pub trait SessionValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<User, SessionError>;
}

// =============================================================================
// HTTP Validator
// =============================================================================

/// Validates tokens with `GET /api/auth/me` on the REST backend.
#[derive(Debug, Clone)]
pub struct HttpSessionValidator {
    client: reqwest::Client,
    me_url: Url,
}

impl HttpSessionValidator {
    /// ## Example
    /// ```rust,ignore
    /// let validator = HttpSessionValidator::new("https://api.petsy.app", Duration::from_secs(10))?;
    /// ```
    ///
    /// A path on `backend_url` is kept: `https://host/petsy` validates
    /// against `https://host/petsy/api/auth/me`.
    pub fn new(backend_url: &str, timeout: Duration) -> StoreResult<Self> {
        let mut base = Url::parse(backend_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let me_url = base.join("api/auth/me")?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(HttpSessionValidator { client, me_url })
    }

    pub fn endpoint(&self) -> &Url {
        &self.me_url
    }
}

#[async_trait]
impl SessionValidator for HttpSessionValidator {
    async fn validate(&self, token: &str) -> Result<User, SessionError> {
        debug!(url = %self.me_url, "Validating stored session");

        let response = self
            .client
            .get(self.me_url.clone())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SessionError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let is_json = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|v| v.contains("application/json"));
                if !is_json {
                    return Err(SessionError::InvalidResponse(
                        "response is not application/json".into(),
                    ));
                }

                response
                    .json::<User>()
                    .await
                    .map_err(|e| SessionError::InvalidResponse(e.to_string()))
            }

            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                Err(SessionError::Rejected {
                    status: status.as_u16(),
                })
            }

            status => Err(SessionError::Unavailable(format!("HTTP {}", status))),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
