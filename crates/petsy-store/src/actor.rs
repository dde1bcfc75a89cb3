//! # Store Actor
//!
//! Single writer for all session and cart state.
//!
//! ## Actor Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Store Actor Architecture                         │
//! │                                                                         │
//! │  Screen A ─┐                                                            │
//! │  Screen B ─┼─► StoreHandle ──mpsc(Command + oneshot reply)──┐          │
//! │  Screen C ─┘        ▲                                       │          │
//! │                     │                                       ▼          │
//! │                     │                        ┌──────────────────────┐  │
//! │                     │                        │      StoreActor      │  │
//! │                     │                        │  (one tokio task)    │  │
//! │                     │                        │                      │  │
//! │                     │                        │  1. validate         │  │
//! │                     │                        │  2. write storage ───┼──┼─► KeyValueStorage
//! │                     │                        │  3. apply in memory  │  │
//! │                     │                        │  4. publish snapshot │  │
//! │                     │                        └──────────┬───────────┘  │
//! │                     │                                   │              │
//! │                     └────────── watch<AppState> ◄───────┘              │
//! │                                                                         │
//! │  Commands run strictly in arrival order; no two ever interleave.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Policy
//! - Mutators write storage first and only then change memory. A failed or
//!   timed-out write is logged at `error`, leaves the state untouched and is
//!   returned to the caller.
//! - `logout` is the exception: memory is always cleared, and a storage
//!   failure is still returned afterwards.
//! - `load_stored_auth` never fails. Unreadable values fall back to defaults
//!   and are logged at `warn`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use petsy_core::validation::validate_token;
use petsy_core::{Cart, Locale, Money, NewCartItem, Pet, ThemeMode, User};
use petsy_storage::{keys, KeyValueStorage};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::session::{HttpSessionValidator, SessionValidator};
use crate::state::AppState;

type Reply<T> = oneshot::Sender<StoreResult<T>>;

// =============================================================================
// Commands
// =============================================================================

/// Messages accepted by the actor's mailbox.
enum Command {
    SetUser {
        user: Option<User>,
        reply: Reply<()>,
    },
    SetToken {
        token: Option<String>,
        reply: Reply<()>,
    },
    SetLanguage {
        language: Locale,
        reply: Reply<()>,
    },
    SetThemeMode {
        mode: ThemeMode,
        reply: Reply<()>,
    },
    SetDrawerOpen {
        open: bool,
        reply: Reply<()>,
    },
    SetMyPets {
        pets: Vec<Pet>,
        reply: Reply<()>,
    },
    SetSelectedPet {
        pet: Option<Pet>,
        reply: Reply<()>,
    },
    Logout {
        reply: Reply<()>,
    },
    LoadStoredAuth {
        reply: Reply<()>,
    },
    AddToCart {
        item: NewCartItem,
        reply: Reply<i64>,
    },
    RemoveFromCart {
        product_id: String,
        reply: Reply<()>,
    },
    UpdateCartQuantity {
        product_id: String,
        quantity: i64,
        reply: Reply<()>,
    },
    ClearCart {
        reply: Reply<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::SetUser { .. } => "set_user",
            Command::SetToken { .. } => "set_token",
            Command::SetLanguage { .. } => "set_language",
            Command::SetThemeMode { .. } => "set_theme_mode",
            Command::SetDrawerOpen { .. } => "set_drawer_open",
            Command::SetMyPets { .. } => "set_my_pets",
            Command::SetSelectedPet { .. } => "set_selected_pet",
            Command::Logout { .. } => "logout",
            Command::LoadStoredAuth { .. } => "load_stored_auth",
            Command::AddToCart { .. } => "add_to_cart",
            Command::RemoveFromCart { .. } => "remove_from_cart",
            Command::UpdateCartQuantity { .. } => "update_cart_quantity",
            Command::ClearCart { .. } => "clear_cart",
            Command::Shutdown { .. } => "shutdown",
        }
    }
}

// =============================================================================
// Store Actor
// =============================================================================

/// Owns the [`AppState`] and the storage backend.
pub struct StoreActor {
    state: AppState,
    storage: Arc<dyn KeyValueStorage>,
    validator: Option<Arc<dyn SessionValidator>>,
    storage_timeout: Duration,
    commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<AppState>,
}

impl StoreActor {
    /// Main loop. Ends on `Shutdown` or when every handle is dropped.
    async fn run(mut self) {
        info!(
            backend = self.storage.backend_name(),
            timeout_ms = self.storage_timeout.as_millis() as u64,
            "Session store started"
        );

        while let Some(command) = self.commands.recv().await {
            debug!(command = command.name(), "Processing store command");

            match command {
                Command::SetUser { user, reply } => {
                    self.set_user(user);
                    let _ = reply.send(Ok(()));
                }
                Command::SetToken { token, reply } => {
                    let _ = reply.send(self.set_token(token).await);
                }
                Command::SetLanguage { language, reply } => {
                    let _ = reply.send(self.set_language(language).await);
                }
                Command::SetThemeMode { mode, reply } => {
                    let _ = reply.send(self.set_theme_mode(mode).await);
                }
                Command::SetDrawerOpen { open, reply } => {
                    self.state.is_drawer_open = open;
                    let _ = reply.send(Ok(()));
                }
                Command::SetMyPets { pets, reply } => {
                    self.state.my_pets = pets;
                    let _ = reply.send(Ok(()));
                }
                Command::SetSelectedPet { pet, reply } => {
                    self.state.selected_pet = pet;
                    let _ = reply.send(Ok(()));
                }
                Command::Logout { reply } => {
                    let _ = reply.send(self.logout().await);
                }
                Command::LoadStoredAuth { reply } => {
                    self.load_stored_auth().await;
                    let _ = reply.send(Ok(()));
                }
                Command::AddToCart { item, reply } => {
                    let _ = reply.send(self.add_to_cart(item).await);
                }
                Command::RemoveFromCart { product_id, reply } => {
                    let _ = reply.send(self.remove_from_cart(&product_id).await);
                }
                Command::UpdateCartQuantity {
                    product_id,
                    quantity,
                    reply,
                } => {
                    let _ = reply.send(self.update_cart_quantity(&product_id, quantity).await);
                }
                Command::ClearCart { reply } => {
                    let _ = reply.send(self.clear_cart().await);
                }
                Command::Shutdown { reply } => {
                    info!("Session store received shutdown");
                    let _ = reply.send(());
                    break;
                }
            }

            self.publish();
        }

        info!("Session store stopped");
    }

    fn publish(&self) {
        self.snapshots.send_if_modified(|current| {
            if *current == self.state {
                false
            } else {
                *current = self.state.clone();
                true
            }
        });
    }

    // -------------------------------------------------------------------------
    // Auth
    // -------------------------------------------------------------------------

    fn set_user(&mut self, user: Option<User>) {
        self.state.is_authenticated = user.is_some();
        self.state.user = user;
    }

    async fn set_token(&mut self, token: Option<String>) -> StoreResult<()> {
        match token.as_deref() {
            Some(value) => {
                validate_token(value)?;
                self.write(keys::AUTH_TOKEN, value).await?;
            }
            None => self.erase(keys::AUTH_TOKEN).await?,
        }

        self.state.token = token;
        Ok(())
    }

    async fn logout(&mut self) -> StoreResult<()> {
        let token_removed = self.erase(keys::AUTH_TOKEN).await;
        let cart_removed = self.erase(keys::CART).await;

        self.state.clear_session();
        info!("Logged out");

        token_removed.and(cart_removed)
    }

    /// Rebuilds state from storage. Infallible by contract.
    async fn load_stored_auth(&mut self) {
        let token = self
            .read_or_default(keys::AUTH_TOKEN)
            .await
            .filter(|t| validate_token(t).is_ok());

        self.state.language = match self.read_or_default(keys::LANGUAGE).await {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "Ignoring unknown stored language");
                Locale::default()
            }),
            None => Locale::default(),
        };

        self.state.theme_mode = match self.read_or_default(keys::THEME_MODE).await {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "Ignoring unknown stored theme mode");
                ThemeMode::default()
            }),
            None => ThemeMode::default(),
        };

        let cart = match self.read_or_default(keys::CART).await {
            Some(json) => Cart::from_json(&json).unwrap_or_else(|e| {
                warn!(error = %e, "Discarding unreadable stored cart");
                Cart::new()
            }),
            None => Cart::new(),
        };
        self.state.replace_cart(cart);

        self.state.user = None;
        self.state.is_authenticated = false;
        self.state.token = token;

        if let Some(token) = self.state.token.clone() {
            self.restore_session(&token).await;
        }

        self.state.is_loading = false;

        info!(
            has_token = self.state.token.is_some(),
            authenticated = self.state.is_authenticated,
            language = %self.state.language,
            cart_items = self.state.cart.item_count(),
            "Stored session loaded"
        );
    }

    /// Confirms a rehydrated token with the backend, when one is configured.
    async fn restore_session(&mut self, token: &str) {
        let Some(validator) = self.validator.clone() else {
            debug!("No session validator configured; keeping stored token");
            return;
        };

        match validator.validate(token).await {
            Ok(user) => {
                info!(user_id = %user.id, "Stored session is valid");
                self.set_user(Some(user));
            }
            Err(e) if e.invalidates_token() => {
                warn!(error = %e, "Stored token rejected; signing out");
                if let Err(e) = self.erase(keys::AUTH_TOKEN).await {
                    warn!(error = %e, "Could not remove rejected token from storage");
                }
                self.state.token = None;
            }
            Err(e) => {
                warn!(error = %e, "Could not validate stored session; keeping token");
            }
        }
    }

    // -------------------------------------------------------------------------
    // Preferences
    // -------------------------------------------------------------------------

    async fn set_language(&mut self, language: Locale) -> StoreResult<()> {
        self.write(keys::LANGUAGE, language.as_str()).await?;
        self.state.language = language;
        Ok(())
    }

    async fn set_theme_mode(&mut self, mode: ThemeMode) -> StoreResult<()> {
        self.write(keys::THEME_MODE, mode.as_str()).await?;
        self.state.theme_mode = mode;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------

    async fn add_to_cart(&mut self, item: NewCartItem) -> StoreResult<i64> {
        let product_id = item.product_id.clone();
        let mut next = self.state.cart.clone();
        let quantity = next.add_item(item)?;

        self.commit_cart(next).await?;
        debug!(product_id = %product_id, quantity, "Added to cart");
        Ok(quantity)
    }

    async fn remove_from_cart(&mut self, product_id: &str) -> StoreResult<()> {
        let mut next = self.state.cart.clone();
        if !next.remove_item(product_id) {
            debug!(product_id = %product_id, "Remove for product not in cart");
            return Ok(());
        }

        self.commit_cart(next).await?;
        debug!(product_id = %product_id, "Removed from cart");
        Ok(())
    }

    async fn update_cart_quantity(&mut self, product_id: &str, quantity: i64) -> StoreResult<()> {
        let mut next = self.state.cart.clone();
        if !next.update_quantity(product_id, quantity)? {
            return Ok(());
        }

        self.commit_cart(next).await?;
        debug!(product_id = %product_id, quantity, "Cart quantity updated");
        Ok(())
    }

    async fn clear_cart(&mut self) -> StoreResult<()> {
        self.erase(keys::CART).await?;
        self.state.replace_cart(Cart::new());
        Ok(())
    }

    /// Persists the full cart, then makes it current.
    async fn commit_cart(&mut self, cart: Cart) -> StoreResult<()> {
        let json = cart.to_json()?;
        self.write(keys::CART, &json).await?;
        self.state.replace_cart(cart);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Storage access (bounded by storage_timeout)
    // -------------------------------------------------------------------------

    async fn write(&self, key: &'static str, value: &str) -> StoreResult<()> {
        let result = match timeout(self.storage_timeout, self.storage.set(key, value)).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(self.timeout_error("set", key)),
        };

        if let Err(ref e) = result {
            error!(key, error = %e, "Storage write failed");
        }
        result
    }

    async fn erase(&self, key: &'static str) -> StoreResult<()> {
        let result = match timeout(self.storage_timeout, self.storage.remove(key)).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(self.timeout_error("remove", key)),
        };

        if let Err(ref e) = result {
            error!(key, error = %e, "Storage remove failed");
        }
        result
    }

    /// Reads a key for rehydration; failures become `None`.
    async fn read_or_default(&self, key: &'static str) -> Option<String> {
        match timeout(self.storage_timeout, self.storage.get(key)).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                warn!(key, error = %e, "Storage read failed; using default");
                None
            }
            Err(_) => {
                warn!(key, error = %self.timeout_error("get", key), "Storage read timed out; using default");
                None
            }
        }
    }

    fn timeout_error(&self, operation: &'static str, key: &'static str) -> StoreError {
        StoreError::StorageTimeout {
            operation,
            key,
            timeout_ms: self.storage_timeout.as_millis() as u64,
        }
    }
}

// =============================================================================
// Store Handle (for screens)
// =============================================================================

/// Cloneable handle to a running store.
///
/// Every mutator resolves once the actor has finished the command,
/// including its storage write.
#[derive(Clone)]
pub struct StoreHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<AppState>,
}

impl StoreHandle {
    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> StoreResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| StoreError::MailboxClosed)?;
        response.await.map_err(|_| StoreError::MailboxClosed)?
    }

    /// Latest published state.
    pub fn snapshot(&self) -> AppState {
        self.snapshots.borrow().clone()
    }

    /// A receiver that wakes on every state change.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.snapshots.clone()
    }

    pub fn cart_total(&self) -> Money {
        self.snapshots.borrow().cart_total
    }

    // Auth -------------------------------------------------------------------

    pub async fn set_user(&self, user: Option<User>) -> StoreResult<()> {
        self.request(|reply| Command::SetUser { user, reply }).await
    }

    pub async fn set_token(&self, token: Option<String>) -> StoreResult<()> {
        self.request(|reply| Command::SetToken { token, reply }).await
    }

    pub async fn logout(&self) -> StoreResult<()> {
        self.request(|reply| Command::Logout { reply }).await
    }

    /// Rehydrates from storage. Always succeeds unless the store is gone.
    pub async fn load_stored_auth(&self) -> StoreResult<()> {
        self.request(|reply| Command::LoadStoredAuth { reply }).await
    }

    // Preferences & UI -------------------------------------------------------

    pub async fn set_language(&self, language: Locale) -> StoreResult<()> {
        self.request(|reply| Command::SetLanguage { language, reply })
            .await
    }

    pub async fn set_theme_mode(&self, mode: ThemeMode) -> StoreResult<()> {
        self.request(|reply| Command::SetThemeMode { mode, reply }).await
    }

    pub async fn set_drawer_open(&self, open: bool) -> StoreResult<()> {
        self.request(|reply| Command::SetDrawerOpen { open, reply }).await
    }

    pub async fn set_my_pets(&self, pets: Vec<Pet>) -> StoreResult<()> {
        self.request(|reply| Command::SetMyPets { pets, reply }).await
    }

    pub async fn set_selected_pet(&self, pet: Option<Pet>) -> StoreResult<()> {
        self.request(|reply| Command::SetSelectedPet { pet, reply })
            .await
    }

    // Cart -------------------------------------------------------------------

    /// Returns the line's quantity after the add.
    pub async fn add_to_cart(&self, item: NewCartItem) -> StoreResult<i64> {
        self.request(|reply| Command::AddToCart { item, reply }).await
    }

    pub async fn remove_from_cart(&self, product_id: impl Into<String>) -> StoreResult<()> {
        let product_id = product_id.into();
        self.request(|reply| Command::RemoveFromCart { product_id, reply })
            .await
    }

    pub async fn update_cart_quantity(
        &self,
        product_id: impl Into<String>,
        quantity: i64,
    ) -> StoreResult<()> {
        let product_id = product_id.into();
        self.request(|reply| Command::UpdateCartQuantity {
            product_id,
            quantity,
            reply,
        })
        .await
    }

    pub async fn clear_cart(&self) -> StoreResult<()> {
        self.request(|reply| Command::ClearCart { reply }).await
    }

    // Lifecycle --------------------------------------------------------------

    /// Stops the actor after the commands already queued.
    pub async fn shutdown(&self) {
        let (reply, done) = oneshot::channel();
        if self.commands.send(Command::Shutdown { reply }).await.is_ok() {
            let _ = done.await;
        }
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}

// =============================================================================
// Builder Pattern
// =============================================================================

/// Builder for spawning a store with options.
///
/// ## Example
/// ```rust,ignore
/// let store = StoreBuilder::new()
///     .with_storage(Arc::new(MemoryStorage::new()))
///     .storage_timeout(Duration::from_secs(2))
///     .spawn()?;
/// store.load_stored_auth().await?;
/// ```
pub struct StoreBuilder {
    storage: Option<Arc<dyn KeyValueStorage>>,
    validator: Option<Arc<dyn SessionValidator>>,
    storage_timeout: Duration,
    mailbox_capacity: usize,
}

impl Default for StoreBuilder {
    fn default() -> Self {
        let defaults = StoreConfig::default();
        StoreBuilder {
            storage: None,
            validator: None,
            storage_timeout: defaults.storage.timeout(),
            mailbox_capacity: defaults.store.mailbox_capacity,
        }
    }
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder wired from configuration: opens the storage backend and, if
    /// a backend URL is set and validation enabled, the HTTP validator.
    pub async fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        config.validate()?;

        let storage = config.storage.open().await?;

        let validator: Option<Arc<dyn SessionValidator>> = match config.session.validation_url() {
            Some(url) => Some(Arc::new(HttpSessionValidator::new(
                url,
                config.session.request_timeout(),
            )?)),
            None => None,
        };

        Ok(StoreBuilder {
            storage: Some(storage),
            validator,
            storage_timeout: config.storage.timeout(),
            mailbox_capacity: config.store.mailbox_capacity,
        })
    }

    pub fn with_storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_session_validator(mut self, validator: Arc<dyn SessionValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn storage_timeout(mut self, storage_timeout: Duration) -> Self {
        self.storage_timeout = storage_timeout;
        self
    }

    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    /// Spawns the actor on the current tokio runtime.
    pub fn spawn(self) -> StoreResult<StoreHandle> {
        let storage = self
            .storage
            .ok_or_else(|| StoreError::InvalidConfig("Storage backend required".into()))?;

        if self.mailbox_capacity == 0 {
            return Err(StoreError::InvalidConfig(
                "mailbox capacity must be greater than 0".into(),
            ));
        }

        let (commands_tx, commands_rx) = mpsc::channel(self.mailbox_capacity);
        let (snapshots_tx, snapshots_rx) = watch::channel(AppState::default());

        let actor = StoreActor {
            state: AppState::default(),
            storage,
            validator: self.validator,
            storage_timeout: self.storage_timeout,
            commands: commands_rx,
            snapshots: snapshots_tx,
        };

        tokio::spawn(actor.run());

        Ok(StoreHandle {
            commands: commands_tx,
            snapshots: snapshots_rx,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use petsy_core::{CoreError, Role};
    use petsy_storage::{MemoryStorage, StorageError, StorageResult};
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::error::{ErrorCode, SessionError};

    // -------------------------------------------------------------------------
    // Fakes
    // -------------------------------------------------------------------------

    /// Wraps a MemoryStorage and fails every call while `broken` is set.
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        broken: AtomicBool,
    }

    impl FlakyStorage {
        fn break_now(&self) {
            self.broken.store(true, Ordering::SeqCst);
        }

        fn check(&self) -> StorageResult<()> {
            if self.broken.load(Ordering::SeqCst) {
                Err(StorageError::QueryFailed("disk I/O error".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl KeyValueStorage for FlakyStorage {
        async fn get(&self, key: &str) -> StorageResult<Option<String>> {
            self.check()?;
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            self.check()?;
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> StorageResult<()> {
            self.check()?;
            self.inner.remove(key).await
        }

        fn backend_name(&self) -> &'static str {
            "flaky"
        }
    }

    /// Never answers.
    struct HungStorage;

    #[async_trait]
    impl KeyValueStorage for HungStorage {
        async fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            std::future::pending().await
        }

        async fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            std::future::pending().await
        }

        async fn remove(&self, _key: &str) -> StorageResult<()> {
            std::future::pending().await
        }

        fn backend_name(&self) -> &'static str {
            "hung"
        }
    }

    enum Verdict {
        Valid,
        Rejected,
        Offline,
    }

    struct FakeValidator(Verdict);

    #[async_trait]
    impl SessionValidator for FakeValidator {
        async fn validate(&self, _token: &str) -> Result<User, SessionError> {
            match self.0 {
                Verdict::Valid => Ok(user()),
                Verdict::Rejected => Err(SessionError::Rejected { status: 401 }),
                Verdict::Offline => Err(SessionError::Unavailable("connection refused".into())),
            }
        }
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn user() -> User {
        User {
            id: "u1".into(),
            email: "sara@example.com".into(),
            name: "Sara".into(),
            username: None,
            user_code: None,
            phone: None,
            city: None,
            bio: None,
            avatar: None,
            language: Locale::En,
            is_verified: true,
            is_admin: false,
            role: Role::User,
            created_at: Utc::now(),
        }
    }

    fn food() -> NewCartItem {
        NewCartItem::new("p1", "Dry Food 2kg", Money::from_cents(999))
    }

    fn spawn_with(storage: Arc<dyn KeyValueStorage>) -> StoreHandle {
        StoreBuilder::new().with_storage(storage).spawn().unwrap()
    }

    async fn loaded(storage: Arc<dyn KeyValueStorage>) -> StoreHandle {
        let store = spawn_with(storage);
        store.load_stored_auth().await.unwrap();
        store
    }

    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_cart_scenario_is_persisted_at_each_step() {
        let storage = Arc::new(MemoryStorage::new());
        let store = loaded(storage.clone()).await;

        assert_eq!(store.add_to_cart(food()).await.unwrap(), 1);
        assert_eq!(store.cart_total(), Money::from_cents(999));

        assert_eq!(store.add_to_cart(food()).await.unwrap(), 2);
        assert_eq!(store.cart_total(), Money::from_cents(1998));
        let stored = storage.get(keys::CART).await.unwrap().unwrap();
        assert_eq!(Cart::from_json(&stored).unwrap().get("p1").unwrap().quantity, 2);

        store.update_cart_quantity("p1", 1).await.unwrap();
        assert_eq!(store.cart_total(), Money::from_cents(999));

        store.remove_from_cart("p1").await.unwrap();
        let snapshot = store.snapshot();
        assert!(snapshot.cart.is_empty());
        assert!(snapshot.cart_total.is_zero());
        assert_eq!(storage.get(keys::CART).await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_serialized() {
        let store = loaded(Arc::new(MemoryStorage::new())).await;

        let mut tasks = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move { store.add_to_cart(food()).await }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let snapshot = store.snapshot();
        assert_eq!(snapshot.cart.item_count(), 1);
        assert_eq!(snapshot.cart.get("p1").unwrap().quantity, 50);
        assert_eq!(snapshot.cart_total, Money::from_cents(50 * 999));
    }

    #[tokio::test]
    async fn test_update_to_zero_and_negative_remove_rows() {
        let store = loaded(Arc::new(MemoryStorage::new())).await;
        store.add_to_cart(food()).await.unwrap();
        store
            .add_to_cart(NewCartItem::new("p2", "Leash", Money::from_cents(1550)))
            .await
            .unwrap();

        store.update_cart_quantity("p1", 0).await.unwrap();
        store.update_cart_quantity("p2", -5).await.unwrap();

        assert!(store.snapshot().cart.is_empty());
        assert!(store.cart_total().is_zero());
    }

    #[tokio::test]
    async fn test_remove_absent_product_is_noop() {
        let storage = Arc::new(FlakyStorage::default());
        let store = loaded(storage.clone()).await;
        store.add_to_cart(food()).await.unwrap();
        let before = store.snapshot();

        // No write happens, so a broken backend does not matter
        storage.break_now();
        store.remove_from_cart("nope").await.unwrap();

        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn test_cart_limit_surfaces_typed_error() {
        let store = loaded(Arc::new(MemoryStorage::new())).await;
        store.add_to_cart(food()).await.unwrap();

        let err = store.update_cart_quantity("p1", 1000).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::CartLimit);
        assert!(matches!(
            err,
            StoreError::Core(CoreError::QuantityTooLarge { .. })
        ));
        assert_eq!(store.snapshot().cart.get("p1").unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn test_oversized_price_is_rejected_and_store_keeps_running() {
        let storage = Arc::new(MemoryStorage::new());
        let store = loaded(storage.clone()).await;
        let collar = NewCartItem::new("p9", "Gold Collar", Money::from_cents(i64::MAX / 2 + 1));

        let err = store.add_to_cart(collar.clone()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert!(store.add_to_cart(collar).await.is_err());

        assert!(store.is_running());
        assert_eq!(store.add_to_cart(food()).await.unwrap(), 1);
        assert_eq!(store.cart_total(), Money::from_cents(999));
    }

    #[tokio::test]
    async fn test_rehydration_discards_cart_with_unrepresentable_total() {
        let max = i64::MAX;
        let stored = format!(
            r#"[{{"product_id":"p1","name":"A","price":{max},"quantity":1}},
                {{"product_id":"p2","name":"B","price":{max},"quantity":1}}]"#
        );
        let storage = Arc::new(MemoryStorage::with_entries([
            (keys::CART, stored),
            (keys::LANGUAGE, "ar".to_string()),
        ]));

        let store = loaded(storage).await;

        let snapshot = store.snapshot();
        assert!(!snapshot.is_loading);
        assert!(snapshot.cart.is_empty());
        assert!(snapshot.cart_total.is_zero());
        assert_eq!(snapshot.language, Locale::Ar);
        assert!(store.is_running());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_state_unchanged() {
        let storage = Arc::new(FlakyStorage::default());
        let store = loaded(storage.clone()).await;
        store.add_to_cart(food()).await.unwrap();
        store.set_language(Locale::Ar).await.unwrap();

        storage.break_now();

        let err = store.add_to_cart(food()).await.unwrap_err();
        assert!(err.is_storage_error());
        assert!(store.set_language(Locale::En).await.is_err());
        assert!(store.clear_cart().await.is_err());

        let snapshot = store.snapshot();
        assert_eq!(snapshot.cart.get("p1").unwrap().quantity, 1);
        assert_eq!(snapshot.cart_total, Money::from_cents(999));
        assert_eq!(snapshot.language, Locale::Ar);
    }

    #[tokio::test]
    async fn test_hung_storage_times_out() {
        let store = StoreBuilder::new()
            .with_storage(Arc::new(HungStorage))
            .storage_timeout(Duration::from_millis(50))
            .spawn()
            .unwrap();

        // Rehydration still completes with defaults
        store.load_stored_auth().await.unwrap();
        assert!(!store.snapshot().is_loading);

        let err = store.add_to_cart(food()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::StorageTimeout);
        assert!(store.snapshot().cart.is_empty());
    }

    // -------------------------------------------------------------------------
    // Auth & rehydration
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_set_token_writes_then_updates_memory() {
        let storage = Arc::new(MemoryStorage::new());
        let store = loaded(storage.clone()).await;

        store.set_token(Some("tok-123".into())).await.unwrap();
        assert_eq!(store.snapshot().token.as_deref(), Some("tok-123"));
        assert_eq!(storage.get(keys::AUTH_TOKEN).await.unwrap().as_deref(), Some("tok-123"));

        store.set_token(None).await.unwrap();
        assert!(store.snapshot().token.is_none());
        assert_eq!(storage.get(keys::AUTH_TOKEN).await.unwrap(), None);

        assert!(store.set_token(Some("has space".into())).await.is_err());
        assert!(store.snapshot().token.is_none());
    }

    #[tokio::test]
    async fn test_set_user_drives_authenticated_flag() {
        let store = loaded(Arc::new(MemoryStorage::new())).await;

        store.set_user(Some(user())).await.unwrap();
        assert!(store.snapshot().is_authenticated);

        store.set_user(Some(user())).await.unwrap();
        assert!(store.snapshot().is_authenticated);

        store.set_user(None).await.unwrap();
        assert!(!store.snapshot().is_authenticated);
    }

    #[tokio::test]
    async fn test_logout_then_restart_is_signed_out_with_empty_cart() {
        let storage = Arc::new(MemoryStorage::new());
        let store = loaded(storage.clone()).await;

        store.set_token(Some("tok".into())).await.unwrap();
        store.set_user(Some(user())).await.unwrap();
        store.set_language(Locale::Ar).await.unwrap();
        store.add_to_cart(food()).await.unwrap();
        store.set_selected_pet(None).await.unwrap();

        store.logout().await.unwrap();
        let snapshot = store.snapshot();
        assert!(!snapshot.is_authenticated);
        assert!(snapshot.cart.is_empty());
        assert_eq!(snapshot.language, Locale::Ar);
        store.shutdown().await;

        let restarted = loaded(storage).await;
        let snapshot = restarted.snapshot();
        assert!(!snapshot.is_authenticated);
        assert!(snapshot.token.is_none());
        assert!(snapshot.cart.is_empty());
        assert_eq!(snapshot.language, Locale::Ar);
    }

    #[tokio::test]
    async fn test_logout_clears_memory_even_if_storage_fails() {
        let storage = Arc::new(FlakyStorage::default());
        let store = loaded(storage.clone()).await;
        store.set_token(Some("tok".into())).await.unwrap();
        store.set_user(Some(user())).await.unwrap();

        storage.break_now();
        assert!(store.logout().await.is_err());

        let snapshot = store.snapshot();
        assert!(snapshot.token.is_none());
        assert!(snapshot.user.is_none());
        assert!(!snapshot.is_authenticated);
    }

    #[tokio::test]
    async fn test_language_survives_restart() {
        let storage = Arc::new(MemoryStorage::new());
        let store = loaded(storage.clone()).await;
        store.set_language(Locale::Ar).await.unwrap();
        store.shutdown().await;

        let restarted = loaded(storage).await;
        assert_eq!(restarted.snapshot().language, Locale::Ar);
        assert!(restarted.snapshot().is_rtl());
    }

    #[tokio::test]
    async fn test_rehydration_tolerates_bad_values() {
        let storage = Arc::new(MemoryStorage::with_entries([
            (keys::LANGUAGE, "fr"),
            (keys::THEME_MODE, "sepia"),
            (keys::CART, "{not json"),
        ]));

        let store = spawn_with(storage);
        assert!(store.snapshot().is_loading);
        store.load_stored_auth().await.unwrap();

        let snapshot = store.snapshot();
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.language, Locale::En);
        assert_eq!(snapshot.theme_mode, ThemeMode::System);
        assert!(snapshot.cart.is_empty());
    }

    #[tokio::test]
    async fn test_rehydration_survives_storage_failure() {
        let storage = Arc::new(FlakyStorage::default());
        storage.inner.set(keys::LANGUAGE, "ar").await.unwrap();
        storage.break_now();

        let store = spawn_with(storage);
        store.load_stored_auth().await.unwrap();

        let snapshot = store.snapshot();
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.language, Locale::En);
    }

    #[tokio::test]
    async fn test_theme_rehydrates_from_its_storage_key() {
        let storage = Arc::new(MemoryStorage::with_entries([("@petsy_theme_mode", "dark")]));
        let store = loaded(storage).await;

        assert_eq!(store.snapshot().theme_mode, ThemeMode::Dark);
    }

    #[tokio::test]
    async fn test_rehydrates_cart_total() {
        let mut cart = Cart::new();
        cart.add_item(food()).unwrap();
        cart.add_item(food()).unwrap();
        let storage = Arc::new(MemoryStorage::with_entries([(
            keys::CART,
            cart.to_json().unwrap(),
        )]));

        let store = loaded(storage).await;
        assert_eq!(store.cart_total(), Money::from_cents(1998));
        assert_eq!(store.snapshot().cart_summary.total_quantity, 2);
    }

    #[tokio::test]
    async fn test_token_without_validator_is_kept_unauthenticated() {
        let storage = Arc::new(MemoryStorage::with_entries([(keys::AUTH_TOKEN, "tok")]));
        let store = loaded(storage).await;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.token.as_deref(), Some("tok"));
        assert!(!snapshot.is_authenticated);
    }

    #[tokio::test]
    async fn test_valid_session_restores_user() {
        let storage = Arc::new(MemoryStorage::with_entries([(keys::AUTH_TOKEN, "tok")]));
        let store = StoreBuilder::new()
            .with_storage(storage)
            .with_session_validator(Arc::new(FakeValidator(Verdict::Valid)))
            .spawn()
            .unwrap();
        store.load_stored_auth().await.unwrap();

        let snapshot = store.snapshot();
        assert!(snapshot.is_authenticated);
        assert_eq!(snapshot.user.unwrap().id, "u1");
    }

    #[tokio::test]
    async fn test_rejected_session_removes_token() {
        let storage = Arc::new(MemoryStorage::with_entries([(keys::AUTH_TOKEN, "stale")]));
        let store = StoreBuilder::new()
            .with_storage(storage.clone())
            .with_session_validator(Arc::new(FakeValidator(Verdict::Rejected)))
            .spawn()
            .unwrap();
        store.load_stored_auth().await.unwrap();

        assert!(store.snapshot().token.is_none());
        assert!(!store.snapshot().is_authenticated);
        assert_eq!(storage.get(keys::AUTH_TOKEN).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_offline_validation_keeps_token() {
        let storage = Arc::new(MemoryStorage::with_entries([(keys::AUTH_TOKEN, "tok")]));
        let store = StoreBuilder::new()
            .with_storage(storage.clone())
            .with_session_validator(Arc::new(FakeValidator(Verdict::Offline)))
            .spawn()
            .unwrap();
        store.load_stored_auth().await.unwrap();

        assert_eq!(store.snapshot().token.as_deref(), Some("tok"));
        assert!(!store.snapshot().is_authenticated);
        assert!(storage.get(keys::AUTH_TOKEN).await.unwrap().is_some());
    }

    // -------------------------------------------------------------------------
    // UI state & lifecycle
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_ui_flags_and_theme() {
        let storage = Arc::new(MemoryStorage::new());
        let store = loaded(storage.clone()).await;

        store.set_drawer_open(true).await.unwrap();
        store.set_theme_mode(ThemeMode::Dark).await.unwrap();
        store.set_my_pets(Vec::new()).await.unwrap();

        let snapshot = store.snapshot();
        assert!(snapshot.is_drawer_open);
        assert_eq!(snapshot.theme_mode, ThemeMode::Dark);
        assert_eq!(storage.get(keys::THEME_MODE).await.unwrap().as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = loaded(Arc::new(MemoryStorage::new())).await;
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.add_to_cart(food()).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().cart_total, Money::from_cents(999));
    }

    #[tokio::test]
    async fn test_handle_after_shutdown() {
        let store = loaded(Arc::new(MemoryStorage::new())).await;
        store.shutdown().await;

        let err = store.set_drawer_open(true).await.unwrap_err();
        assert!(matches!(err, StoreError::MailboxClosed));
        assert!(!store.is_running());
    }

    #[tokio::test]
    async fn test_builder_requires_storage() {
        assert!(StoreBuilder::new().spawn().is_err());
        assert!(StoreBuilder::new()
            .with_storage(Arc::new(MemoryStorage::new()))
            .mailbox_capacity(0)
            .spawn()
            .is_err());
    }

    #[tokio::test]
    async fn test_builder_from_in_memory_config() {
        let store = StoreBuilder::from_config(&StoreConfig::in_memory())
            .await
            .unwrap()
            .spawn()
            .unwrap();

        store.load_stored_auth().await.unwrap();
        store.add_to_cart(food()).await.unwrap();
        assert_eq!(store.cart_total(), Money::from_cents(999));
    }
}
