//! # App State Snapshot
//!
//! The value screens read. The actor owns the only mutable copy and
//! publishes a clone after every command through a `watch` channel.
//!
//! ```text
//! ┌────────────────────── AppState ──────────────────────┐
//! │ auth:   user, token, is_authenticated, is_loading   │
//! │ ui:     is_drawer_open, language, theme_mode        │
//! │ pets:   my_pets, selected_pet                       │
//! │ cart:   cart, cart_total, cart_summary  (derived)   │
//! └──────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use ts_rs::TS;

use petsy_core::{Cart, CartSummary, Locale, Money, Pet, TextDirection, ThemeMode, User};

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct AppState {
    pub user: Option<User>,
    /// Bearer token. Present does not mean valid; see `is_authenticated`.
    pub token: Option<String>,
    pub is_authenticated: bool,
    /// True until rehydration has finished. Route guards wait on this.
    pub is_loading: bool,
    pub is_drawer_open: bool,
    pub language: Locale,
    pub theme_mode: ThemeMode,
    pub my_pets: Vec<Pet>,
    pub selected_pet: Option<Pet>,
    pub cart: Cart,
    pub cart_total: Money,
    pub cart_summary: CartSummary,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            user: None,
            token: None,
            is_authenticated: false,
            is_loading: true,
            is_drawer_open: false,
            language: Locale::default(),
            theme_mode: ThemeMode::default(),
            my_pets: Vec::new(),
            selected_pet: None,
            cart: Cart::new(),
            cart_total: Money::zero(),
            cart_summary: CartSummary::default(),
        }
    }
}

impl AppState {
    /// Replaces the cart and re-derives its totals.
    pub(crate) fn replace_cart(&mut self, cart: Cart) {
        self.cart = cart;
        self.cart_summary = self.cart.summary();
        self.cart_total = self.cart_summary.total;
    }

    /// Drops everything tied to the signed-in account.
    ///
    /// Language, theme and UI flags belong to the device and are kept.
    pub(crate) fn clear_session(&mut self) {
        self.user = None;
        self.token = None;
        self.is_authenticated = false;
        self.my_pets.clear();
        self.selected_pet = None;
        self.replace_cart(Cart::new());
    }

    pub fn direction(&self) -> TextDirection {
        self.language.direction()
    }

    pub fn is_rtl(&self) -> bool {
        self.language.is_rtl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petsy_core::NewCartItem;

    #[test]
    fn test_initial_state_is_loading() {
        let state = AppState::default();
        assert!(state.is_loading);
        assert!(!state.is_authenticated);
        assert_eq!(state.language, Locale::En);
        assert!(state.cart_total.is_zero());
    }

    #[test]
    fn test_replace_cart_derives_totals() {
        let mut cart = Cart::new();
        cart.add_item(NewCartItem::new("p1", "Bowl", Money::from_cents(450))).unwrap();
        cart.add_item(NewCartItem::new("p1", "Bowl", Money::from_cents(450))).unwrap();

        let mut state = AppState::default();
        state.replace_cart(cart);

        assert_eq!(state.cart_total, Money::from_cents(900));
        assert_eq!(state.cart_summary.total_quantity, 2);
    }

    #[test]
    fn test_clear_session_keeps_device_preferences() {
        let mut state = AppState {
            token: Some("tok".into()),
            is_authenticated: true,
            language: Locale::Ar,
            theme_mode: ThemeMode::Dark,
            is_drawer_open: true,
            ..Default::default()
        };

        state.clear_session();

        assert!(state.token.is_none());
        assert!(!state.is_authenticated);
        assert_eq!(state.language, Locale::Ar);
        assert_eq!(state.theme_mode, ThemeMode::Dark);
        assert!(state.is_rtl());
    }
}
