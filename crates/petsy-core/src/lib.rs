//! # petsy-core: Domain Logic for the Petsy Session Store
//!
//! Everything the store knows how to *compute*, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Petsy Client Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Screens (React Native)                       │   │
//! │  │    Login ──► Shop ──► Cart ──► Checkout ──► Profile             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ StoreHandle                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 petsy-store (actor)                             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ petsy-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │ validation│  │   │
//! │  │   │ User, Pet │  │   Money   │  │   Cart    │  │   rules   │  │   │
//! │  │   │  Locale   │  │  (cents)  │  │ LineItem  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - User, Pet, Role, Locale, ThemeMode
//! - [`money`] - Money type with integer arithmetic
//! - [`cart`] - Cart, line items, derived totals, storage encoding
//! - [`error`] - Domain error types
//! - [`validation`] - Input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use petsy_core::{Cart, Money, NewCartItem};
//!
//! let mut cart = Cart::new();
//! cart.add_item(NewCartItem::new("p1", "Dry Food", Money::from_cents(999))).unwrap();
//! cart.add_item(NewCartItem::new("p1", "Dry Food", Money::from_cents(999))).unwrap();
//!
//! assert_eq!(cart.total(), Money::from_cents(1998));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLineItem, CartSummary, NewCartItem};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines in a cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity on a single line.
///
/// Catches typos like 1000 for 10 before they reach checkout.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum unit price in cents ($1,000,000.00).
///
/// With the line and quantity caps this keeps every cart total well inside
/// an i64.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;
