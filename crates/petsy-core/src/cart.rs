//! # Cart Module
//!
//! The shopping cart held by the session store.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Operations                                   │
//! │                                                                         │
//! │  Screen Action            Store Command           Cart Change           │
//! │  ─────────────            ─────────────           ───────────           │
//! │                                                                         │
//! │  Add to cart ────────────► add_to_cart() ───────► qty += 1 or push      │
//! │                                                                         │
//! │  Stepper / input ────────► update_quantity() ───► qty = n (0 removes)   │
//! │                                                                         │
//! │  Swipe remove ───────────► remove_from_cart() ──► retain(!= id)         │
//! │                                                                         │
//! │  Checkout done ──────────► clear_cart() ────────► items.clear()         │
//! │                                                                         │
//! │  Every change is followed by a full rewrite of the `cart` storage key. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The total is never stored: [`Cart::total`] derives it from the lines.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::validation::{
    validate_item_name, validate_line_quantity, validate_price_cents, validate_product_id,
};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Line Items
// =============================================================================

/// What a screen hands over when the user taps "add to cart".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCartItem {
    pub product_id: String,
    pub name: String,
    /// Unit price in cents.
    pub price: Money,
    #[serde(default)]
    pub image: Option<String>,
}

impl NewCartItem {
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        NewCartItem {
            product_id: product_id.into(),
            name: name.into(),
            price,
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// One cart row, unique by `product_id`.
///
/// This is also the persisted shape: the `cart` key holds a JSON array of
/// these, with `price` in integer cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLineItem {
    pub product_id: String,
    pub name: String,
    /// Unit price in cents, frozen when the line was created.
    pub price: Money,
    /// Always >= 1 while the line exists.
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartLineItem {
    /// Unit price × quantity.
    pub fn line_total(&self) -> CoreResult<Money> {
        self.price
            .checked_mul(self.quantity)
            .ok_or(CoreError::TotalOverflow)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product bumps quantity)
/// - Every line has `1 <= quantity <= MAX_ITEM_QUANTITY`
/// - At most `MAX_CART_ITEMS` distinct lines
/// - The total fits in an i64 of cents
/// - A rejected operation leaves the cart untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart(Vec<CartLineItem>);

impl Cart {
    pub fn new() -> Self {
        Cart(Vec::new())
    }

    /// Adds one unit of a product.
    ///
    /// ## Behavior
    /// - Product already in cart: quantity += 1
    /// - Otherwise: appends a new line with quantity 1
    ///
    /// Returns the line's quantity after the add.
    ///
    /// ## Example
    /// ```rust
    /// use petsy_core::cart::{Cart, NewCartItem};
    /// use petsy_core::Money;
    ///
    /// let mut cart = Cart::new();
    /// let food = NewCartItem::new("p1", "Dry Food", Money::from_cents(999));
    ///
    /// cart.add_item(food.clone()).unwrap();
    /// assert_eq!(cart.add_item(food).unwrap(), 2);
    /// assert_eq!(cart.total().cents(), 1998);
    /// ```
    pub fn add_item(&mut self, item: NewCartItem) -> CoreResult<i64> {
        validate_product_id(&item.product_id)?;

        if let Some(idx) = self.position(&item.product_id) {
            let previous = self.0[idx].quantity;
            let requested = previous + 1;
            if requested > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested,
                    max: MAX_ITEM_QUANTITY,
                });
            }

            self.0[idx].quantity = requested;
            if let Err(e) = self.checked_total() {
                self.0[idx].quantity = previous;
                return Err(e);
            }
            return Ok(requested);
        }

        validate_item_name(&item.name)?;
        validate_price_cents(item.price.cents())?;

        if self.0.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.0.push(CartLineItem {
            product_id: item.product_id,
            name: item.name,
            price: item.price,
            quantity: 1,
            image: item.image,
        });
        if let Err(e) = self.checked_total() {
            self.0.pop();
            return Err(e);
        }
        Ok(1)
    }

    /// Sets a line's quantity.
    ///
    /// ## Behavior
    /// - `quantity <= 0`: the line is removed (negative input clamps to 0)
    /// - `quantity > MAX_ITEM_QUANTITY`: rejected, cart unchanged
    /// - Product not in cart: no-op
    ///
    /// Returns whether the cart changed.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<bool> {
        let quantity = quantity.max(0);

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if quantity == 0 {
            return Ok(self.remove_item(product_id));
        }

        let Some(idx) = self.position(product_id) else {
            return Ok(false);
        };

        let previous = self.0[idx].quantity;
        if previous == quantity {
            return Ok(false);
        }

        self.0[idx].quantity = quantity;
        if let Err(e) = self.checked_total() {
            self.0[idx].quantity = previous;
            return Err(e);
        }
        Ok(true)
    }

    /// Removes a line. Returns whether anything was removed.
    pub fn remove_item(&mut self, product_id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|l| l.product_id != product_id);
        self.0.len() != before
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn items(&self) -> &[CartLineItem] {
        &self.0
    }

    pub fn get(&self, product_id: &str) -> Option<&CartLineItem> {
        self.0.iter().find(|l| l.product_id == product_id)
    }

    fn position(&self, product_id: &str) -> Option<usize> {
        self.0.iter().position(|l| l.product_id == product_id)
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.0.len()
    }

    /// Sum of all line quantities.
    pub fn total_quantity(&self) -> i64 {
        self.0.iter().map(|l| l.quantity).sum()
    }

    /// Σ price × quantity.
    ///
    /// Every mutator and [`Cart::from_json`] keep this representable, so it
    /// is infallible; the `Money` operators saturate rather than panic.
    pub fn total(&self) -> Money {
        self.0.iter().map(|l| l.price * l.quantity).sum()
    }

    /// Σ price × quantity, or [`CoreError::TotalOverflow`].
    pub fn checked_total(&self) -> CoreResult<Money> {
        self.0.iter().try_fold(Money::zero(), |acc, line| {
            acc.checked_add(line.line_total()?)
                .ok_or(CoreError::TotalOverflow)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary {
            item_count: self.item_count(),
            total_quantity: self.total_quantity(),
            total: self.total(),
        }
    }

    // -------------------------------------------------------------------------
    // Storage encoding
    // -------------------------------------------------------------------------

    /// Encodes the full cart as the JSON array stored under the `cart` key.
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string(&self.0).map_err(|e| CoreError::Encode(e.to_string()))
    }

    /// Decodes a stored cart, re-checking every invariant.
    ///
    /// Anything that would not have been produced by the mutators above
    /// (duplicate ids, zero quantities, out-of-range prices, too many lines,
    /// a total that overflows) is reported as [`CoreError::CorruptCart`].
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let items: Vec<CartLineItem> =
            serde_json::from_str(json).map_err(|e| CoreError::CorruptCart(e.to_string()))?;

        if items.len() > MAX_CART_ITEMS {
            return Err(CoreError::CorruptCart(format!(
                "{} lines exceeds maximum of {}",
                items.len(),
                MAX_CART_ITEMS
            )));
        }

        let mut seen = HashSet::with_capacity(items.len());
        for line in &items {
            validate_product_id(&line.product_id)
                .and_then(|_| validate_line_quantity(line.quantity))
                .and_then(|_| validate_price_cents(line.price.cents()))
                .map_err(|e| CoreError::CorruptCart(format!("{}: {}", line.product_id, e)))?;

            if !seen.insert(line.product_id.as_str()) {
                return Err(CoreError::CorruptCart(format!(
                    "duplicate product_id {}",
                    line.product_id
                )));
            }
        }

        let cart = Cart(items);
        cart.checked_total()
            .map_err(|e| CoreError::CorruptCart(e.to_string()))?;

        Ok(cart)
    }
}

/// Cart totals for the cart badge and checkout footer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartSummary {
    /// Distinct lines.
    pub item_count: usize,
    pub total_quantity: i64,
    pub total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
