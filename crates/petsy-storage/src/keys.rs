//! Storage keys used by the session store.
//!
//! | Key                 | Value                                    |
//! |---------------------|------------------------------------------|
//! | `auth_token`        | raw bearer token                         |
//! | `language`          | `en` / `ar`                              |
//! | `@petsy_theme_mode` | `light` / `dark` / `system`              |
//! | `cart`              | JSON array of line items, price in cents |
//!
//! These match the keys existing installs of the mobile client already hold.

pub const AUTH_TOKEN: &str = "auth_token";
pub const LANGUAGE: &str = "language";
pub const THEME_MODE: &str = "@petsy_theme_mode";
pub const CART: &str = "cart";
