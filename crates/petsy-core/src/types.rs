//! # Domain Types
//!
//! Records the session store holds on behalf of the screens.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │       Pet       │   │     Locale      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, email      │   │  id, name       │   │  En  (LTR)      │       │
//! │  │  name, role     │   │  species        │   │  Ar  (RTL)      │       │
//! │  │  is_admin       │   │  owner_id       │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │      Role       │   │    ThemeMode    │                              │
//! │  │  user, vet      │   │  light, dark    │                              │
//! │  │  market_owner   │   │  system         │                              │
//! │  │  care_clinic    │   └─────────────────┘                              │
//! │  │  admin          │                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `User` and `Pet` arrive as JSON from the REST backend; their field names
//! match the wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Role
// =============================================================================

/// Account role assigned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular marketplace user.
    #[default]
    User,
    /// Veterinarian offering appointments.
    Vet,
    /// Shop owner listing products.
    MarketOwner,
    /// Care clinic handling care requests.
    CareClinic,
    /// Administrator with dashboard access.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Vet => "vet",
            Role::MarketOwner => "market_owner",
            Role::CareClinic => "care_clinic",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Locale
// =============================================================================

/// Text direction implied by a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Ltr,
    Rtl,
}

/// Display language.
///
/// ## Persistence
/// Stored as `"en"` / `"ar"`. Anything else read back from storage falls
/// back to [`Locale::En`] via [`Locale::parse_or_default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English (left-to-right). The default.
    #[default]
    En,
    /// Arabic (right-to-left).
    Ar,
}

impl Locale {
    /// Wire/storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ar => "ar",
        }
    }

    /// Text direction for layout code.
    pub fn direction(&self) -> TextDirection {
        match self {
            Locale::En => TextDirection::Ltr,
            Locale::Ar => TextDirection::Rtl,
        }
    }

    #[inline]
    pub fn is_rtl(&self) -> bool {
        self.direction() == TextDirection::Rtl
    }

    /// Parses a stored value, falling back to English.
    ///
    /// ## Example
    /// ```rust
    /// use petsy_core::Locale;
    ///
    /// assert_eq!(Locale::parse_or_default("ar"), Locale::Ar);
    /// assert_eq!(Locale::parse_or_default("fr"), Locale::En);
    /// ```
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "ar" => Ok(Locale::Ar),
            _ => Err(ValidationError::NotAllowed {
                field: "language".to_string(),
                allowed: vec!["en".to_string(), "ar".to_string()],
            }),
        }
    }
}

// =============================================================================
// Theme Mode
// =============================================================================

/// Colour scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    /// Follow the OS colour scheme.
    #[default]
    System,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
            ThemeMode::System => "system",
        }
    }

    /// Resolves the effective scheme given the OS preference.
    pub fn is_dark(&self, system_prefers_dark: bool) -> bool {
        match self {
            ThemeMode::Light => false,
            ThemeMode::Dark => true,
            ThemeMode::System => system_prefers_dark,
        }
    }

    /// The explicit mode a "toggle" switch lands on.
    ///
    /// Toggling always leaves `System`: the opposite of whatever is
    /// currently displayed becomes the stored preference.
    pub fn toggled(&self, system_prefers_dark: bool) -> Self {
        if self.is_dark(system_prefers_dark) {
            ThemeMode::Light
        } else {
            ThemeMode::Dark
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            "system" => Ok(ThemeMode::System),
            _ => Err(ValidationError::NotAllowed {
                field: "theme_mode".to_string(),
                allowed: vec!["light".to_string(), "dark".to_string(), "system".to_string()],
            }),
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// The signed-in account, as returned by `/auth/login` and `/auth/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String,
    /// Display name.
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    /// Short shareable code used for friend requests.
    #[serde(default)]
    pub user_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    /// Avatar URL or data URI.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Preferred language on the account (independent of the device locale).
    #[serde(default)]
    pub language: Locale,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Admin flag or admin role both grant dashboard access.
    pub fn has_admin_access(&self) -> bool {
        self.is_admin || self.role == Role::Admin
    }
}

// =============================================================================
// Pet
// =============================================================================

/// A pet listing owned by the signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Pet {
    pub id: String,
    pub name: String,
    pub species: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
    pub gender: String,
    #[serde(default)]
    pub color: Option<String>,
    /// Kilograms.
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// Listing status (`for_adoption`, `for_sale`, `lost`, ...).
    pub status: String,
    /// Asking price as published by the backend; display only.
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub vaccinated: bool,
    #[serde(default)]
    pub neutered: bool,
    pub owner_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub views: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
