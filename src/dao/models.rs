use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Platforms a listing can be sold for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Desktop (Steam keys).
    Pc,
    /// PlayStation 4.
    Ps4,
    /// PlayStation 5.
    Ps5,
    /// Xbox family consoles.
    Xbox,
}

impl Platform {
    /// Every platform, in display order.
    pub const ALL: [Platform; 4] = [Platform::Pc, Platform::Ps4, Platform::Ps5, Platform::Xbox];

    /// Stable lowercase identifier used in storage and query keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Pc => "pc",
            Platform::Ps4 => "ps4",
            Platform::Ps5 => "ps5",
            Platform::Xbox => "xbox",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted form of an image: a URL the content can be fetched from directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRef {
    /// Directly usable URL (absolute, or relative to this service for uploaded blobs).
    pub url: String,
}

/// Game listing persisted by the record store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Caller-assigned identifier, unique across the store.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Long-form description shown on the detail view.
    pub description: String,
    /// Platform the listing is sold for.
    pub platform: Platform,
    /// Optional embeddable trailer URL.
    pub trailer_url: Option<String>,
    /// Cover image reference.
    pub image: ImageRef,
    /// Price in the smallest display unit, currency-agnostic.
    pub price: u64,
    /// Whether the listing is currently on sale.
    pub on_sale: bool,
}

/// Opaque caller identity issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Wrap a raw principal string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw principal string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Self-service profile owned by a single caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfileEntity {
    /// Display name chosen by the caller.
    pub name: String,
}

/// Authoritative role attached to a caller identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// May use the admin panel and assign roles.
    Admin,
    /// Regular signed-in customer.
    User,
    /// Anonymous or restricted caller.
    Guest,
}

impl UserRole {
    /// Stable lowercase identifier used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
            UserRole::Guest => "guest",
        }
    }
}
