//! Application-level configuration loading: storage backend, catalog layout, contact link and
//! the admins seeded on first start.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::models::Principal;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GAME_STOREFRONT_CONFIG_PATH";
const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
const DEFAULT_ROW_SIZE: usize = 4;
const DEFAULT_CONFIRMATION_TTL_SECS: u64 = 120;
const DEFAULT_QUERY_CACHE_TTL_SECS: u64 = 30;
const DEFAULT_IMAGE_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Which record store backend the storage supervisor connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local store, lost on restart.
    Memory,
    /// MongoDB database.
    Mongo {
        /// Connection string.
        uri: String,
        /// Database name; the backend default is used when absent.
        database: Option<String>,
    },
}

/// Settings for the outbound "buy now" messaging link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactConfig {
    /// Phone number in international format without `+`.
    pub phone_number: String,
    /// Price label, `{price}` is replaced by the integer price.
    pub price_template: String,
    /// Message text, `{name}` and `{price}` (the rendered price label) are replaced.
    pub message_template: String,
}

/// Layout parameters of the catalog view.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    /// Number of games grouped in one horizontally scrollable row.
    pub row_size: usize,
    /// Width of one game card, in CSS pixels.
    pub card_width: f64,
    /// Gap between two cards, in CSS pixels.
    pub card_gap: f64,
    /// Distance from a row edge under which the matching navigation control is hidden.
    pub edge_tolerance: f64,
    /// Viewport width assumed when the client does not report one.
    pub default_viewport_width: f64,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Record store backend.
    pub storage: StorageBackend,
    /// Outbound contact link settings.
    pub contact: ContactConfig,
    /// Catalog layout.
    pub catalog: CatalogConfig,
    /// Principals granted the admin role when they have no role yet.
    pub bootstrap_admins: Vec<Principal>,
    /// Path prefix under which uploaded blobs are served.
    pub blob_base_url: String,
    /// Lifetime of a delete confirmation token.
    pub delete_confirmation_ttl: Duration,
    /// Lifetime of a cached query result.
    pub query_cache_ttl: Duration,
    /// Overall timeout of an outbound image fetch.
    pub image_fetch_timeout: Duration,
    /// Largest image body read from a remote URL.
    pub max_image_bytes: u64,
}

impl AppConfig {
    /// Load the application configuration from disk and the environment, falling back to
    /// built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration file");
                    raw.into()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.with_env_overrides()
    }

    /// Apply `STORAGE_BACKEND`, `MONGO_URI` and `MONGO_DB` on top of the file configuration.
    fn with_env_overrides(mut self) -> Self {
        let backend = env::var("STORAGE_BACKEND").ok();
        let uri = env::var("MONGO_URI").ok();
        let database = env::var("MONGO_DB").ok();

        match backend.as_deref() {
            Some("memory") => self.storage = StorageBackend::Memory,
            Some("mongo") => {
                self.storage = StorageBackend::Mongo {
                    uri: uri.clone().unwrap_or_else(|| DEFAULT_MONGO_URI.into()),
                    database: database.clone(),
                }
            }
            Some(other) => warn!(value = other, "unknown STORAGE_BACKEND; keeping configured backend"),
            None => {}
        }

        if let StorageBackend::Mongo {
            uri: current_uri,
            database: current_db,
        } = &mut self.storage
        {
            if let Some(uri) = uri {
                *current_uri = uri;
            }
            if database.is_some() {
                *current_db = database;
            }
        }

        self
    }

    /// Whether `principal` is listed as a bootstrap admin.
    pub fn is_bootstrap_admin(&self, principal: &Principal) -> bool {
        self.bootstrap_admins.contains(principal)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Memory,
            contact: ContactConfig::default(),
            catalog: CatalogConfig::default(),
            bootstrap_admins: Vec::new(),
            blob_base_url: "/blobs".into(),
            delete_confirmation_ttl: Duration::from_secs(DEFAULT_CONFIRMATION_TTL_SECS),
            query_cache_ttl: Duration::from_secs(DEFAULT_QUERY_CACHE_TTL_SECS),
            image_fetch_timeout: Duration::from_secs(DEFAULT_IMAGE_FETCH_TIMEOUT_SECS),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            phone_number: "910000000000".into(),
            price_template: "₹{price}/- only".into(),
            message_template: "Hi! I'm interested in buying {name} for {price}".into(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            row_size: DEFAULT_ROW_SIZE,
            card_width: 280.0,
            card_gap: 24.0,
            edge_tolerance: 1.0,
            default_viewport_width: 1280.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    storage: Option<RawStorage>,
    contact: Option<RawContact>,
    catalog: Option<RawCatalog>,
    bootstrap_admins: Vec<String>,
    blob_base_url: Option<String>,
    delete_confirmation_ttl_secs: Option<u64>,
    query_cache_ttl_secs: Option<u64>,
    image_fetch_timeout_secs: Option<u64>,
    max_image_bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
enum RawStorage {
    Memory,
    Mongo {
        uri: Option<String>,
        database: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct RawContact {
    phone_number: Option<String>,
    price_template: Option<String>,
    message_template: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    row_size: Option<usize>,
    card_width: Option<f64>,
    card_gap: Option<f64>,
    edge_tolerance: Option<f64>,
    default_viewport_width: Option<f64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();

        let storage = match value.storage {
            Some(RawStorage::Memory) | None => StorageBackend::Memory,
            Some(RawStorage::Mongo { uri, database }) => StorageBackend::Mongo {
                uri: uri.unwrap_or_else(|| DEFAULT_MONGO_URI.into()),
                database,
            },
        };

        let contact = match value.contact {
            Some(raw) => ContactConfig {
                phone_number: raw.phone_number.unwrap_or(defaults.contact.phone_number),
                price_template: raw.price_template.unwrap_or(defaults.contact.price_template),
                message_template: raw
                    .message_template
                    .unwrap_or(defaults.contact.message_template),
            },
            None => defaults.contact,
        };

        let catalog = match value.catalog {
            Some(raw) => {
                let row_size = match raw.row_size {
                    Some(0) => {
                        warn!("catalog.row_size must be positive; using default");
                        DEFAULT_ROW_SIZE
                    }
                    Some(size) => size,
                    None => DEFAULT_ROW_SIZE,
                };
                CatalogConfig {
                    row_size,
                    card_width: raw.card_width.unwrap_or(defaults.catalog.card_width),
                    card_gap: raw.card_gap.unwrap_or(defaults.catalog.card_gap),
                    edge_tolerance: raw
                        .edge_tolerance
                        .unwrap_or(defaults.catalog.edge_tolerance),
                    default_viewport_width: raw
                        .default_viewport_width
                        .unwrap_or(defaults.catalog.default_viewport_width),
                }
            }
            None => defaults.catalog,
        };

        Self {
            storage,
            contact,
            catalog,
            bootstrap_admins: value.bootstrap_admins.into_iter().map(Principal::new).collect(),
            blob_base_url: value.blob_base_url.unwrap_or(defaults.blob_base_url),
            delete_confirmation_ttl: value
                .delete_confirmation_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.delete_confirmation_ttl),
            query_cache_ttl: value
                .query_cache_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.query_cache_ttl),
            image_fetch_timeout: value
                .image_fetch_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.image_fetch_timeout),
            max_image_bytes: value.max_image_bytes.unwrap_or(defaults.max_image_bytes),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AppConfig {
        serde_json::from_str::<RawConfig>(json).unwrap().into()
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse("{}");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.catalog.row_size, 4);
        assert_eq!(config.blob_base_url, "/blobs");
        assert!(config.bootstrap_admins.is_empty());
    }

    #[test]
    fn mongo_backend_and_admins_are_read() {
        let config = parse(
            r#"{
                "storage": {"backend": "mongo", "uri": "mongodb://db:27017"},
                "bootstrap_admins": ["owner-principal"],
                "delete_confirmation_ttl_secs": 30
            }"#,
        );
        assert_eq!(
            config.storage,
            StorageBackend::Mongo {
                uri: "mongodb://db:27017".into(),
                database: None
            }
        );
        assert!(config.is_bootstrap_admin(&Principal::new("owner-principal")));
        assert!(!config.is_bootstrap_admin(&Principal::new("someone-else")));
        assert_eq!(config.delete_confirmation_ttl, Duration::from_secs(30));
    }

    #[test]
    fn cache_and_image_limits_are_read() {
        let config = parse(
            r#"{"query_cache_ttl_secs": 5, "image_fetch_timeout_secs": 2, "max_image_bytes": 1024}"#,
        );
        assert_eq!(config.query_cache_ttl, Duration::from_secs(5));
        assert_eq!(config.image_fetch_timeout, Duration::from_secs(2));
        assert_eq!(config.max_image_bytes, 1024);
        assert_eq!(parse("{}").max_image_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn zero_row_size_falls_back_to_default() {
        let config = parse(r#"{"catalog": {"row_size": 0, "card_width": 200.0}}"#);
        assert_eq!(config.catalog.row_size, 4);
        assert_eq!(config.catalog.card_width, 200.0);
    }

    #[test]
    fn partial_contact_keeps_default_templates() {
        let config = parse(r#"{"contact": {"phone_number": "15550001111"}}"#);
        assert_eq!(config.contact.phone_number, "15550001111");
        assert_eq!(config.contact.price_template, ContactConfig::default().price_template);
    }
}
