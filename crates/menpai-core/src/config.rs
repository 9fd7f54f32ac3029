//! Application configuration.
//!
//! An `AppConfig` is built once at startup (typically from the environment)
//! and passed by reference into the database layer. It is immutable for the
//! process lifetime; there is no ambient global settings object.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default page size for paginated search.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size a caller may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Default geo-search radius in meters.
pub const DEFAULT_RADIUS_M: f64 = 1000.0;

/// Minimum geo-search radius in meters.
pub const MIN_RADIUS_M: f64 = 10.0;

/// Maximum geo-search radius in meters.
pub const MAX_RADIUS_M: f64 = 10_000.0;

/// Default geo-search result limit.
pub const DEFAULT_NEARBY_LIMIT: i64 = 50;

/// Maximum geo-search result limit.
pub const MAX_NEARBY_LIMIT: i64 = 100;

/// Default export row limit.
pub const DEFAULT_EXPORT_LIMIT: i64 = 1000;

/// Maximum export row limit.
pub const MAX_EXPORT_LIMIT: i64 = 10_000;

/// Default number of pooled connections.
pub const DEFAULT_POOL_SIZE: u32 = 5;

/// Default pool overflow headroom above `DEFAULT_POOL_SIZE`.
pub const DEFAULT_POOL_MAX_OVERFLOW: u32 = 10;

/// Default pool acquisition timeout in seconds.
pub const DEFAULT_POOL_TIMEOUT_SECS: u64 = 30;

/// Geographic bounding box for accepted query coordinates (WGS84 degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl GeoBounds {
    /// Bounding box covering Taiwan, the deployment region of the registry.
    pub fn taiwan() -> Self {
        Self {
            min_lat: 21.8,
            max_lat: 25.3,
            min_lng: 119.3,
            max_lng: 122.0,
        }
    }

    /// Whether a (lat, lng) pair falls inside the box.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::taiwan()
    }
}

/// Connection pool sizing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSettings {
    /// Base number of pooled connections.
    pub size: u32,
    /// Additional connections allowed above `size` under load.
    pub max_overflow: u32,
    /// Acquisition timeout in seconds.
    pub acquire_timeout_secs: u64,
}

impl PoolSettings {
    /// Hard cap on concurrently open connections.
    pub fn max_connections(&self) -> u32 {
        self.size + self.max_overflow
    }

    /// Acquisition timeout as a `Duration`.
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            size: DEFAULT_POOL_SIZE,
            max_overflow: DEFAULT_POOL_MAX_OVERFLOW,
            acquire_timeout_secs: DEFAULT_POOL_TIMEOUT_SECS,
        }
    }
}

/// Immutable application configuration, constructed once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Connection pool sizing.
    pub pool: PoolSettings,
    /// Default page size when a search request leaves it unset.
    pub default_page_size: i64,
    /// Largest page size a caller may request.
    pub max_page_size: i64,
    /// Accepted coordinate box for geo search.
    pub geo: GeoBounds,
    /// Geo-search radius bounds in meters.
    pub min_radius_m: f64,
    pub max_radius_m: f64,
    pub default_radius_m: f64,
    /// Geo-search result limit bounds.
    pub default_nearby_limit: i64,
    pub max_nearby_limit: i64,
    /// Export row limit bounds.
    pub default_export_limit: i64,
    pub max_export_limit: i64,
}

impl AppConfig {
    /// Build a configuration with policy defaults for the given store URL.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            pool: PoolSettings::default(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            geo: GeoBounds::taiwan(),
            min_radius_m: MIN_RADIUS_M,
            max_radius_m: MAX_RADIUS_M,
            default_radius_m: DEFAULT_RADIUS_M,
            default_nearby_limit: DEFAULT_NEARBY_LIMIT,
            max_nearby_limit: MAX_NEARBY_LIMIT,
            default_export_limit: DEFAULT_EXPORT_LIMIT,
            max_export_limit: MAX_EXPORT_LIMIT,
        }
    }

    /// Build a configuration from the environment.
    ///
    /// `DATABASE_URL` is required. Pool sizing may be overridden through
    /// `DB_POOL_SIZE`, `DB_MAX_OVERFLOW`, and `DB_POOL_TIMEOUT`. Callers
    /// that want `.env` support should run `dotenvy::dotenv()` first.
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| Error::Config("DATABASE_URL is not set".to_string()))?;

        let mut config = Self::new(database_url);

        if let Some(size) = read_env_var::<u32>("DB_POOL_SIZE")? {
            config.pool.size = size;
        }
        if let Some(overflow) = read_env_var::<u32>("DB_MAX_OVERFLOW")? {
            config.pool.max_overflow = overflow;
        }
        if let Some(timeout) = read_env_var::<u64>("DB_POOL_TIMEOUT")? {
            config.pool.acquire_timeout_secs = timeout;
        }

        Ok(config)
    }
}

fn read_env_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} has invalid value '{}'", name, raw))),
        Err(_) => Ok(None),
    }
}
