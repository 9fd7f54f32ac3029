//! # menpai-db
//!
//! PostgreSQL query layer for the menpai address registry.
//!
//! This crate provides:
//! - Connection pool management
//! - The address query repository (hierarchy listings, search, export,
//!   overview statistics)
//! - The injection-safe search filter compiler
//! - Capability-polymorphic distance evaluation (PostGIS with transparent
//!   haversine fallback)
//!
//! ## Example
//!
//! ```rust,ignore
//! use menpai_core::{AppConfig, SearchRequest};
//! use menpai_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let db = Database::connect(&config).await?;
//!
//!     let page = db
//!         .addresses
//!         .search(&SearchRequest {
//!             district: Some("中西區".to_string()),
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("{} matches", page.pagination.total);
//!     Ok(())
//! }
//! ```

pub mod addresses;
pub mod distance;
pub mod filter;
pub mod pool;

// Re-export core types
pub use menpai_core::*;

pub use addresses::PgAddressRepository;
pub use distance::{
    haversine_meters, round_distance, DistanceEvaluator, DistanceStrategy, EARTH_RADIUS_M,
    PLANAR_SRID,
};
pub use filter::{escape_like, AddressFilter, FilterQueryBuilder, QueryParam};
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};

/// Combined database context: the pool plus the query repository.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::PgPool,
    /// Address query repository.
    pub addresses: PgAddressRepository,
}

impl Database {
    /// Create a Database from an existing pool and configuration.
    pub fn new(pool: sqlx::PgPool, config: AppConfig) -> Self {
        Self {
            addresses: PgAddressRepository::new(pool.clone(), config),
            pool,
        }
    }

    /// Connect using the configured URL and pool sizing.
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let pool = create_pool(&config.database_url, &config.pool).await?;
        Ok(Self::new(pool, config.clone()))
    }

    /// Connect with explicit pool options.
    pub async fn connect_with_config(config: &AppConfig, pool_config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(&config.database_url, pool_config).await?;
        Ok(Self::new(pool, config.clone()))
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}
