//! # menpai-core
//!
//! Core types and pure query logic for the menpai address registry query
//! engine: the error taxonomy, immutable configuration, request/response
//! models, pagination math, and the natural address ordering.
//!
//! Everything here is store-independent; the PostgreSQL layer lives in
//! `menpai-db`.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod natural_sort;
pub mod paging;

// Re-export commonly used types at crate root
pub use config::{AppConfig, GeoBounds, PoolSettings};
pub use error::{Error, Result};
pub use models::{
    AddressHit, AddressRecord, DistrictStats, ExportFilters, ExportTable, GeoSearchRequest,
    NeighborhoodDetail, OverviewStats, ResultPage, SearchRequest, StatSummary, TotalStats,
    EXPORT_HEADERS,
};
pub use natural_sort::{leading_number, sort_addresses, AddressSortKey, NON_NUMERIC_SENTINEL};
pub use paging::PageInfo;
