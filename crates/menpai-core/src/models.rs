//! Data model for the address registry query engine.
//!
//! `AddressRecord` maps the `addresses` table; the remaining types are
//! transient request/response shapes. The core never writes — records are
//! produced by an offline importer and queried here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::config::{AppConfig, DEFAULT_NEARBY_LIMIT, DEFAULT_PAGE_SIZE, DEFAULT_RADIUS_M};
use crate::error::{Error, Result};
use crate::paging::PageInfo;

/// One physical address entry from the `addresses` table.
///
/// `district`, `village`, and `neighborhood` are always present for a
/// persisted row; the street-level fragments are optional free text.
/// `full_address` is the derived concatenation maintained by the write path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AddressRecord {
    pub id: i64,
    pub district: String,
    pub village: String,
    pub neighborhood: i32,
    pub street: Option<String>,
    pub area: Option<String>,
    pub lane: Option<String>,
    pub alley: Option<String>,
    pub number: Option<String>,
    /// Longitude (WGS84). Absent when the source row had no coordinate.
    pub x_coord: Option<f64>,
    /// Latitude (WGS84).
    pub y_coord: Option<f64>,
    pub full_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AddressRecord {
    /// Whether both coordinates are present.
    pub fn has_coordinates(&self) -> bool {
        self.x_coord.is_some() && self.y_coord.is_some()
    }
}

/// An address together with its distance from a geo-search query point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressHit {
    #[serde(flatten)]
    pub record: AddressRecord,
    /// Distance from the query point in meters, rounded to 2 decimals.
    pub distance_m: f64,
}

/// Free-text / hierarchy search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text term matched case-insensitively against `full_address`.
    pub q: Option<String>,
    /// Exact district filter.
    pub district: Option<String>,
    /// Exact village filter.
    pub village: Option<String>,
    /// Substring filter matched against street OR area.
    pub street: Option<String>,
    pub page: i64,
    pub per_page: i64,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            q: None,
            district: None,
            village: None,
            street: None,
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchRequest {
    /// Check pagination bounds against configured policy.
    pub fn validate(&self, config: &AppConfig) -> Result<()> {
        if self.page < 1 {
            return Err(Error::Validation(format!(
                "page must be >= 1, got {}",
                self.page
            )));
        }
        if self.per_page < 1 || self.per_page > config.max_page_size {
            return Err(Error::Validation(format!(
                "per_page must be between 1 and {}, got {}",
                config.max_page_size, self.per_page
            )));
        }
        Ok(())
    }
}

/// Geo-search parameters: a query point, a radius, and a result cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoSearchRequest {
    pub lat: f64,
    pub lng: f64,
    /// Search radius in meters.
    pub radius: f64,
    /// Maximum number of results.
    pub limit: i64,
}

impl GeoSearchRequest {
    /// Build a request for the given point with default radius and limit.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            radius: DEFAULT_RADIUS_M,
            limit: DEFAULT_NEARBY_LIMIT,
        }
    }

    /// Check the point, radius, and limit against configured bounds.
    pub fn validate(&self, config: &AppConfig) -> Result<()> {
        let geo = &config.geo;
        if self.lat < geo.min_lat || self.lat > geo.max_lat {
            return Err(Error::Validation(format!(
                "lat must be between {} and {}, got {}",
                geo.min_lat, geo.max_lat, self.lat
            )));
        }
        if self.lng < geo.min_lng || self.lng > geo.max_lng {
            return Err(Error::Validation(format!(
                "lng must be between {} and {}, got {}",
                geo.min_lng, geo.max_lng, self.lng
            )));
        }
        if self.radius < config.min_radius_m || self.radius > config.max_radius_m {
            return Err(Error::Validation(format!(
                "radius must be between {} and {} meters, got {}",
                config.min_radius_m, config.max_radius_m, self.radius
            )));
        }
        if self.limit < 1 || self.limit > config.max_nearby_limit {
            return Err(Error::Validation(format!(
                "limit must be between 1 and {}, got {}",
                config.max_nearby_limit, self.limit
            )));
        }
        Ok(())
    }
}

/// One page of search results plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    pub addresses: Vec<AddressRecord>,
    pub pagination: PageInfo,
}

/// Aggregate counts at a hierarchy level.
///
/// The optional fields echo the scope of the request: a district summary
/// carries `village_count` and `neighborhood_count`, a village summary only
/// `neighborhood_count`, a neighborhood summary neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub village: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub village_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighborhood_count: Option<i64>,
    pub address_count: i64,
}

/// Summary plus the full record list for one neighborhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodDetail {
    pub summary: StatSummary,
    pub addresses: Vec<AddressRecord>,
}

/// Registry-wide totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalStats {
    pub addresses: i64,
    pub districts: i64,
    /// Distinct (district, village) pairs.
    pub villages: i64,
    /// Distinct (district, village, neighborhood) triples.
    pub neighborhoods: i64,
}

/// Per-district aggregate counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictStats {
    pub district: String,
    pub village_count: i64,
    pub neighborhood_count: i64,
    pub address_count: i64,
}

/// Global totals plus a per-district breakdown ordered by district name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewStats {
    pub total_stats: TotalStats,
    pub district_breakdown: Vec<DistrictStats>,
}

/// Column headers for exported rows, in fixed order.
pub const EXPORT_HEADERS: [&str; 11] = [
    "區",
    "村里",
    "鄰",
    "街路段",
    "地區",
    "巷",
    "弄",
    "號",
    "橫座標",
    "縱座標",
    "完整地址",
];

/// Filters echoed back with an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFilters {
    pub district: Option<String>,
    pub village: Option<String>,
}

/// CSV-shaped export: fixed headers, stringly-typed rows, and the applied
/// filters. Absent optional fragments are rendered as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub data: Vec<Vec<String>>,
    pub total_rows: usize,
    pub filters: ExportFilters,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::new("postgres://localhost/addresses")
    }

    fn record() -> AddressRecord {
        AddressRecord {
            id: 1,
            district: "中西區".to_string(),
            village: "赤崁里".to_string(),
            neighborhood: 1,
            street: Some("民族路二段".to_string()),
            area: None,
            lane: Some("317巷".to_string()),
            alley: None,
            number: Some("2號".to_string()),
            x_coord: Some(120.206001),
            y_coord: Some(22.997564),
            full_address: "民族路二段317巷2號".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_coordinates() {
        let mut rec = record();
        assert!(rec.has_coordinates());
        rec.y_coord = None;
        assert!(!rec.has_coordinates());
    }

    #[test]
    fn test_search_request_defaults() {
        let req = SearchRequest::default();
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, 20);
        assert!(req.validate(&config()).is_ok());
    }

    #[test]
    fn test_search_request_rejects_page_zero() {
        let req = SearchRequest {
            page: 0,
            ..Default::default()
        };
        let err = req.validate(&config()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_search_request_rejects_oversized_page() {
        let req = SearchRequest {
            per_page: 101,
            ..Default::default()
        };
        assert!(req.validate(&config()).is_err());

        let req = SearchRequest {
            per_page: 100,
            ..Default::default()
        };
        assert!(req.validate(&config()).is_ok());
    }

    #[test]
    fn test_geo_request_defaults() {
        let req = GeoSearchRequest::new(22.997564, 120.206001);
        assert_eq!(req.radius, 1000.0);
        assert_eq!(req.limit, 50);
        assert!(req.validate(&config()).is_ok());
    }

    #[test]
    fn test_geo_request_rejects_out_of_box_point() {
        let req = GeoSearchRequest::new(35.6762, 139.6503);
        assert!(req.validate(&config()).unwrap_err().is_validation());

        let req = GeoSearchRequest::new(22.9, 118.0);
        assert!(req.validate(&config()).is_err());
    }

    #[test]
    fn test_geo_request_radius_bounds() {
        let mut req = GeoSearchRequest::new(22.99, 120.20);
        req.radius = 9.9;
        assert!(req.validate(&config()).is_err());
        req.radius = 10.0;
        assert!(req.validate(&config()).is_ok());
        req.radius = 10_000.0;
        assert!(req.validate(&config()).is_ok());
        req.radius = 10_000.1;
        assert!(req.validate(&config()).is_err());
    }

    #[test]
    fn test_geo_request_limit_bounds() {
        let mut req = GeoSearchRequest::new(22.99, 120.20);
        req.limit = 0;
        assert!(req.validate(&config()).is_err());
        req.limit = 100;
        assert!(req.validate(&config()).is_ok());
        req.limit = 101;
        assert!(req.validate(&config()).is_err());
    }

    #[test]
    fn test_address_hit_serializes_flat() {
        let hit = AddressHit {
            record: record(),
            distance_m: 123.45,
        };
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["district"], "中西區");
        assert_eq!(json["distance_m"], 123.45);
    }

    #[test]
    fn test_export_headers_order() {
        assert_eq!(EXPORT_HEADERS[0], "區");
        assert_eq!(EXPORT_HEADERS[10], "完整地址");
        assert_eq!(EXPORT_HEADERS.len(), 11);
    }
}
