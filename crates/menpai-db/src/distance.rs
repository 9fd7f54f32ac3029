//! Distance evaluation for geo search.
//!
//! Two interchangeable strategies compute the distance between the query
//! point and stored coordinates:
//!
//! 1. **Spatial index** — requires PostGIS. Reprojects the stored geometry
//!    and the query point into TWD97 / TM2 (SRID 3826), a meter-based
//!    planar projection for Taiwan, then filters with `ST_DWithin` and
//!    orders by `ST_Distance`.
//! 2. **Haversine** — always available. Great-circle distance over the raw
//!    `x_coord`/`y_coord` pair with Earth radius 6 371 000 m, evaluated in
//!    SQL so filtering and ordering stay in the store.
//!
//! The PostGIS capability is probed once per process. A spatial query
//! failure after a positive probe still falls back to the formula strategy
//! for that call; this is the only place in the system where an error is
//! swallowed. Rows without coordinates are excluded by both strategies.

use std::time::Instant;

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use menpai_core::{AddressHit, AddressRecord, Error, GeoSearchRequest, Result};

/// Mean Earth radius in meters, as used by the formula strategy.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// SRID of the planar projection used by the spatial strategy
/// (TWD97 / TM2 zone 121, meter-based, suitable for Taiwan).
pub const PLANAR_SRID: i32 = 3826;

const SPATIAL_SQL: &str = r#"
SELECT id, district, village, neighborhood, street, area, lane, alley, number,
       x_coord, y_coord, full_address, created_at, updated_at,
       ST_Distance(
           ST_Transform(geom, 3826),
           ST_Transform(ST_SetSRID(ST_MakePoint($2, $1), 4326), 3826)
       ) AS distance
FROM addresses
WHERE geom IS NOT NULL
  AND ST_DWithin(
      ST_Transform(geom, 3826),
      ST_Transform(ST_SetSRID(ST_MakePoint($2, $1), 4326), 3826),
      $3
  )
ORDER BY distance
LIMIT $4
"#;

// LEAST() keeps the ASIN argument inside its domain when rounding pushes
// the radicand a hair above 1 for near-identical points.
const HAVERSINE_SQL: &str = r#"
SELECT id, district, village, neighborhood, street, area, lane, alley, number,
       x_coord, y_coord, full_address, created_at, updated_at,
       (
           6371000 * 2 * ASIN(LEAST(1.0, SQRT(
               POWER(SIN(RADIANS(y_coord - $1) / 2), 2) +
               COS(RADIANS($1)) * COS(RADIANS(y_coord)) *
               POWER(SIN(RADIANS(x_coord - $2) / 2), 2)
           )))
       ) AS distance
FROM addresses
WHERE x_coord IS NOT NULL AND y_coord IS NOT NULL
  AND (
      6371000 * 2 * ASIN(LEAST(1.0, SQRT(
          POWER(SIN(RADIANS(y_coord - $1) / 2), 2) +
          COS(RADIANS($1)) * COS(RADIANS(y_coord)) *
          POWER(SIN(RADIANS(x_coord - $2) / 2), 2)
      )))
  ) <= $3
ORDER BY distance
LIMIT $4
"#;

/// Which strategy answered a nearby query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceStrategy {
    /// PostGIS reprojection and index-assisted distance.
    Spatial,
    /// Great-circle formula over raw coordinates.
    Haversine,
}

impl DistanceStrategy {
    /// Log field value for this strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceStrategy::Spatial => "spatial",
            DistanceStrategy::Haversine => "haversine",
        }
    }
}

/// Great-circle distance in meters between two WGS84 points.
///
/// Mirrors the SQL formula strategy; used by tests and callers that need
/// an in-process distance.
pub fn haversine_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let radicand = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    EARTH_RADIUS_M * 2.0 * radicand.sqrt().min(1.0).asin()
}

/// Round a distance to 2 decimal places (centimeter precision).
pub fn round_distance(meters: f64) -> f64 {
    (meters * 100.0).round() / 100.0
}

/// Capability-polymorphic distance computation.
pub struct DistanceEvaluator {
    pool: PgPool,
    spatial_support: OnceCell<bool>,
}

impl DistanceEvaluator {
    /// Create a new evaluator over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            spatial_support: OnceCell::new(),
        }
    }

    /// Whether the store has PostGIS and the precomputed geometry column.
    ///
    /// Probed once and cached for the process lifetime; the capability does
    /// not change while the service runs. A probe failure reads as "no
    /// spatial support" so the formula strategy takes over.
    pub async fn has_spatial_support(&self) -> bool {
        *self
            .spatial_support
            .get_or_init(|| async {
                let probe = sqlx::query_scalar::<_, bool>(
                    r#"
                    SELECT EXISTS(SELECT 1 FROM pg_extension WHERE extname = 'postgis')
                       AND EXISTS(
                           SELECT 1 FROM information_schema.columns
                           WHERE table_name = 'addresses' AND column_name = 'geom'
                       )
                    "#,
                )
                .fetch_one(&self.pool)
                .await;

                match probe {
                    Ok(available) => {
                        debug!(
                            subsystem = "distance",
                            component = "evaluator",
                            op = "probe",
                            spatial = available,
                            "Spatial capability probe"
                        );
                        available
                    }
                    Err(e) => {
                        warn!(
                            subsystem = "distance",
                            component = "evaluator",
                            op = "probe",
                            error = %e,
                            "Spatial capability probe failed, using haversine"
                        );
                        false
                    }
                }
            })
            .await
    }

    /// Find addresses within `radius` meters of the query point, nearest
    /// first, capped at the request limit. Distances are rounded to 2
    /// decimals. The request is assumed validated by the caller.
    pub async fn nearby(&self, request: &GeoSearchRequest) -> Result<Vec<AddressHit>> {
        let start = Instant::now();

        if self.has_spatial_support().await {
            match self.run_query(SPATIAL_SQL, request).await {
                Ok(hits) => {
                    debug!(
                        subsystem = "distance",
                        component = "evaluator",
                        op = "nearby",
                        distance_strategy = DistanceStrategy::Spatial.as_str(),
                        result_count = hits.len(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Nearby search complete"
                    );
                    return Ok(hits);
                }
                Err(e) => {
                    // The one intentional swallow: retry with the portable
                    // strategy instead of surfacing the spatial failure.
                    warn!(
                        subsystem = "distance",
                        component = "evaluator",
                        op = "nearby",
                        error = %e,
                        "Spatial query failed, falling back to haversine"
                    );
                }
            }
        }

        let hits = self.run_query(HAVERSINE_SQL, request).await?;
        debug!(
            subsystem = "distance",
            component = "evaluator",
            op = "nearby",
            distance_strategy = DistanceStrategy::Haversine.as_str(),
            result_count = hits.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Nearby search complete"
        );
        Ok(hits)
    }

    async fn run_query(&self, sql: &str, request: &GeoSearchRequest) -> Result<Vec<AddressHit>> {
        let rows = sqlx::query(sql)
            .bind(request.lat)
            .bind(request.lng)
            .bind(request.radius)
            .bind(request.limit)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        rows.iter().map(hit_from_row).collect()
    }
}

fn hit_from_row(row: &PgRow) -> Result<AddressHit> {
    let record = AddressRecord::from_row(row).map_err(Error::Database)?;
    let distance: f64 = row.try_get("distance").map_err(Error::Database)?;
    Ok(AddressHit {
        record,
        distance_m: round_distance(distance),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        assert_eq!(haversine_meters(22.99, 120.20, 22.99, 120.20), 0.0);
    }

    #[test]
    fn test_known_pair_magnitude() {
        // Chihkan Tower to the Tainan Confucius Temple, roughly 500 m
        let d = haversine_meters(22.9975, 120.2025, 22.9907, 120.2043);
        assert!(d > 500.0 && d < 1000.0, "got {}", d);
    }

    #[test]
    fn test_symmetry() {
        let a = haversine_meters(22.99, 120.20, 23.01, 120.25);
        let b = haversine_meters(23.01, 120.25, 22.99, 120.20);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_one_degree_latitude() {
        // One degree of latitude is ~111.2 km everywhere on the sphere
        let d = haversine_meters(22.0, 120.0, 23.0, 120.0);
        assert!((d - 111_195.0).abs() < 100.0, "got {}", d);
    }

    #[test]
    fn test_round_distance() {
        assert_eq!(round_distance(123.456), 123.46);
        assert_eq!(round_distance(123.454), 123.45);
        assert_eq!(round_distance(0.0), 0.0);
    }

    #[test]
    fn test_strategy_labels() {
        assert_eq!(DistanceStrategy::Spatial.as_str(), "spatial");
        assert_eq!(DistanceStrategy::Haversine.as_str(), "haversine");
    }

    #[test]
    fn test_sql_strategies_exclude_null_coordinates() {
        assert!(SPATIAL_SQL.contains("geom IS NOT NULL"));
        assert!(HAVERSINE_SQL.contains("x_coord IS NOT NULL AND y_coord IS NOT NULL"));
    }
}
