//! Address query repository.
//!
//! Implements every public query operation over the `addresses` table:
//! hierarchy listings, summaries, paginated search, geo search, export,
//! and the overview statistics. All operations are read-only and
//! stateless; store failures propagate untouched, while empty hierarchy
//! keys surface as `Error::NotFound`.

use std::time::Instant;

use sqlx::PgPool;
use tracing::{debug, info};

use menpai_core::{
    sort_addresses, AddressHit, AddressRecord, AppConfig, DistrictStats, Error, ExportFilters,
    ExportTable, GeoSearchRequest, NeighborhoodDetail, OverviewStats, PageInfo, ResultPage,
    Result, SearchRequest, StatSummary, TotalStats, EXPORT_HEADERS,
};

use crate::distance::DistanceEvaluator;
use crate::filter::{bind_params, bind_scalar_params, AddressFilter, FilterQueryBuilder};

/// Column list shared by every record-returning query.
const ADDRESS_COLUMNS: &str = "id, district, village, neighborhood, street, area, lane, alley, \
                               number, x_coord, y_coord, full_address, created_at, updated_at";

/// PostgreSQL implementation of the address query service.
pub struct PgAddressRepository {
    pool: PgPool,
    config: AppConfig,
    distance: DistanceEvaluator,
}

impl PgAddressRepository {
    /// Create a new repository over the given pool and configuration.
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        let distance = DistanceEvaluator::new(pool.clone());
        Self {
            pool,
            config,
            distance,
        }
    }

    /// All distinct district names, lexically ordered.
    ///
    /// An empty store yields an empty vector, not an error.
    pub async fn list_districts(&self) -> Result<Vec<String>> {
        let districts =
            sqlx::query_scalar("SELECT DISTINCT district FROM addresses ORDER BY district")
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(districts)
    }

    /// Distinct villages within a district, lexically ordered.
    pub async fn list_villages(&self, district: &str) -> Result<Vec<String>> {
        let villages: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT village FROM addresses WHERE district = $1 ORDER BY village",
        )
        .bind(district)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        if villages.is_empty() {
            return Err(Error::NotFound(format!(
                "district '{}' does not exist or has no data",
                district
            )));
        }
        Ok(villages)
    }

    /// Distinct neighborhood numbers within a village, ascending.
    pub async fn list_neighborhoods(&self, district: &str, village: &str) -> Result<Vec<i32>> {
        let neighborhoods: Vec<i32> = sqlx::query_scalar(
            "SELECT DISTINCT neighborhood FROM addresses \
             WHERE district = $1 AND village = $2 ORDER BY neighborhood",
        )
        .bind(district)
        .bind(village)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        if neighborhoods.is_empty() {
            return Err(Error::NotFound(format!(
                "village '{}{}' does not exist or has no data",
                district, village
            )));
        }
        Ok(neighborhoods)
    }

    /// Counts of distinct villages, (village, neighborhood) pairs, and rows
    /// within a district.
    pub async fn district_summary(&self, district: &str) -> Result<StatSummary> {
        let (village_count, neighborhood_count, address_count): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(DISTINCT village), \
                    COUNT(DISTINCT CONCAT(village, '-', neighborhood)), \
                    COUNT(*) \
             FROM addresses WHERE district = $1",
        )
        .bind(district)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        if address_count == 0 {
            return Err(Error::NotFound(format!("district '{}' does not exist", district)));
        }

        Ok(StatSummary {
            district: Some(district.to_string()),
            village: None,
            neighborhood: None,
            village_count: Some(village_count),
            neighborhood_count: Some(neighborhood_count),
            address_count,
        })
    }

    /// Distinct neighborhood count and row count within a village.
    pub async fn village_summary(&self, district: &str, village: &str) -> Result<StatSummary> {
        let (neighborhood_count, address_count): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(DISTINCT neighborhood), COUNT(*) \
             FROM addresses WHERE district = $1 AND village = $2",
        )
        .bind(district)
        .bind(village)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        if address_count == 0 {
            return Err(Error::NotFound(format!(
                "village '{}{}' does not exist",
                district, village
            )));
        }

        Ok(StatSummary {
            district: Some(district.to_string()),
            village: Some(village.to_string()),
            neighborhood: None,
            village_count: None,
            neighborhood_count: Some(neighborhood_count),
            address_count,
        })
    }

    /// Row count plus every record of one neighborhood, in natural address
    /// order (street, lane, alley, then house numbers read numerically).
    pub async fn neighborhood_detail(
        &self,
        district: &str,
        village: &str,
        neighborhood: i32,
    ) -> Result<NeighborhoodDetail> {
        let address_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM addresses \
             WHERE district = $1 AND village = $2 AND neighborhood = $3",
        )
        .bind(district)
        .bind(village)
        .bind(neighborhood)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        if address_count == 0 {
            return Err(Error::NotFound(format!(
                "neighborhood '{}{}{}鄰' does not exist",
                district, village, neighborhood
            )));
        }

        let mut addresses: Vec<AddressRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM addresses \
             WHERE district = $1 AND village = $2 AND neighborhood = $3",
            ADDRESS_COLUMNS
        ))
        .bind(district)
        .bind(village)
        .bind(neighborhood)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        sort_addresses(&mut addresses);

        Ok(NeighborhoodDetail {
            summary: StatSummary {
                district: Some(district.to_string()),
                village: Some(village.to_string()),
                neighborhood: Some(neighborhood),
                village_count: None,
                neighborhood_count: None,
                address_count,
            },
            addresses,
        })
    }

    /// Paginated search with optional free-text and hierarchy filters.
    ///
    /// The count query and the data query share one compiled predicate, so
    /// the reported total always matches the filtered set. Zero matches is
    /// success: an empty page with total 0.
    pub async fn search(&self, request: &SearchRequest) -> Result<ResultPage> {
        request.validate(&self.config)?;
        let start = Instant::now();

        let filter = AddressFilter::from_search(request);
        let (where_clause, params) = FilterQueryBuilder::new(filter, 0).build();

        let count_sql = format!("SELECT COUNT(*) FROM addresses WHERE {}", where_clause);
        let total: i64 = bind_scalar_params(sqlx::query_scalar(&count_sql), &params)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let pagination = PageInfo::compute(request.page, request.per_page, total);

        let data_sql = format!(
            "SELECT {} FROM addresses WHERE {} \
             ORDER BY district, village, neighborhood, id \
             LIMIT ${} OFFSET ${}",
            ADDRESS_COLUMNS,
            where_clause,
            params.len() + 1,
            params.len() + 2,
        );
        let addresses: Vec<AddressRecord> = bind_params(sqlx::query_as(&data_sql), &params)
            .bind(request.per_page)
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        info!(
            subsystem = "query",
            component = "addresses",
            op = "search",
            total_count = total,
            result_count = addresses.len(),
            page = request.page,
            duration_ms = start.elapsed().as_millis() as u64,
            "Address search complete"
        );

        Ok(ResultPage {
            addresses,
            pagination,
        })
    }

    /// Addresses within a radius of a query point, nearest first.
    ///
    /// Strategy selection and fallback live in the distance evaluator; rows
    /// without coordinates never appear. Zero matches is success.
    pub async fn nearby(&self, request: &GeoSearchRequest) -> Result<Vec<AddressHit>> {
        request.validate(&self.config)?;
        self.distance.nearby(request).await
    }

    /// Registry-wide totals plus the per-district breakdown.
    ///
    /// Villages and neighborhoods are counted by composite key, so a
    /// village name reused across districts counts once per district.
    pub async fn overview_stats(&self) -> Result<OverviewStats> {
        let start = Instant::now();

        let (addresses, districts, villages, neighborhoods): (i64, i64, i64, i64) =
            sqlx::query_as(
                "SELECT COUNT(*), \
                        COUNT(DISTINCT district), \
                        COUNT(DISTINCT CONCAT(district, '|', village)), \
                        COUNT(DISTINCT CONCAT(district, '|', village, '|', neighborhood)) \
                 FROM addresses",
            )
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let breakdown: Vec<(String, i64, i64, i64)> = sqlx::query_as(
            "SELECT district, \
                    COUNT(DISTINCT village), \
                    COUNT(DISTINCT neighborhood), \
                    COUNT(*) \
             FROM addresses GROUP BY district ORDER BY district",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "query",
            component = "addresses",
            op = "overview_stats",
            result_count = breakdown.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Overview statistics computed"
        );

        Ok(OverviewStats {
            total_stats: TotalStats {
                addresses,
                districts,
                villages,
                neighborhoods,
            },
            district_breakdown: breakdown
                .into_iter()
                .map(
                    |(district, village_count, neighborhood_count, address_count)| DistrictStats {
                        district,
                        village_count,
                        neighborhood_count,
                        address_count,
                    },
                )
                .collect(),
        })
    }

    /// CSV-shaped export of address rows.
    ///
    /// Optional exact district/village filters, fixed column order, rows
    /// ordered by (district, village, neighborhood, id) — house numbers are
    /// deliberately NOT natural-sorted here. Absent fragments render as
    /// empty strings. Capped at `limit` (default 1000, max 10000).
    pub async fn export_rows(
        &self,
        district: Option<String>,
        village: Option<String>,
        limit: Option<i64>,
    ) -> Result<ExportTable> {
        let limit = limit.unwrap_or(self.config.default_export_limit);
        if limit < 1 || limit > self.config.max_export_limit {
            return Err(Error::Validation(format!(
                "limit must be between 1 and {}, got {}",
                self.config.max_export_limit, limit
            )));
        }
        let start = Instant::now();

        let filter = AddressFilter::hierarchy(district.clone(), village.clone());
        let (where_clause, params) = FilterQueryBuilder::new(filter, 0).build();

        type ExportRow = (
            String,
            String,
            i32,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<f64>,
            Option<f64>,
            String,
        );

        let sql = format!(
            "SELECT district, village, neighborhood, street, area, lane, alley, number, \
                    x_coord, y_coord, full_address \
             FROM addresses WHERE {} \
             ORDER BY district, village, neighborhood, id \
             LIMIT ${}",
            where_clause,
            params.len() + 1,
        );
        let rows: Vec<ExportRow> = bind_params(sqlx::query_as(&sql), &params)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let data: Vec<Vec<String>> = rows
            .into_iter()
            .map(
                |(district, village, neighborhood, street, area, lane, alley, number, x, y, full)| {
                    vec![
                        district,
                        village,
                        neighborhood.to_string(),
                        street.unwrap_or_default(),
                        area.unwrap_or_default(),
                        lane.unwrap_or_default(),
                        alley.unwrap_or_default(),
                        number.unwrap_or_default(),
                        x.map(|v| v.to_string()).unwrap_or_default(),
                        y.map(|v| v.to_string()).unwrap_or_default(),
                        full,
                    ]
                },
            )
            .collect();

        info!(
            subsystem = "query",
            component = "addresses",
            op = "export",
            result_count = data.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Address export complete"
        );

        Ok(ExportTable {
            headers: EXPORT_HEADERS.iter().map(|h| h.to_string()).collect(),
            total_rows: data.len(),
            data,
            filters: ExportFilters { district, village },
        })
    }

    /// The distance evaluator backing [`Self::nearby`].
    pub fn distance(&self) -> &DistanceEvaluator {
        &self.distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_columns_cover_the_record() {
        for column in [
            "id",
            "district",
            "village",
            "neighborhood",
            "street",
            "area",
            "lane",
            "alley",
            "number",
            "x_coord",
            "y_coord",
            "full_address",
            "created_at",
            "updated_at",
        ] {
            assert!(ADDRESS_COLUMNS.contains(column), "missing {}", column);
        }
    }
}
