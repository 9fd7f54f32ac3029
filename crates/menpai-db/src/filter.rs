//! Search filter compiler.
//!
//! Turns an optional bag of filter values into a conjunctive WHERE clause
//! plus bound parameters. Filter values are never concatenated into the
//! query text; substring filters are LIKE-escaped and bound, so the
//! predicate is injection-safe by construction. The count query and the
//! data query of a search share one built predicate, which is what keeps
//! their totals from drifting.

use menpai_core::SearchRequest;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Type-safe parameter binding for dynamically assembled queries.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    /// String parameter.
    String(String),
    /// Integer parameter.
    Int(i64),
    /// Floating-point parameter.
    Float(f64),
}

/// Optional filter values for address search and export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressFilter {
    /// Free-text term, matched case-insensitively as a substring of
    /// `full_address`.
    pub q: Option<String>,
    /// Exact district name.
    pub district: Option<String>,
    /// Exact village name.
    pub village: Option<String>,
    /// Substring matched case-insensitively against street OR area.
    pub street: Option<String>,
}

impl AddressFilter {
    /// The filter subset used by search.
    pub fn from_search(request: &SearchRequest) -> Self {
        Self {
            q: request.q.clone(),
            district: request.district.clone(),
            village: request.village.clone(),
            street: request.street.clone(),
        }
    }

    /// The hierarchy-only subset used by export (no free-text filters).
    pub fn hierarchy(district: Option<String>, village: Option<String>) -> Self {
        Self {
            district,
            village,
            ..Default::default()
        }
    }

    /// True when no filter value is present.
    pub fn is_empty(&self) -> bool {
        self.q.is_none() && self.district.is_none() && self.village.is_none() && self.street.is_none()
    }
}

/// Generates the WHERE clause fragment for an [`AddressFilter`].
///
/// Each present filter contributes one clause; the result is the AND of the
/// contributed clauses, or `TRUE` when no filter is present. Hierarchy
/// filters match exactly; substring filters use ILIKE with escaped,
/// `%`-wrapped parameters.
///
/// # Example
///
/// ```rust
/// use menpai_db::filter::{AddressFilter, FilterQueryBuilder, QueryParam};
///
/// let filter = AddressFilter {
///     district: Some("中西區".to_string()),
///     ..Default::default()
/// };
/// let (sql, params) = FilterQueryBuilder::new(filter, 0).build();
/// assert_eq!(sql, "district = $1");
/// assert_eq!(params, vec![QueryParam::String("中西區".to_string())]);
/// ```
pub struct FilterQueryBuilder {
    filter: AddressFilter,
    param_offset: usize,
}

impl FilterQueryBuilder {
    /// Create a new builder.
    ///
    /// `param_offset` is the number of parameters already bound ahead of
    /// this fragment in the final query.
    pub fn new(filter: AddressFilter, param_offset: usize) -> Self {
        Self {
            filter,
            param_offset,
        }
    }

    /// Build the WHERE clause fragment and its parameters, in binding order.
    pub fn build(&self) -> (String, Vec<QueryParam>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        let mut param_idx = self.param_offset;

        if let Some(district) = &self.filter.district {
            param_idx += 1;
            clauses.push(format!("district = ${}", param_idx));
            params.push(QueryParam::String(district.clone()));
        }

        if let Some(village) = &self.filter.village {
            param_idx += 1;
            clauses.push(format!("village = ${}", param_idx));
            params.push(QueryParam::String(village.clone()));
        }

        if let Some(street) = &self.filter.street {
            param_idx += 1;
            clauses.push(format!(
                r"(street ILIKE ${} ESCAPE '\' OR area ILIKE ${} ESCAPE '\')",
                param_idx, param_idx
            ));
            params.push(QueryParam::String(format!("%{}%", escape_like(street))));
        }

        if let Some(q) = &self.filter.q {
            param_idx += 1;
            clauses.push(format!(r"full_address ILIKE ${} ESCAPE '\'", param_idx));
            params.push(QueryParam::String(format!("%{}%", escape_like(q))));
        }

        let sql = if clauses.is_empty() {
            "TRUE".to_string()
        } else {
            clauses.join(" AND ")
        };

        (sql, params)
    }
}

/// Bind a slice of [`QueryParam`]s onto a dynamically built query.
pub fn bind_params<'q, O>(
    mut query: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    params: &'q [QueryParam],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for param in params {
        query = match param {
            QueryParam::String(s) => query.bind(s),
            QueryParam::Int(i) => query.bind(i),
            QueryParam::Float(f) => query.bind(f),
        };
    }
    query
}

/// Bind a slice of [`QueryParam`]s onto a scalar query.
pub fn bind_scalar_params<'q, O>(
    mut query: sqlx::query::QueryScalar<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    params: &'q [QueryParam],
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for param in params {
        query = match param {
            QueryParam::String(s) => query.bind(s),
            QueryParam::Int(i) => query.bind(i),
            QueryParam::Float(f) => query.bind(f),
        };
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_returns_true() {
        let (sql, params) = FilterQueryBuilder::new(AddressFilter::default(), 0).build();
        assert_eq!(sql, "TRUE");
        assert!(params.is_empty());
    }

    #[test]
    fn test_single_district_filter() {
        let filter = AddressFilter {
            district: Some("中西區".to_string()),
            ..Default::default()
        };
        let (sql, params) = FilterQueryBuilder::new(filter, 0).build();
        assert_eq!(sql, "district = $1");
        assert_eq!(params, vec![QueryParam::String("中西區".to_string())]);
    }

    #[test]
    fn test_all_filters_conjoined_in_order() {
        let filter = AddressFilter {
            q: Some("民族".to_string()),
            district: Some("中西區".to_string()),
            village: Some("赤崁里".to_string()),
            street: Some("民族路".to_string()),
        };
        let (sql, params) = FilterQueryBuilder::new(filter, 0).build();

        assert_eq!(
            sql,
            r"district = $1 AND village = $2 AND (street ILIKE $3 ESCAPE '\' OR area ILIKE $3 ESCAPE '\') AND full_address ILIKE $4 ESCAPE '\'"
        );
        assert_eq!(params.len(), 4);
        assert_eq!(params[2], QueryParam::String("%民族路%".to_string()));
        assert_eq!(params[3], QueryParam::String("%民族%".to_string()));
    }

    #[test]
    fn test_street_filter_reuses_one_parameter() {
        let filter = AddressFilter {
            street: Some("開山".to_string()),
            ..Default::default()
        };
        let (sql, params) = FilterQueryBuilder::new(filter, 0).build();
        // One bound value referenced from both sides of the OR
        assert_eq!(params.len(), 1);
        assert_eq!(sql.matches("$1").count(), 2);
    }

    #[test]
    fn test_param_offset_shifts_placeholders() {
        let filter = AddressFilter {
            village: Some("赤崁里".to_string()),
            ..Default::default()
        };
        let (sql, params) = FilterQueryBuilder::new(filter, 3).build();
        assert_eq!(sql, "village = $4");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_like_wildcards_are_escaped() {
        let filter = AddressFilter {
            q: Some("100%_路\\".to_string()),
            ..Default::default()
        };
        let (_, params) = FilterQueryBuilder::new(filter, 0).build();
        assert_eq!(
            params[0],
            QueryParam::String("%100\\%\\_路\\\\%".to_string())
        );
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c\\d"), "c\\\\d");
        assert_eq!(escape_like("民族路"), "民族路");
    }

    #[test]
    fn test_from_search_copies_filter_fields() {
        let request = SearchRequest {
            q: Some("赤崁".to_string()),
            district: Some("中西區".to_string()),
            ..Default::default()
        };
        let filter = AddressFilter::from_search(&request);
        assert_eq!(filter.q.as_deref(), Some("赤崁"));
        assert_eq!(filter.district.as_deref(), Some("中西區"));
        assert!(filter.street.is_none());
    }

    #[test]
    fn test_hierarchy_filter_has_no_text_clauses() {
        let filter = AddressFilter::hierarchy(Some("東區".to_string()), None);
        assert!(filter.q.is_none());
        assert!(filter.street.is_none());
        let (sql, _) = FilterQueryBuilder::new(filter, 0).build();
        assert_eq!(sql, "district = $1");
    }

    #[test]
    fn test_is_empty() {
        assert!(AddressFilter::default().is_empty());
        assert!(!AddressFilter::hierarchy(Some("東區".into()), None).is_empty());
    }
}
