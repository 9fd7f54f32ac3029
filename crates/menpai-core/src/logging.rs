//! Structured logging field name constants.
//!
//! Both crates use these constants so log aggregation tools can query by
//! standardized field names across the whole service.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values |
//! | TRACE | Per-row iteration, high-volume data |

/// Subsystem originating the log event.
/// Values: "database", "query", "distance"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pool", "addresses", "filter", "evaluator"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "search", "nearby", "overview_stats", "export"
pub const OPERATION: &str = "op";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Total row count reported by a count query.
pub const TOTAL_COUNT: &str = "total_count";

/// Distance strategy selected ("spatial", "haversine").
pub const DISTANCE_STRATEGY: &str = "distance_strategy";

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
