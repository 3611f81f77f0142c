//! Query builder for stored samples.
//!
//! [`WindowQuery`] follows the builder pattern. The common case, the
//! trailing chart window, has its own constructor:
//!
//! ```
//! use envlog_store::{Store, WindowQuery};
//!
//! let store = Store::open_in_memory()?;
//! let now = 1_700_000_000;
//!
//! // Everything from the last 24 hours, oldest first
//! let samples = store.query(&WindowQuery::trailing(now, 86_400))?;
//! assert!(samples.is_empty());
//!
//! // The five most recent samples
//! let recent = store.query(&WindowQuery::new().newest_first().limit(5))?;
//! assert!(recent.is_empty());
//! # Ok::<(), envlog_store::Error>(())
//! ```

use crate::models::SAMPLE_COLUMNS;

/// Fluent query builder for samples.
///
/// By default a query returns every stored sample ordered by timestamp
/// ascending (oldest first).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WindowQuery {
    /// Include only samples strictly after this timestamp.
    pub after: Option<i64>,
    /// Include only samples at or before this timestamp.
    pub until: Option<i64>,
    /// Maximum number of rows to fetch.
    pub limit: Option<u32>,
    /// Order by time descending instead of ascending.
    pub newest_first: bool,
}

impl WindowQuery {
    /// Create a query over all samples, oldest first.
    pub fn new() -> Self {
        Self::default()
    }

    /// The half-open trailing window `(now - window_seconds, now]`.
    pub fn trailing(now: i64, window_seconds: i64) -> Self {
        Self::new()
            .after(now.saturating_sub(window_seconds))
            .until(now)
    }

    /// Only samples with a timestamp strictly greater than `timestamp`.
    pub fn after(mut self, timestamp: i64) -> Self {
        self.after = Some(timestamp);
        self
    }

    /// Only samples with a timestamp at or before `timestamp`.
    pub fn until(mut self, timestamp: i64) -> Self {
        self.until = Some(timestamp);
        self
    }

    /// Limit the number of rows fetched.
    ///
    /// Rows that fail to decode still count towards the limit.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Order results newest first.
    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    /// Build the SQL WHERE clause and parameters.
    pub(crate) fn build_where(&self) -> (String, Vec<i64>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(after) = self.after {
            conditions.push("time > ?");
            params.push(after);
        }

        if let Some(until) = self.until {
            conditions.push("time <= ?");
            params.push(until);
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    /// Build the full SQL query.
    pub(crate) fn build_sql(&self) -> String {
        let (where_clause, _) = self.build_where();
        let order = if self.newest_first { "DESC" } else { "ASC" };

        let mut sql = format!(
            "SELECT {} FROM sensor_data {} ORDER BY time {}",
            SAMPLE_COLUMNS, where_clause, order
        );

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_oldest_first() {
        let query = WindowQuery::new();
        assert!(!query.newest_first);
        assert!(query.build_sql().ends_with("ORDER BY time ASC"));
    }

    #[test]
    fn test_trailing_bounds() {
        let query = WindowQuery::trailing(1000, 300);
        assert_eq!(query.after, Some(700));
        assert_eq!(query.until, Some(1000));

        let (where_clause, params) = query.build_where();
        assert_eq!(where_clause, "WHERE time > ? AND time <= ?");
        assert_eq!(params, vec![700, 1000]);
    }

    #[test]
    fn test_trailing_saturates() {
        let query = WindowQuery::trailing(i64::MIN + 5, 100);
        assert_eq!(query.after, Some(i64::MIN));
    }

    #[test]
    fn test_empty_where() {
        let (where_clause, params) = WindowQuery::new().build_where();
        assert!(where_clause.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn test_limit_and_order() {
        let sql = WindowQuery::new().newest_first().limit(1).build_sql();
        assert!(sql.contains("ORDER BY time DESC"));
        assert!(sql.ends_with("LIMIT 1"));
    }
}
