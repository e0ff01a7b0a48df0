//! Database metrics collection.
//!
//! Queries are timed through the `metrics` facade. Without an installed
//! recorder the calls are no-ops, so the bus tools pay nothing by default.

use metrics::{counter, histogram};
use std::time::Instant;

/// Record database query duration.
pub fn record_query_duration(query_name: &'static str, duration_secs: f64) {
    histogram!("database_query_duration_seconds", "query" => query_name).record(duration_secs);
}

/// Record a failed query.
pub fn record_query_error(query_name: &'static str) {
    counter!("database_query_errors_total", "query" => query_name).increment(1);
}

/// A helper to time database operations and record metrics.
///
/// Usage:
/// ```ignore
/// let timer = QueryTimer::new("find_call_flows");
/// let result = sqlx::query_as::<_, CallFlowEntity>(...).fetch_all(pool).await;
/// timer.finish(result)
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    /// Create a new timer for the given query name.
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration to metrics.
    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }

    /// Record the elapsed duration and, on failure, an error count; passes the
    /// result through.
    pub fn finish<T, E>(self, result: Result<T, E>) -> Result<T, E> {
        if result.is_err() {
            record_query_error(self.query_name);
        }
        self.record();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_creation() {
        let timer = QueryTimer::new("test_query");
        assert_eq!(timer.query_name, "test_query");
    }

    #[test]
    fn test_finish_passes_result_through() {
        let ok: Result<u8, ()> = QueryTimer::new("ok_query").finish(Ok(7));
        assert_eq!(ok, Ok(7));

        let err: Result<u8, &str> = QueryTimer::new("err_query").finish(Err("boom"));
        assert_eq!(err, Err("boom"));
    }
}
