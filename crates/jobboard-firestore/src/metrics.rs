//! Firestore metrics collection.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total Firestore requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "jobboard_firestore_requests_total";

    /// Total retry attempts by operation.
    pub const RETRIES_TOTAL: &str = "jobboard_firestore_retries_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "jobboard_firestore_latency_seconds";

    /// Documents returned by queries, by collection.
    pub const QUERY_DOCUMENTS_RETURNED_TOTAL: &str = "jobboard_firestore_query_documents_returned_total";
}

/// Record metrics for a completed Firestore request.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a retry attempt.
pub fn record_retry(operation: &str) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record how many documents a query returned.
pub fn record_query_results(collection: &str, count: usize) {
    counter!(
        names::QUERY_DOCUMENTS_RETURNED_TOTAL,
        "collection" => collection.to_string()
    )
    .increment(count as u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_namespaced() {
        for name in [
            names::REQUESTS_TOTAL,
            names::RETRIES_TOTAL,
            names::LATENCY_SECONDS,
            names::QUERY_DOCUMENTS_RETURNED_TOTAL,
        ] {
            assert!(name.starts_with("jobboard_firestore_"));
        }
    }
}
