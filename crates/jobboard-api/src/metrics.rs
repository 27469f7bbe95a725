//! Prometheus metrics for the API server.

use std::sync::OnceLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "jobboard_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "jobboard_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "jobboard_http_requests_in_flight";

    // Domain metrics
    pub const APPLICATIONS_CREATED_TOTAL: &str = "jobboard_applications_created_total";
    pub const APPLICATION_STATUS_UPDATES_TOTAL: &str = "jobboard_application_status_updates_total";
    pub const JOBS_POSTED_TOTAL: &str = "jobboard_jobs_posted_total";
    pub const DUPLICATE_APPLICATIONS_TOTAL: &str = "jobboard_duplicate_applications_total";
    pub const COMPANIES_REGISTERED_TOTAL: &str = "jobboard_companies_registered_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a new application.
pub fn record_application_created() {
    counter!(names::APPLICATIONS_CREATED_TOTAL).increment(1);
}

/// Record an application status change.
pub fn record_status_update(status: &str) {
    let labels = [("status", status.to_string())];
    counter!(names::APPLICATION_STATUS_UPDATES_TOTAL, &labels).increment(1);
}

/// Record a rejected duplicate application.
pub fn record_duplicate_application() {
    counter!(names::DUPLICATE_APPLICATIONS_TOTAL).increment(1);
}

/// Record a job posting.
pub fn record_job_posted() {
    counter!(names::JOBS_POSTED_TOTAL).increment(1);
}

/// Record a company registration.
pub fn record_company_registered() {
    counter!(names::COMPANIES_REGISTERED_TOTAL).increment(1);
}

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)/[0-9a-f]{24}(/|$)").expect("valid id pattern"))
}

/// Sanitize path for metrics labels (replace document ids).
fn sanitize_path(path: &str) -> String {
    // Run twice: adjacent ids share the separating slash
    let once = id_pattern().replace_all(path, "/:id$1");
    id_pattern().replace_all(&once, "/:id$1").to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/v1/job/65a1b2c3d4e5f60718293a4b/applicants"),
            "/api/v1/job/:id/applicants"
        );
        assert_eq!(
            sanitize_path("/api/v1/job/get/65A1B2C3D4E5F60718293A4B"),
            "/api/v1/job/get/:id"
        );
        assert_eq!(sanitize_path("/api/v1/job/get"), "/api/v1/job/get");
        assert_eq!(sanitize_path("/api/v1/job/apply/short"), "/api/v1/job/apply/short");
    }
}
