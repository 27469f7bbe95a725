//! API routes.

use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::timeout::error::Elapsed;
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;

use crate::error::ApiError;
use crate::handlers::{
    apply_job, get_admin_jobs, get_all_jobs, get_applicants, get_applied_jobs, get_companies,
    get_company_by_id, get_job_by_id, get_profile, health, post_job, ready, register_company,
    update_company, update_profile, update_status,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let job_routes = Router::new()
        .route("/job", post(post_job))
        .route("/job/get", get(get_all_jobs))
        .route("/job/get/:id", get(get_job_by_id))
        .route("/job/getadminjobs", get(get_admin_jobs))
        .route("/job/apply/:id", post(apply_job))
        .route("/job/:id/applicants", get(get_applicants));

    let application_routes = Router::new()
        .route("/application/applied", get(get_applied_jobs))
        .route(
            "/application/status/:id",
            put(update_status).post(update_status),
        );

    let company_routes = Router::new()
        .route("/company/register", post(register_company))
        .route("/company/get", get(get_companies))
        .route("/company/get/:id", get(get_company_by_id))
        .route("/company/update/:id", put(update_company));

    let user_routes = Router::new()
        .route("/user/profile", get(get_profile))
        .route("/user/profile/update", post(update_profile));

    let api_routes = Router::new()
        .merge(job_routes)
        .merge(application_routes)
        .merge(company_routes)
        .merge(user_routes);

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .merge(health_routes)
        .merge(metrics_routes);

    with_timeout(router, state.config.request_timeout)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

async fn handle_timeout(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::RequestTimeout
    } else {
        ApiError::internal(err.to_string())
    }
}

/// Abort requests that run longer than `timeout` with an enveloped 408.
fn with_timeout<S>(router: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_timeout))
            .layer(TimeoutLayer::new(timeout)),
    )
}
