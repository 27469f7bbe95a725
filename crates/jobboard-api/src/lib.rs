//! Axum HTTP API server for the job board.
//!
//! This crate provides:
//! - Application workflow (apply, list, review) and job listing services
//! - Company registration and user profiles
//! - Session token verification with caller extractors
//! - Security headers, request ids, CORS and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use auth::{CallerContext, SessionClaims, TokenVerifier};
pub use config::{ApiConfig, StoreBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{ApplicationService, CompanyService, JobService, UserService};
pub use state::AppState;
