//! Shared data models for the JobBoard backend.
//!
//! This crate provides Serde-serializable types for:
//! - Users, companies, jobs and applications
//! - Document identifiers
//! - Application status and its display labels
//! - Schema validation with per-field violations

pub mod application;
pub mod company;
pub mod error;
pub mod ids;
pub mod job;
pub mod user;
pub mod validation;

// Re-export common types
pub use application::{application_key, Application, ApplicationStatus};
pub use company::Company;
pub use error::{ModelError, ModelResult};
pub use ids::{is_well_formed_id, ApplicationId, CompanyId, JobId, UserId};
pub use job::{normalize_requirements, Job, NewJob, NumericOrText};
pub use user::{User, UserRole};
pub use validation::{violations_from, FieldViolation};
