//! Firestore-backed entity store.
//!
//! This crate provides:
//! - A Firestore REST client with token caching, retry and metrics
//! - Typed document mapping for users, companies, jobs and applications
//! - The `JobBoardStore` trait with Firestore and in-memory implementations
//! - Store-enforced (job, applicant) uniqueness for applications

pub mod client;
pub mod documents;
pub mod error;
pub mod firestore_store;
pub mod memory;
pub mod metrics;
pub mod retry;
pub mod store;
pub mod token_cache;
pub mod types;

#[cfg(test)]
mod client_tests;

pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use firestore_store::FirestoreStore;
pub use memory::InMemoryStore;
pub use store::JobBoardStore;
pub use types::{Document, FromFirestoreValue, ToFirestoreValue, Value};
