//! Firestore client and store tests against a mock server in emulator mode.

use std::time::Duration;

use serde_json::json;
use serial_test::serial;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jobboard_models::{
    Application, ApplicationId, ApplicationStatus, JobId, User, UserId, UserRole,
};

use crate::client::{FirestoreClient, FirestoreConfig};
use crate::error::FirestoreError;
use crate::firestore_store::FirestoreStore;
use crate::retry::RetryConfig;
use crate::store::JobBoardStore;
use crate::types::StructuredQuery;

// =============================================================================
// Test Helpers
// =============================================================================

const DOCS_PATH: &str = "/v1/projects/test-project/databases/test-db/documents";

fn test_config(server: &MockServer) -> FirestoreConfig {
    FirestoreConfig {
        project_id: "test-project".to_string(),
        database_id: "test-db".to_string(),
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        retry: RetryConfig {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 5,
        },
        emulator_host: Some(server.address().to_string()),
    }
}

async fn test_client(server: &MockServer) -> FirestoreClient {
    FirestoreClient::new(test_config(server)).await.unwrap()
}

fn application_doc(id: &str, job: &str, applicant: &str, status: &str) -> serde_json::Value {
    json!({
        "name": format!("projects/test-project/databases/test-db/documents/applications/{}", id),
        "fields": {
            "job": {"stringValue": job},
            "applicant": {"stringValue": applicant},
            "status": {"stringValue": status},
            "createdAt": {"timestampValue": "2024-05-01T10:00:00Z"}
        }
    })
}

async fn request_bodies(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap_or(serde_json::Value::Null))
        .collect()
}

// =============================================================================
// Error Type Tests
// =============================================================================

#[test]
fn test_error_from_http_status() {
    assert!(matches!(
        FirestoreError::from_http_status(429, "rate limited"),
        FirestoreError::RateLimited(_)
    ));
    assert!(matches!(
        FirestoreError::from_http_status(503, "unavailable"),
        FirestoreError::ServerError(503, _)
    ));
    assert!(matches!(
        FirestoreError::from_http_status(409, "conflict"),
        FirestoreError::AlreadyExists(_)
    ));
    assert!(matches!(
        FirestoreError::from_http_status(412, "precondition"),
        FirestoreError::PreconditionFailed(_)
    ));
    assert!(matches!(
        FirestoreError::from_http_status(400, "bad request"),
        FirestoreError::RequestFailed(_)
    ));
}

#[test]
fn test_error_retryability() {
    assert!(FirestoreError::from_http_status(500, "internal").is_retryable());
    assert!(FirestoreError::from_http_status(429, "slow down").is_retryable());
    assert!(!FirestoreError::from_http_status(404, "missing").is_retryable());
    assert!(!FirestoreError::DuplicateKey("k".into()).is_retryable());
}

#[test]
fn test_error_http_status_getter() {
    assert_eq!(FirestoreError::RateLimited(1000).http_status(), Some(429));
    assert_eq!(FirestoreError::DuplicateKey("k".into()).http_status(), Some(409));
    assert_eq!(FirestoreError::Validation(vec![]).http_status(), Some(400));
    assert_eq!(FirestoreError::RateLimited(5000).retry_after_ms(), Some(5000));
}

// =============================================================================
// Client Tests
// =============================================================================

#[tokio::test]
async fn test_get_document_missing_returns_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/jobs/abc", DOCS_PATH)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    assert!(client.get_document("jobs", "abc").await.unwrap().is_none());
}

#[tokio::test]
async fn test_emulator_requests_use_owner_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/applications/a1", DOCS_PATH)))
        .and(header("authorization", "Bearer owner"))
        .respond_with(ResponseTemplate::new(200).set_body_json(application_doc(
            "a1", "j1", "u1", "pending",
        )))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let doc = client.get_document("applications", "a1").await.unwrap();
    assert_eq!(doc.as_ref().and_then(|d| d.id()), Some("a1"));
}

#[tokio::test]
async fn test_run_query_skips_entries_without_documents() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}:runQuery", DOCS_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"document": application_doc("a1", "j1", "u1", "pending"), "readTime": "2024-05-01T10:00:00Z"},
            {"readTime": "2024-05-01T10:00:00Z"}
        ])))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let docs = client
        .run_query(StructuredQuery::collection("applications"))
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);

    let bodies = request_bodies(&server).await;
    assert_eq!(
        bodies[0]["structuredQuery"]["from"][0]["collectionId"],
        "applications"
    );
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/applications/a1", DOCS_PATH)))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/applications/a1", DOCS_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(application_doc(
            "a1", "j1", "u1", "accepted",
        )))
        .mount(&server)
        .await;

    let store = FirestoreStore::new(test_client(&server).await);
    let app = store
        .get_application(&ApplicationId::from_string("a1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(app.status, ApplicationStatus::Accepted);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

// =============================================================================
// Store Tests
// =============================================================================

#[tokio::test]
async fn test_insert_application_commits_key_application_and_transform() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}:commit", DOCS_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "writeResults": [{}, {}, {}],
            "commitTime": "2024-05-01T10:00:00Z"
        })))
        .mount(&server)
        .await;

    let store = FirestoreStore::new(test_client(&server).await);
    let app = Application::new(JobId::new(), UserId::new());
    store.insert_application(&app, true).await.unwrap();

    let bodies = request_bodies(&server).await;
    let writes = bodies[0]["writes"].as_array().unwrap();
    assert_eq!(writes.len(), 3);

    let key_name = writes[0]["update"]["name"].as_str().unwrap();
    assert!(key_name.ends_with(&format!("application_keys/{}", app.unique_key())));
    assert_eq!(writes[0]["currentDocument"], json!({"exists": false}));
    assert_eq!(writes[1]["update"]["fields"]["status"], json!({"stringValue": "pending"}));
    assert_eq!(
        writes[2]["updateTransforms"][0]["appendMissingElements"]["values"][0],
        json!({"stringValue": app.id.as_str()})
    );
}

#[tokio::test]
async fn test_insert_application_without_link_skips_transform() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}:commit", DOCS_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"writeResults": [{}, {}]})))
        .mount(&server)
        .await;

    let store = FirestoreStore::new(test_client(&server).await);
    let app = Application::new(JobId::new(), UserId::new());
    store.insert_application(&app, false).await.unwrap();

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies[0]["writes"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_taken_application_key_maps_to_duplicate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}:commit", DOCS_PATH)))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {"code": 409, "status": "ALREADY_EXISTS", "message": "Document already exists"}
        })))
        .mount(&server)
        .await;

    let store = FirestoreStore::new(test_client(&server).await);
    let app = Application::new(JobId::new(), UserId::new());
    let err = store.insert_application(&app, true).await.unwrap_err();

    match err {
        FirestoreError::DuplicateKey(key) => assert_eq!(key, app.unique_key()),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_update_status_of_missing_application_returns_none() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{}/applications/a404", DOCS_PATH)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = FirestoreStore::new(test_client(&server).await);
    let result = store
        .update_application_status(&ApplicationId::from_string("a404"), &ApplicationStatus::Rejected)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_update_status_returns_stored_document() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{}/applications/a1", DOCS_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(application_doc(
            "a1", "j1", "u1", "rejected",
        )))
        .mount(&server)
        .await;

    let store = FirestoreStore::new(test_client(&server).await);
    let app = store
        .update_application_status(&ApplicationId::from_string("a1"), &ApplicationStatus::Rejected)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(app.job, JobId::from_string("j1"));
    assert_eq!(app.status, ApplicationStatus::Rejected);

    let requests = server.received_requests().await.unwrap();
    let query = requests[0].url.query().unwrap_or_default();
    assert!(query.contains("updateMask.fieldPaths=status"));
    assert!(query.contains("currentDocument.exists=true"));
}

#[tokio::test]
async fn test_update_user_masks_profile_fields() {
    let server = MockServer::start().await;
    let user = User::new("Ada", "ada@example.com", UserRole::Student);
    Mock::given(method("PATCH"))
        .and(path(format!("{}/users/{}", DOCS_PATH, user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": format!("projects/test-project/databases/test-db/documents/users/{}", user.id),
            "fields": {"fullname": {"stringValue": "Ada"}}
        })))
        .mount(&server)
        .await;

    let store = FirestoreStore::new(test_client(&server).await);
    store.update_user(&user).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let query = requests[0].url.query().unwrap_or_default();
    assert!(query.contains("updateMask.fieldPaths=resumeUrl"));
    assert!(query.contains("updateMask.fieldPaths=phoneNumber"));
    assert!(!query.contains("updateMask.fieldPaths=role"));
    assert!(query.contains("currentDocument.exists=true"));
}

#[tokio::test]
async fn test_update_missing_user_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = FirestoreStore::new(test_client(&server).await);
    let user = User::new("Ghost", "ghost@example.com", UserRole::Student);
    let err = store.update_user(&user).await.unwrap_err();
    assert!(matches!(err, FirestoreError::NotFound(_)));
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
#[serial]
fn test_config_validates_empty_project_id() {
    std::env::set_var("GCP_PROJECT_ID", "");
    std::env::remove_var("FIREBASE_PROJECT_ID");
    assert!(FirestoreConfig::from_env().is_err());
    std::env::remove_var("GCP_PROJECT_ID");
}

#[test]
#[serial]
fn test_config_accepts_firebase_project_id() {
    std::env::remove_var("GCP_PROJECT_ID");
    std::env::set_var("FIREBASE_PROJECT_ID", "firebase-project");
    let config = FirestoreConfig::from_env().unwrap();
    assert_eq!(config.project_id, "firebase-project");
    std::env::remove_var("FIREBASE_PROJECT_ID");
}

#[test]
#[serial]
fn test_config_parses_retry_env_vars() {
    std::env::set_var("GCP_PROJECT_ID", "test");
    std::env::set_var("FIRESTORE_RETRY_BASE_MS", "50");
    std::env::set_var("FIRESTORE_RETRY_MAX_MS", "2000");
    let config = FirestoreConfig::from_env().unwrap();
    assert_eq!(config.retry.base_delay_ms, 50);
    assert_eq!(config.retry.max_delay_ms, 2000);
    assert_eq!(config.retry.max_retries, 3);
    std::env::remove_var("FIRESTORE_RETRY_BASE_MS");
    std::env::remove_var("FIRESTORE_RETRY_MAX_MS");
    std::env::remove_var("GCP_PROJECT_ID");
}
