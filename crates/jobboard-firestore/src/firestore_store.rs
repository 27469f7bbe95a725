//! `JobBoardStore` backed by Firestore.
//!
//! Application inserts commit three writes atomically: the
//! `application_keys/{job}_{applicant}` marker (must not exist), the
//! application document (must not exist), and an `appendMissingElements`
//! transform on the job's `applications` array. A taken marker fails the
//! whole commit, so two concurrent applies for the same pair cannot both
//! land.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{info, warn};

use jobboard_models::{
    Application, ApplicationId, ApplicationStatus, Company, CompanyId, Job, JobId, User, UserId,
};

use crate::client::{FirestoreClient, BATCH_GET_LIMIT};
use crate::documents::{
    application_key_fields, application_to_fields, collections, company_to_fields,
    document_to_application, document_to_company, document_to_job, document_to_user,
    job_to_fields, user_to_fields,
};
use crate::error::{FirestoreError, FirestoreResult};
use crate::store::JobBoardStore;
use crate::types::{
    Document, FieldTransform, Filter, StructuredQuery, ToFirestoreValue, Value, Write,
};

type FromDocument<T> = fn(&Document, &str) -> FirestoreResult<T>;

/// Firestore-backed store.
#[derive(Clone)]
pub struct FirestoreStore {
    client: FirestoreClient,
}

impl FirestoreStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Create from environment variables.
    pub async fn from_env() -> FirestoreResult<Self> {
        Ok(Self::new(FirestoreClient::from_env().await?))
    }

    async fn fetch<T>(
        &self,
        collection: &str,
        id: &str,
        from_doc: FromDocument<T>,
    ) -> FirestoreResult<Option<T>> {
        let doc = self
            .client
            .with_retry("get_document", || self.client.get_document(collection, id))
            .await?;

        doc.map(|d| from_doc(&d, id)).transpose()
    }

    async fn fetch_many<T>(
        &self,
        collection: &str,
        ids: Vec<&str>,
        from_doc: FromDocument<T>,
    ) -> FirestoreResult<Vec<T>> {
        let mut seen = HashSet::new();
        let names: Vec<String> = ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .map(|id| self.client.full_document_name(collection, id))
            .collect();

        let mut out = Vec::with_capacity(names.len());
        for chunk in names.chunks(BATCH_GET_LIMIT) {
            let docs = self
                .client
                .with_retry("batch_get_documents", || {
                    self.client.batch_get_documents(chunk.to_vec())
                })
                .await?;
            out.extend(Self::decode_all(collection, docs, from_doc));
        }
        Ok(out)
    }

    /// Run a query and return the decoded results newest first.
    async fn query<T, K>(
        &self,
        query: StructuredQuery,
        from_doc: FromDocument<T>,
        sort_key: K,
    ) -> FirestoreResult<Vec<T>>
    where
        K: Fn(&T) -> (chrono::DateTime<chrono::Utc>, String),
    {
        let collection = query
            .from
            .first()
            .map(|c| c.collection_id.clone())
            .unwrap_or_default();

        let docs = self
            .client
            .with_retry("run_query", || self.client.run_query(query.clone()))
            .await?;

        let mut items = Self::decode_all(&collection, docs, from_doc);
        items.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
        Ok(items)
    }

    /// Decode documents, skipping malformed ones.
    fn decode_all<T>(collection: &str, docs: Vec<Document>, from_doc: FromDocument<T>) -> Vec<T> {
        docs.iter()
            .filter_map(|doc| {
                let id = doc.id()?;
                match from_doc(doc, id) {
                    Ok(item) => Some(item),
                    Err(e) => {
                        warn!(collection = %collection, doc_id = %id, "Skipping malformed document: {}", e);
                        None
                    }
                }
            })
            .collect()
    }

    fn equal_filter(field: &str, value: &str) -> Filter {
        Filter::equal(field, Value::StringValue(value.to_string()))
    }
}

#[async_trait]
impl JobBoardStore for FirestoreStore {
    async fn get_user(&self, id: &UserId) -> FirestoreResult<Option<User>> {
        self.fetch(collections::USERS, id.as_str(), document_to_user).await
    }

    async fn get_users(&self, ids: &[UserId]) -> FirestoreResult<Vec<User>> {
        let ids = ids.iter().map(UserId::as_str).collect();
        self.fetch_many(collections::USERS, ids, document_to_user).await
    }

    async fn insert_user(&self, user: &User) -> FirestoreResult<()> {
        self.client
            .create_document(collections::USERS, user.id.as_str(), user_to_fields(user))
            .await?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> FirestoreResult<()> {
        // Role and createdAt are never rewritten by a profile update.
        let mask = ["fullname", "email", "phoneNumber", "resumeUrl"];
        self.client
            .update_document(
                collections::USERS,
                user.id.as_str(),
                user_to_fields(user),
                &mask,
            )
            .await?;
        Ok(())
    }

    async fn get_company(&self, id: &CompanyId) -> FirestoreResult<Option<Company>> {
        self.fetch(collections::COMPANIES, id.as_str(), document_to_company)
            .await
    }

    async fn get_companies(&self, ids: &[CompanyId]) -> FirestoreResult<Vec<Company>> {
        let ids = ids.iter().map(CompanyId::as_str).collect();
        self.fetch_many(collections::COMPANIES, ids, document_to_company)
            .await
    }

    async fn find_company_by_name(&self, name: &str) -> FirestoreResult<Option<Company>> {
        let query = StructuredQuery::collection(collections::COMPANIES)
            .filter(Self::equal_filter("name", name));
        let found = self
            .query(query, document_to_company, |c: &Company| {
                (c.created_at, c.id.to_string())
            })
            .await?;
        Ok(found.into_iter().next())
    }

    async fn list_companies_by_owner(&self, owner: &UserId) -> FirestoreResult<Vec<Company>> {
        let query = StructuredQuery::collection(collections::COMPANIES)
            .filter(Self::equal_filter("userId", owner.as_str()));
        self.query(query, document_to_company, |c: &Company| {
            (c.created_at, c.id.to_string())
        })
        .await
    }

    async fn insert_company(&self, company: &Company) -> FirestoreResult<()> {
        self.client
            .create_document(
                collections::COMPANIES,
                company.id.as_str(),
                company_to_fields(company),
            )
            .await?;
        info!(company_id = %company.id, "Created company document");
        Ok(())
    }

    async fn update_company(&self, company: &Company) -> FirestoreResult<()> {
        // Masked fields missing from the body are removed from the document.
        let mask = [
            "name",
            "description",
            "website",
            "location",
            "logo",
            "updatedAt",
        ];
        self.client
            .update_document(
                collections::COMPANIES,
                company.id.as_str(),
                company_to_fields(company),
                &mask,
            )
            .await?;
        Ok(())
    }

    async fn get_job(&self, id: &JobId) -> FirestoreResult<Option<Job>> {
        self.fetch(collections::JOBS, id.as_str(), document_to_job).await
    }

    async fn get_jobs(&self, ids: &[JobId]) -> FirestoreResult<Vec<Job>> {
        let ids = ids.iter().map(JobId::as_str).collect();
        self.fetch_many(collections::JOBS, ids, document_to_job).await
    }

    async fn list_jobs(&self) -> FirestoreResult<Vec<Job>> {
        let query =
            StructuredQuery::collection(collections::JOBS).order_by("createdAt", "DESCENDING");
        self.query(query, document_to_job, |j: &Job| (j.created_at, j.id.to_string()))
            .await
    }

    async fn list_jobs_by_creator(&self, creator: &UserId) -> FirestoreResult<Vec<Job>> {
        let query = StructuredQuery::collection(collections::JOBS)
            .filter(Self::equal_filter("createdBy", creator.as_str()));
        self.query(query, document_to_job, |j: &Job| (j.created_at, j.id.to_string()))
            .await
    }

    async fn insert_job(&self, job: &Job) -> FirestoreResult<()> {
        job.check_schema().map_err(FirestoreError::Validation)?;

        self.client
            .create_document(collections::JOBS, job.id.as_str(), job_to_fields(job))
            .await?;
        info!(job_id = %job.id, "Created job document");
        Ok(())
    }

    async fn get_application(&self, id: &ApplicationId) -> FirestoreResult<Option<Application>> {
        self.fetch(collections::APPLICATIONS, id.as_str(), document_to_application)
            .await
    }

    async fn get_applications(&self, ids: &[ApplicationId]) -> FirestoreResult<Vec<Application>> {
        let ids = ids.iter().map(ApplicationId::as_str).collect();
        self.fetch_many(collections::APPLICATIONS, ids, document_to_application)
            .await
    }

    async fn find_application(
        &self,
        job: &JobId,
        applicant: &UserId,
    ) -> FirestoreResult<Option<Application>> {
        let query = StructuredQuery::collection(collections::APPLICATIONS)
            .filter(Filter::and(vec![
                Self::equal_filter("job", job.as_str()),
                Self::equal_filter("applicant", applicant.as_str()),
            ]))
            .limit(1);
        let found = self
            .query(query, document_to_application, |a: &Application| {
                (a.created_at, a.id.to_string())
            })
            .await?;
        Ok(found.into_iter().next())
    }

    async fn list_applications_by_applicant(
        &self,
        applicant: &UserId,
    ) -> FirestoreResult<Vec<Application>> {
        let query = StructuredQuery::collection(collections::APPLICATIONS)
            .filter(Self::equal_filter("applicant", applicant.as_str()));
        self.query(query, document_to_application, |a: &Application| {
            (a.created_at, a.id.to_string())
        })
        .await
    }

    async fn insert_application(
        &self,
        app: &Application,
        link_to_job: bool,
    ) -> FirestoreResult<()> {
        let key = app.unique_key();

        let mut writes = vec![
            Write::create(
                self.client
                    .full_document_name(collections::APPLICATION_KEYS, &key),
                application_key_fields(app),
            ),
            Write::create(
                self.client
                    .full_document_name(collections::APPLICATIONS, app.id.as_str()),
                application_to_fields(app),
            ),
        ];
        if link_to_job {
            writes.push(Write::transform(
                self.client
                    .full_document_name(collections::JOBS, app.job.as_str()),
                vec![FieldTransform::append_missing(
                    "applications",
                    vec![app.id.as_str().to_firestore_value()],
                )],
            ));
        }

        match self.client.commit(writes).await {
            Ok(_) => {
                info!(application_id = %app.id, job_id = %app.job, "Committed application");
                Ok(())
            }
            Err(FirestoreError::AlreadyExists(_)) => Err(FirestoreError::DuplicateKey(key)),
            Err(e) => Err(e),
        }
    }

    async fn update_application_status(
        &self,
        id: &ApplicationId,
        status: &ApplicationStatus,
    ) -> FirestoreResult<Option<Application>> {
        let mut fields = std::collections::HashMap::new();
        fields.insert("status".to_string(), status.as_str().to_firestore_value());

        match self
            .client
            .update_document(collections::APPLICATIONS, id.as_str(), fields, &["status"])
            .await
        {
            Ok(doc) => document_to_application(&doc, id.as_str()).map(Some),
            Err(FirestoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn ping(&self) -> FirestoreResult<()> {
        self.client
            .get_document(collections::JOBS, "__readiness_check__")
            .await
            .map(|_| ())
    }
}
