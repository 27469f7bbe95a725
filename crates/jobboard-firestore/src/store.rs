//! Entity store abstraction.

use async_trait::async_trait;

use jobboard_models::{
    Application, ApplicationId, ApplicationStatus, Company, CompanyId, Job, JobId, User, UserId,
};

use crate::error::FirestoreResult;

/// Persistent storage for users, companies, jobs and applications.
///
/// Every `list_*` method returns records newest first. Batch getters return
/// the records that exist, in no particular order; callers index them by id.
#[async_trait]
pub trait JobBoardStore: Send + Sync {
    // Users

    async fn get_user(&self, id: &UserId) -> FirestoreResult<Option<User>>;

    async fn get_users(&self, ids: &[UserId]) -> FirestoreResult<Vec<User>>;

    async fn insert_user(&self, user: &User) -> FirestoreResult<()>;

    /// Overwrite a user's profile fields. `NotFound` when it does not exist.
    async fn update_user(&self, user: &User) -> FirestoreResult<()>;

    // Companies

    async fn get_company(&self, id: &CompanyId) -> FirestoreResult<Option<Company>>;

    async fn get_companies(&self, ids: &[CompanyId]) -> FirestoreResult<Vec<Company>>;

    /// Exact, case-sensitive name match.
    async fn find_company_by_name(&self, name: &str) -> FirestoreResult<Option<Company>>;

    async fn list_companies_by_owner(&self, owner: &UserId) -> FirestoreResult<Vec<Company>>;

    async fn insert_company(&self, company: &Company) -> FirestoreResult<()>;

    /// Overwrite an existing company. `NotFound` when it does not exist.
    async fn update_company(&self, company: &Company) -> FirestoreResult<()>;

    // Jobs

    async fn get_job(&self, id: &JobId) -> FirestoreResult<Option<Job>>;

    async fn get_jobs(&self, ids: &[JobId]) -> FirestoreResult<Vec<Job>>;

    async fn list_jobs(&self) -> FirestoreResult<Vec<Job>>;

    async fn list_jobs_by_creator(&self, creator: &UserId) -> FirestoreResult<Vec<Job>>;

    /// Schema-validate and persist a job. Violations surface as
    /// `FirestoreError::Validation` and nothing is written.
    async fn insert_job(&self, job: &Job) -> FirestoreResult<()>;

    // Applications

    async fn get_application(&self, id: &ApplicationId) -> FirestoreResult<Option<Application>>;

    async fn get_applications(&self, ids: &[ApplicationId]) -> FirestoreResult<Vec<Application>>;

    async fn find_application(
        &self,
        job: &JobId,
        applicant: &UserId,
    ) -> FirestoreResult<Option<Application>>;

    async fn list_applications_by_applicant(
        &self,
        applicant: &UserId,
    ) -> FirestoreResult<Vec<Application>>;

    /// Insert an application, enforcing one per (job, applicant).
    ///
    /// With `link_to_job` the id is appended to the job's application list in
    /// the same atomic step. A taken key surfaces as
    /// `FirestoreError::DuplicateKey` and nothing is written.
    async fn insert_application(&self, app: &Application, link_to_job: bool)
        -> FirestoreResult<()>;

    /// Set an application's status. `None` when it does not exist.
    async fn update_application_status(
        &self,
        id: &ApplicationId,
        status: &ApplicationStatus,
    ) -> FirestoreResult<Option<Application>>;

    /// Cheap reachability check for the readiness endpoint.
    async fn ping(&self) -> FirestoreResult<()>;
}
