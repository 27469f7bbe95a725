//! Business logic services.
//!
//! Services take the caller identity explicitly and return view structs that
//! handlers wrap in response envelopes.

pub mod application;
pub mod company;
pub mod job;
pub mod user;

pub use application::ApplicationService;
pub use company::CompanyService;
pub use job::JobService;
pub use user::UserService;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::async_trait;
    use jobboard_firestore::{FirestoreError, FirestoreResult, InMemoryStore, JobBoardStore};
    use jobboard_models::{
        Application, ApplicationId, ApplicationStatus, Company, CompanyId, Job, JobId, NewJob,
        NumericOrText, User, UserId, UserRole,
    };

    use crate::auth::CallerContext;

    pub fn store() -> Arc<dyn JobBoardStore> {
        Arc::new(InMemoryStore::new())
    }

    pub async fn seed_user(store: &Arc<dyn JobBoardStore>, name: &str, role: UserRole) -> User {
        let mut user = User::new(name, format!("{}@example.com", name.to_lowercase()), role);
        user.phone_number = "555-0100".to_string();
        store.insert_user(&user).await.unwrap();
        user
    }

    pub async fn seed_company(store: &Arc<dyn JobBoardStore>, name: &str, owner: &User) -> Company {
        let company = Company::new(name, owner.id.clone());
        store.insert_company(&company).await.unwrap();
        company
    }

    pub async fn seed_job(
        store: &Arc<dyn JobBoardStore>,
        title: &str,
        company: &Company,
        creator: &User,
    ) -> Job {
        let job = Job::new(NewJob {
            title: title.to_string(),
            description: format!("{} role", title),
            requirements: vec![],
            salary: None,
            location: "Remote".to_string(),
            job_type: "Full-time".to_string(),
            experience_level: NumericOrText::Numeric(2.0),
            position: 1,
            company: company.id.clone(),
            created_by: creator.id.clone(),
        });
        store.insert_job(&job).await.unwrap();
        job
    }

    pub fn caller(user: &User) -> CallerContext {
        CallerContext::new(user.id.clone(), user.role)
    }

    /// In-memory store with scripted misbehaviour.
    #[derive(Default)]
    pub struct ScriptedStore {
        inner: InMemoryStore,
        /// `find_application` never sees existing records.
        blind_application_lookup: bool,
        /// `insert_job` fails as an unavailable backend.
        fail_job_inserts: bool,
    }

    impl ScriptedStore {
        pub fn blind_application_lookup() -> Self {
            Self {
                blind_application_lookup: true,
                ..Self::default()
            }
        }

        pub fn failing_job_inserts() -> Self {
            Self {
                fail_job_inserts: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl JobBoardStore for ScriptedStore {
        async fn get_user(&self, id: &UserId) -> FirestoreResult<Option<User>> {
            self.inner.get_user(id).await
        }

        async fn get_users(&self, ids: &[UserId]) -> FirestoreResult<Vec<User>> {
            self.inner.get_users(ids).await
        }

        async fn insert_user(&self, user: &User) -> FirestoreResult<()> {
            self.inner.insert_user(user).await
        }

        async fn update_user(&self, user: &User) -> FirestoreResult<()> {
            self.inner.update_user(user).await
        }

        async fn get_company(&self, id: &CompanyId) -> FirestoreResult<Option<Company>> {
            self.inner.get_company(id).await
        }

        async fn get_companies(&self, ids: &[CompanyId]) -> FirestoreResult<Vec<Company>> {
            self.inner.get_companies(ids).await
        }

        async fn find_company_by_name(&self, name: &str) -> FirestoreResult<Option<Company>> {
            self.inner.find_company_by_name(name).await
        }

        async fn list_companies_by_owner(&self, owner: &UserId) -> FirestoreResult<Vec<Company>> {
            self.inner.list_companies_by_owner(owner).await
        }

        async fn insert_company(&self, company: &Company) -> FirestoreResult<()> {
            self.inner.insert_company(company).await
        }

        async fn update_company(&self, company: &Company) -> FirestoreResult<()> {
            self.inner.update_company(company).await
        }

        async fn get_job(&self, id: &JobId) -> FirestoreResult<Option<Job>> {
            self.inner.get_job(id).await
        }

        async fn get_jobs(&self, ids: &[JobId]) -> FirestoreResult<Vec<Job>> {
            self.inner.get_jobs(ids).await
        }

        async fn list_jobs(&self) -> FirestoreResult<Vec<Job>> {
            self.inner.list_jobs().await
        }

        async fn list_jobs_by_creator(&self, creator: &UserId) -> FirestoreResult<Vec<Job>> {
            self.inner.list_jobs_by_creator(creator).await
        }

        async fn insert_job(&self, job: &Job) -> FirestoreResult<()> {
            if self.fail_job_inserts {
                return Err(FirestoreError::ServerError(
                    503,
                    "backend unavailable".to_string(),
                ));
            }
            self.inner.insert_job(job).await
        }

        async fn get_application(&self, id: &ApplicationId) -> FirestoreResult<Option<Application>> {
            self.inner.get_application(id).await
        }

        async fn get_applications(
            &self,
            ids: &[ApplicationId],
        ) -> FirestoreResult<Vec<Application>> {
            self.inner.get_applications(ids).await
        }

        async fn find_application(
            &self,
            job: &JobId,
            applicant: &UserId,
        ) -> FirestoreResult<Option<Application>> {
            if self.blind_application_lookup {
                return Ok(None);
            }
            self.inner.find_application(job, applicant).await
        }

        async fn list_applications_by_applicant(
            &self,
            applicant: &UserId,
        ) -> FirestoreResult<Vec<Application>> {
            self.inner.list_applications_by_applicant(applicant).await
        }

        async fn insert_application(
            &self,
            app: &Application,
            link_to_job: bool,
        ) -> FirestoreResult<()> {
            self.inner.insert_application(app, link_to_job).await
        }

        async fn update_application_status(
            &self,
            id: &ApplicationId,
            status: &ApplicationStatus,
        ) -> FirestoreResult<Option<Application>> {
            self.inner.update_application_status(id, status).await
        }

        async fn ping(&self) -> FirestoreResult<()> {
            self.inner.ping().await
        }
    }
}
