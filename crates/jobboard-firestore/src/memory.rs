//! In-memory store for development and tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use jobboard_models::{
    Application, ApplicationId, ApplicationStatus, Company, CompanyId, Job, JobId, User, UserId,
};

use crate::error::{FirestoreError, FirestoreResult};
use crate::store::JobBoardStore;

#[derive(Default)]
struct Collections {
    users: HashMap<UserId, User>,
    companies: HashMap<CompanyId, Company>,
    jobs: HashMap<JobId, Job>,
    applications: HashMap<ApplicationId, Application>,
    application_keys: HashSet<String>,
}

/// Store backed by process memory. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T, F>(mut items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> (chrono::DateTime<chrono::Utc>, String),
{
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items
}

fn pick<K, V>(map: &HashMap<K, V>, ids: &[K]) -> Vec<V>
where
    K: std::hash::Hash + Eq,
    V: Clone,
{
    ids.iter().filter_map(|id| map.get(id).cloned()).collect()
}

#[async_trait]
impl JobBoardStore for InMemoryStore {
    async fn get_user(&self, id: &UserId) -> FirestoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn get_users(&self, ids: &[UserId]) -> FirestoreResult<Vec<User>> {
        Ok(pick(&self.inner.read().await.users, ids))
    }

    async fn insert_user(&self, user: &User) -> FirestoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(&user.id) {
            return Err(FirestoreError::AlreadyExists(format!("users/{}", user.id)));
        }
        inner.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> FirestoreResult<()> {
        let mut inner = self.inner.write().await;
        match inner.users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(FirestoreError::not_found(format!("users/{}", user.id))),
        }
    }

    async fn get_company(&self, id: &CompanyId) -> FirestoreResult<Option<Company>> {
        Ok(self.inner.read().await.companies.get(id).cloned())
    }

    async fn get_companies(&self, ids: &[CompanyId]) -> FirestoreResult<Vec<Company>> {
        Ok(pick(&self.inner.read().await.companies, ids))
    }

    async fn find_company_by_name(&self, name: &str) -> FirestoreResult<Option<Company>> {
        let inner = self.inner.read().await;
        let found: Vec<Company> = inner
            .companies
            .values()
            .filter(|c| c.name == name)
            .cloned()
            .collect();
        Ok(newest_first(found, |c: &Company| (c.created_at, c.id.to_string()))
            .into_iter()
            .next())
    }

    async fn list_companies_by_owner(&self, owner: &UserId) -> FirestoreResult<Vec<Company>> {
        let inner = self.inner.read().await;
        let owned: Vec<Company> = inner
            .companies
            .values()
            .filter(|c| &c.user_id == owner)
            .cloned()
            .collect();
        Ok(newest_first(owned, |c: &Company| (c.created_at, c.id.to_string())))
    }

    async fn insert_company(&self, company: &Company) -> FirestoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.companies.contains_key(&company.id) {
            return Err(FirestoreError::AlreadyExists(format!("companies/{}", company.id)));
        }
        inner.companies.insert(company.id.clone(), company.clone());
        Ok(())
    }

    async fn update_company(&self, company: &Company) -> FirestoreResult<()> {
        let mut inner = self.inner.write().await;
        match inner.companies.get_mut(&company.id) {
            Some(existing) => {
                *existing = company.clone();
                Ok(())
            }
            None => Err(FirestoreError::not_found(format!("companies/{}", company.id))),
        }
    }

    async fn get_job(&self, id: &JobId) -> FirestoreResult<Option<Job>> {
        Ok(self.inner.read().await.jobs.get(id).cloned())
    }

    async fn get_jobs(&self, ids: &[JobId]) -> FirestoreResult<Vec<Job>> {
        Ok(pick(&self.inner.read().await.jobs, ids))
    }

    async fn list_jobs(&self) -> FirestoreResult<Vec<Job>> {
        let jobs: Vec<Job> = self.inner.read().await.jobs.values().cloned().collect();
        Ok(newest_first(jobs, |j: &Job| (j.created_at, j.id.to_string())))
    }

    async fn list_jobs_by_creator(&self, creator: &UserId) -> FirestoreResult<Vec<Job>> {
        let inner = self.inner.read().await;
        let jobs: Vec<Job> = inner
            .jobs
            .values()
            .filter(|j| &j.created_by == creator)
            .cloned()
            .collect();
        Ok(newest_first(jobs, |j: &Job| (j.created_at, j.id.to_string())))
    }

    async fn insert_job(&self, job: &Job) -> FirestoreResult<()> {
        job.check_schema().map_err(FirestoreError::Validation)?;

        let mut inner = self.inner.write().await;
        if inner.jobs.contains_key(&job.id) {
            return Err(FirestoreError::AlreadyExists(format!("jobs/{}", job.id)));
        }
        inner.jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn get_application(&self, id: &ApplicationId) -> FirestoreResult<Option<Application>> {
        Ok(self.inner.read().await.applications.get(id).cloned())
    }

    async fn get_applications(&self, ids: &[ApplicationId]) -> FirestoreResult<Vec<Application>> {
        Ok(pick(&self.inner.read().await.applications, ids))
    }

    async fn find_application(
        &self,
        job: &JobId,
        applicant: &UserId,
    ) -> FirestoreResult<Option<Application>> {
        let inner = self.inner.read().await;
        Ok(inner
            .applications
            .values()
            .find(|a| &a.job == job && &a.applicant == applicant)
            .cloned())
    }

    async fn list_applications_by_applicant(
        &self,
        applicant: &UserId,
    ) -> FirestoreResult<Vec<Application>> {
        let inner = self.inner.read().await;
        let apps: Vec<Application> = inner
            .applications
            .values()
            .filter(|a| &a.applicant == applicant)
            .cloned()
            .collect();
        Ok(newest_first(apps, |a: &Application| (a.created_at, a.id.to_string())))
    }

    async fn insert_application(
        &self,
        app: &Application,
        link_to_job: bool,
    ) -> FirestoreResult<()> {
        let mut inner = self.inner.write().await;
        let key = app.unique_key();
        if inner.application_keys.contains(&key) {
            return Err(FirestoreError::DuplicateKey(key));
        }

        if link_to_job {
            let job = inner
                .jobs
                .get_mut(&app.job)
                .ok_or_else(|| FirestoreError::not_found(format!("jobs/{}", app.job)))?;
            let list = job.applications.get_or_insert_with(Vec::new);
            if !list.contains(&app.id) {
                list.push(app.id.clone());
            }
        }

        inner.application_keys.insert(key);
        inner.applications.insert(app.id.clone(), app.clone());
        debug!(application_id = %app.id, "Stored application in memory");
        Ok(())
    }

    async fn update_application_status(
        &self,
        id: &ApplicationId,
        status: &ApplicationStatus,
    ) -> FirestoreResult<Option<Application>> {
        let mut inner = self.inner.write().await;
        Ok(inner.applications.get_mut(id).map(|app| {
            app.status = status.clone();
            app.clone()
        }))
    }

    async fn ping(&self) -> FirestoreResult<()> {
        Ok(())
    }
}
