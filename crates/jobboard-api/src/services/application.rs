//! Application workflow: applying, listing and reviewing applications.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use jobboard_firestore::{FirestoreError, JobBoardStore};
use jobboard_models::{
    Application, ApplicationId, ApplicationStatus, Company, CompanyId, Job, JobId, User, UserId,
};

use crate::auth::CallerContext;
use crate::error::{ApiError, ApiResult};
use crate::metrics;

const ALREADY_APPLIED: &str = "You have already applied for this job.";

/// One of the caller's applications, with job and company resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedJob {
    pub id: ApplicationId,
    /// `None` when the job no longer exists
    pub job_id: Option<JobId>,
    pub job_title: String,
    pub company_name: String,
    pub status: String,
    pub status_display: String,
    pub applied_at: DateTime<Utc>,
}

/// An application to a job, with the applicant resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub id: ApplicationId,
    pub applicant_id: UserId,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub resume_url: Option<String>,
    pub status: String,
    pub status_display: String,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplicants {
    pub job_id: JobId,
    pub applicants: Vec<Applicant>,
}

/// Application as returned after a status change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub job: JobId,
    pub applicant: UserId,
    pub status: String,
    pub status_display: String,
    pub applied_at: DateTime<Utc>,
}

impl From<Application> for ApplicationRecord {
    fn from(app: Application) -> Self {
        Self {
            status: app.status.as_str().to_string(),
            status_display: app.status.display_label().to_string(),
            id: app.id,
            job: app.job,
            applicant: app.applicant,
            applied_at: app.created_at,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

fn newest_first(apps: &mut [Application]) {
    apps.sort_by(|a, b| {
        (b.created_at, b.id.as_str()).cmp(&(a.created_at, a.id.as_str()))
    });
}

/// Application workflow service.
#[derive(Clone)]
pub struct ApplicationService {
    store: Arc<dyn JobBoardStore>,
}

impl ApplicationService {
    pub fn new(store: Arc<dyn JobBoardStore>) -> Self {
        Self { store }
    }

    /// Apply the caller to a job. Returns the new application id.
    pub async fn apply(&self, caller: &CallerContext, raw_job_id: &str) -> ApiResult<ApplicationId> {
        if raw_job_id.trim().is_empty() {
            return Err(ApiError::bad_request("Job id is required."));
        }
        let job_id = JobId::parse(raw_job_id).map_err(|_| ApiError::bad_request("Invalid job id."))?;

        if self
            .store
            .find_application(&job_id, &caller.user_id)
            .await?
            .is_some()
        {
            metrics::record_duplicate_application();
            return Err(ApiError::conflict(ALREADY_APPLIED));
        }

        let job = self
            .store
            .get_job(&job_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Job not found"))?;

        let app = Application::new(job_id, caller.user_id.clone());
        let link_to_job = job.applications.is_some();

        match self.store.insert_application(&app, link_to_job).await {
            Ok(()) => {}
            Err(FirestoreError::DuplicateKey(key)) => {
                warn!(key = %key, "Concurrent duplicate application rejected by store");
                metrics::record_duplicate_application();
                return Err(ApiError::conflict(ALREADY_APPLIED));
            }
            Err(e) => return Err(e.into()),
        }

        metrics::record_application_created();
        info!(
            application_id = %app.id,
            job_id = %app.job,
            applicant = %app.applicant,
            linked = link_to_job,
            "Application created"
        );

        Ok(app.id)
    }

    /// The caller's applications, newest first.
    pub async fn applied_jobs(&self, caller: &CallerContext) -> ApiResult<Vec<AppliedJob>> {
        let apps = self
            .store
            .list_applications_by_applicant(&caller.user_id)
            .await?;
        if apps.is_empty() {
            return Ok(Vec::new());
        }

        let mut job_ids: Vec<JobId> = apps.iter().map(|a| a.job.clone()).collect();
        job_ids.sort();
        job_ids.dedup();
        let jobs: HashMap<JobId, Job> = self
            .store
            .get_jobs(&job_ids)
            .await?
            .into_iter()
            .map(|j| (j.id.clone(), j))
            .collect();

        let mut company_ids: Vec<CompanyId> = jobs.values().map(|j| j.company.clone()).collect();
        company_ids.sort();
        company_ids.dedup();
        let companies: HashMap<CompanyId, Company> = self
            .store
            .get_companies(&company_ids)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        Ok(apps
            .into_iter()
            .map(|app| {
                let job = jobs.get(&app.job);
                let company = job.and_then(|j| companies.get(&j.company));
                AppliedJob {
                    job_id: job.map(|j| j.id.clone()),
                    job_title: non_blank(job.map(|j| j.title.as_str()))
                        .unwrap_or("Unknown role")
                        .to_string(),
                    company_name: non_blank(company.map(|c| c.name.as_str()))
                        .unwrap_or("Unknown company")
                        .to_string(),
                    status: app.status.as_str().to_string(),
                    status_display: app.status.display_label().to_string(),
                    applied_at: app.created_at,
                    id: app.id,
                }
            })
            .collect())
    }

    /// Applications to a job, newest first, with applicants resolved.
    pub async fn applicants(&self, raw_job_id: &str) -> ApiResult<JobApplicants> {
        let job_id = JobId::parse(raw_job_id).map_err(|_| ApiError::bad_request("Invalid job id"))?;

        let job = self
            .store
            .get_job(&job_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Job not found."))?;

        let ids = job.applications.unwrap_or_default();
        let mut apps = self.store.get_applications(&ids).await?;
        newest_first(&mut apps);

        let mut user_ids: Vec<UserId> = apps.iter().map(|a| a.applicant.clone()).collect();
        user_ids.sort();
        user_ids.dedup();
        let users: HashMap<UserId, User> = self
            .store
            .get_users(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let applicants = apps
            .into_iter()
            .map(|app| {
                let user = users.get(&app.applicant);
                Applicant {
                    name: non_blank(user.map(|u| u.fullname.as_str()))
                        .unwrap_or("Unknown")
                        .to_string(),
                    email: user.map(|u| u.email.clone()).unwrap_or_default(),
                    phone_number: user.map(|u| u.phone_number.clone()).unwrap_or_default(),
                    resume_url: user
                        .and_then(|u| u.resume_url.clone())
                        .filter(|r| !r.trim().is_empty()),
                    status: app.status.as_str().to_string(),
                    status_display: app.status.display_label().to_string(),
                    applied_at: app.created_at,
                    applicant_id: app.applicant,
                    id: app.id,
                }
            })
            .collect();

        Ok(JobApplicants {
            job_id: job.id,
            applicants,
        })
    }

    /// Move an application to a new status.
    pub async fn update_status(
        &self,
        raw_application_id: &str,
        status: Option<&str>,
    ) -> ApiResult<ApplicationRecord> {
        let raw_status = non_blank(status).ok_or_else(|| ApiError::bad_request("status is required"))?;
        let status = ApplicationStatus::parse_input(raw_status.trim())
            .map_err(|_| ApiError::bad_request("Invalid status"))?;

        let id = ApplicationId::parse(raw_application_id)
            .map_err(|_| ApiError::not_found("Application not found."))?;

        let app = self
            .store
            .update_application_status(&id, &status)
            .await?
            .ok_or_else(|| ApiError::not_found("Application not found."))?;

        metrics::record_status_update(status.as_str());
        info!(application_id = %app.id, status = %status, "Application status updated");

        Ok(app.into())
    }
}
