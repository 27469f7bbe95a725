//! Job listing: posting, searching and viewing jobs.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use jobboard_firestore::JobBoardStore;
use jobboard_models::{
    is_well_formed_id, normalize_requirements, Application, ApplicationId, Company, CompanyId,
    FieldViolation, Job, JobId, NewJob, NumericOrText, UserId,
};

use crate::auth::CallerContext;
use crate::error::{ApiError, ApiResult};
use crate::metrics;

const REQUIRED_FIELDS_MISSING: &str =
    "Required fields missing (title, description, location, jobType, experience, companyId).";

/// Raw job posting body. Fields stay loosely typed until coerced.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostJobRequest {
    pub title: Option<Value>,
    pub description: Option<Value>,
    pub requirements: Option<Value>,
    pub salary: Option<Value>,
    pub location: Option<Value>,
    pub job_type: Option<Value>,
    pub experience: Option<Value>,
    pub position: Option<Value>,
    pub company_id: Option<Value>,
}

/// A job with its company expanded.
///
/// `A` is the representation of the application list: ids for listings,
/// full records for the detail view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView<A> {
    #[serde(flatten)]
    pub job: JobFields,
    /// `None` when the company no longer exists
    pub company: Option<Company>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applications: Option<Vec<A>>,
}

/// Job attributes shared by every job view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFields {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<NumericOrText>,
    pub location: String,
    pub job_type: String,
    pub experience_level: NumericOrText,
    pub position: i64,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl JobFields {
    fn split(job: Job) -> (Self, CompanyId, Option<Vec<ApplicationId>>) {
        let fields = Self {
            id: job.id,
            title: job.title,
            description: job.description,
            requirements: job.requirements,
            salary: job.salary,
            location: job.location,
            job_type: job.job_type,
            experience_level: job.experience_level,
            position: job.position,
            created_by: job.created_by,
            created_at: job.created_at,
        };
        (fields, job.company, job.applications)
    }
}

/// Job detail with derived display values.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    pub job: JobView<Application>,
    pub total_applicants: usize,
    pub experience_display: String,
}

/// Text of a required field, `None` when absent or blank.
fn required_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Coerce a position count. Absent, null and empty values default to 0.
fn coerce_position(value: Option<&Value>) -> Result<i64, FieldViolation> {
    let cast_failure = |v: &Value| {
        let shown = match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        FieldViolation::new(
            "position",
            format!("Cast to Number failed for value \"{}\" at path \"position\"", shown),
            "Number",
            v.clone(),
        )
    };

    let number = match value {
        None | Some(Value::Null) => return Ok(0),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(0),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match number {
        Some(n) if n.is_finite() => Ok(n.trunc() as i64),
        _ => Err(cast_failure(value.unwrap_or(&Value::Null))),
    }
}

/// Job listing service.
#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn JobBoardStore>,
    expose_store_errors: bool,
}

impl JobService {
    pub fn new(store: Arc<dyn JobBoardStore>) -> Self {
        Self {
            store,
            expose_store_errors: false,
        }
    }

    /// Report store failures from `post_job` with their underlying message.
    pub fn with_error_details(mut self, expose: bool) -> Self {
        self.expose_store_errors = expose;
        self
    }

    /// Create a job posting on behalf of a recruiter.
    pub async fn post_job(&self, caller: &CallerContext, request: PostJobRequest) -> ApiResult<Job> {
        self.create_job(caller, request)
            .await
            .map_err(|err| match err {
                ApiError::Store(inner) if self.expose_store_errors => {
                    ApiError::Unexpected(inner.to_string())
                }
                other => other,
            })
    }

    async fn create_job(&self, caller: &CallerContext, request: PostJobRequest) -> ApiResult<Job> {
        let (title, description, location, job_type, experience, company_ref) = match (
            required_text(request.title.as_ref()),
            required_text(request.description.as_ref()),
            required_text(request.location.as_ref()),
            required_text(request.job_type.as_ref()),
            request.experience.as_ref().and_then(NumericOrText::from_json),
            required_text(request.company_id.as_ref()),
        ) {
            (Some(t), Some(d), Some(l), Some(jt), Some(e), Some(c)) => (t, d, l, jt, e, c),
            _ => return Err(ApiError::bad_request(REQUIRED_FIELDS_MISSING)),
        };

        let company = self.resolve_company(company_ref.trim()).await?;

        let position = coerce_position(request.position.as_ref())
            .map_err(|violation| ApiError::job_validation(vec![violation]))?;

        let job = Job::new(NewJob {
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            requirements: normalize_requirements(request.requirements.as_ref()),
            salary: request.salary.as_ref().and_then(NumericOrText::from_json),
            location: location.trim().to_string(),
            job_type,
            experience_level: experience,
            position,
            company: company.id.clone(),
            created_by: caller.user_id.clone(),
        });

        self.store.insert_job(&job).await?;

        metrics::record_job_posted();
        info!(job_id = %job.id, company = %company.name, created_by = %caller.user_id, "Job posted");

        Ok(job)
    }

    /// Resolve a company by id, or by exact name when the value is not an id.
    async fn resolve_company(&self, reference: &str) -> ApiResult<Company> {
        let found = if is_well_formed_id(reference) {
            let id = CompanyId::from_string(reference.to_ascii_lowercase());
            self.store.get_company(&id).await?
        } else {
            self.store.find_company_by_name(reference).await?
        };
        found.ok_or_else(|| ApiError::bad_request("Company not found"))
    }

    /// All jobs matching the keyword, newest first.
    pub async fn search(&self, keyword: Option<&str>) -> ApiResult<Vec<JobView<ApplicationId>>> {
        let keyword = keyword.map(str::trim).unwrap_or_default();
        let jobs: Vec<Job> = self
            .store
            .list_jobs()
            .await?
            .into_iter()
            .filter(|j| j.matches_keyword(keyword))
            .collect();
        self.with_companies(jobs).await
    }

    /// One job with company and applications expanded.
    pub async fn job_detail(&self, raw_job_id: &str) -> ApiResult<JobDetail> {
        let not_found = || ApiError::not_found("Job not found.");
        let job_id = JobId::parse(raw_job_id).map_err(|_| not_found())?;
        let job = self.store.get_job(&job_id).await?.ok_or_else(not_found)?;

        let total_applicants = job.total_applicants();
        let experience_display = job.experience_display();

        let company = self.store.get_company(&job.company).await?;

        let (fields, _, application_ids) = JobFields::split(job);
        let applications = match application_ids {
            Some(ids) => {
                let mut by_id: HashMap<_, _> = self
                    .store
                    .get_applications(&ids)
                    .await?
                    .into_iter()
                    .map(|a| (a.id.clone(), a))
                    .collect();
                // Keep list order, drop dangling ids
                Some(ids.iter().filter_map(|id| by_id.remove(id)).collect())
            }
            None => None,
        };

        Ok(JobDetail {
            job: JobView {
                job: fields,
                company,
                applications,
            },
            total_applicants,
            experience_display,
        })
    }

    /// Jobs created by the caller, newest first. `NotFound` when there are none.
    pub async fn admin_jobs(
        &self,
        caller: &CallerContext,
    ) -> ApiResult<Vec<JobView<ApplicationId>>> {
        let jobs = self.store.list_jobs_by_creator(&caller.user_id).await?;
        if jobs.is_empty() {
            return Err(ApiError::not_found("Jobs not found."));
        }
        self.with_companies(jobs).await
    }

    async fn with_companies(
        &self,
        jobs: Vec<Job>,
    ) -> ApiResult<Vec<JobView<ApplicationId>>> {
        let mut company_ids: Vec<CompanyId> = jobs.iter().map(|j| j.company.clone()).collect();
        company_ids.sort();
        company_ids.dedup();

        let companies: HashMap<CompanyId, Company> = self
            .store
            .get_companies(&company_ids)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        Ok(jobs
            .into_iter()
            .map(|job| {
                let (fields, company_id, applications) = JobFields::split(job);
                JobView {
                    job: fields,
                    company: companies.get(&company_id).cloned(),
                    applications,
                }
            })
            .collect())
    }
}
