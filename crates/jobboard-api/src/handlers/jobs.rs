//! Job listing handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use jobboard_models::{ApplicationId, Job};

use crate::auth::RecruiterUser;
use crate::error::ApiResult;
use crate::extract::JsonBody;
use crate::services::job::{JobDetail, JobView, PostJobRequest};
use crate::state::AppState;

#[derive(Serialize)]
pub struct PostJobResponse {
    pub message: String,
    pub job: Job,
    pub success: bool,
}

/// Create a job posting.
pub async fn post_job(
    State(state): State<AppState>,
    RecruiterUser(caller): RecruiterUser,
    JsonBody(request): JsonBody<PostJobRequest>,
) -> ApiResult<(StatusCode, Json<PostJobResponse>)> {
    let job = state.jobs.post_job(&caller, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(PostJobResponse {
            message: "New job created successfully.".to_string(),
            job,
            success: true,
        }),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct JobSearchQuery {
    pub keyword: Option<String>,
}

#[derive(Serialize)]
pub struct JobsResponse {
    pub jobs: Vec<JobView<ApplicationId>>,
    pub success: bool,
}

/// List jobs, optionally filtered by keyword.
pub async fn get_all_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobSearchQuery>,
) -> ApiResult<Json<JobsResponse>> {
    let jobs = state.jobs.search(query.keyword.as_deref()).await?;
    Ok(Json(JobsResponse {
        jobs,
        success: true,
    }))
}

#[derive(Serialize)]
pub struct JobDetailResponse {
    pub success: bool,
    #[serde(flatten)]
    pub detail: JobDetail,
}

/// Get one job with its company and applications.
pub async fn get_job_by_id(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobDetailResponse>> {
    let detail = state.jobs.job_detail(&job_id).await?;
    Ok(Json(JobDetailResponse {
        success: true,
        detail,
    }))
}

/// List jobs created by the calling recruiter.
pub async fn get_admin_jobs(
    State(state): State<AppState>,
    RecruiterUser(caller): RecruiterUser,
) -> ApiResult<Json<JobsResponse>> {
    let jobs = state.jobs.admin_jobs(&caller).await?;
    Ok(Json(JobsResponse {
        jobs,
        success: true,
    }))
}
