//! Application workflow handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use jobboard_models::ApplicationId;

use crate::auth::{AuthUser, RecruiterUser};
use crate::error::ApiResult;
use crate::extract::JsonBody;
use crate::services::application::{AppliedJob, ApplicationRecord, JobApplicants};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResponse {
    pub message: String,
    pub success: bool,
    pub application_id: ApplicationId,
}

/// Apply the caller to a job.
pub async fn apply_job(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(job_id): Path<String>,
) -> ApiResult<(StatusCode, Json<ApplyResponse>)> {
    let application_id = state.applications.apply(&caller, &job_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApplyResponse {
            message: "Job applied successfully.".to_string(),
            success: true,
            application_id,
        }),
    ))
}

#[derive(Serialize)]
pub struct AppliedJobsResponse {
    pub applications: Vec<AppliedJob>,
    pub success: bool,
}

/// List the caller's applications.
pub async fn get_applied_jobs(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<AppliedJobsResponse>> {
    let applications = state.applications.applied_jobs(&caller).await?;
    Ok(Json(AppliedJobsResponse {
        applications,
        success: true,
    }))
}

#[derive(Serialize)]
pub struct ApplicantsResponse {
    #[serde(flatten)]
    pub list: JobApplicants,
    pub success: bool,
}

/// List applicants for a job.
pub async fn get_applicants(
    State(state): State<AppState>,
    RecruiterUser(_caller): RecruiterUser,
    Path(job_id): Path<String>,
) -> ApiResult<Json<ApplicantsResponse>> {
    let list = state.applications.applicants(&job_id).await?;
    Ok(Json(ApplicantsResponse {
        list,
        success: true,
    }))
}

/// Status change request. The status may arrive as any JSON value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<Value>,
}

impl UpdateStatusRequest {
    fn status_text(&self) -> Option<String> {
        match self.status.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Serialize)]
pub struct UpdateStatusResponse {
    pub message: String,
    pub success: bool,
    pub application: ApplicationRecord,
}

/// Update an application's status.
pub async fn update_status(
    State(state): State<AppState>,
    RecruiterUser(_caller): RecruiterUser,
    Path(application_id): Path<String>,
    JsonBody(request): JsonBody<UpdateStatusRequest>,
) -> ApiResult<Json<UpdateStatusResponse>> {
    let status = request.status_text();
    let application = state
        .applications
        .update_status(&application_id, status.as_deref())
        .await?;

    Ok(Json(UpdateStatusResponse {
        message: "Status updated successfully.".to_string(),
        success: true,
        application,
    }))
}
