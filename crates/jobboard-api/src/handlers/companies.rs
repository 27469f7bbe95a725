//! Company handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use jobboard_models::Company;

use crate::auth::{AuthUser, RecruiterUser};
use crate::error::ApiResult;
use crate::extract::JsonBody;
use crate::services::company::{RegisterCompanyRequest, UpdateCompanyRequest};
use crate::state::AppState;

#[derive(Serialize)]
pub struct CompanyResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub company: Company,
    pub success: bool,
}

/// Register a company owned by the caller.
pub async fn register_company(
    State(state): State<AppState>,
    RecruiterUser(caller): RecruiterUser,
    JsonBody(request): JsonBody<RegisterCompanyRequest>,
) -> ApiResult<(StatusCode, Json<CompanyResponse>)> {
    let company = state
        .companies
        .register(&caller, request.company_name.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CompanyResponse {
            message: Some("Company registered successfully.".to_string()),
            company,
            success: true,
        }),
    ))
}

#[derive(Serialize)]
pub struct CompaniesResponse {
    pub companies: Vec<Company>,
    pub success: bool,
}

/// List the caller's companies.
pub async fn get_companies(
    State(state): State<AppState>,
    RecruiterUser(caller): RecruiterUser,
) -> ApiResult<Json<CompaniesResponse>> {
    let companies = state.companies.owned(&caller).await?;
    Ok(Json(CompaniesResponse {
        companies,
        success: true,
    }))
}

pub async fn get_company_by_id(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(company_id): Path<String>,
) -> ApiResult<Json<CompanyResponse>> {
    let company = state.companies.get(&company_id).await?;
    Ok(Json(CompanyResponse {
        message: None,
        company,
        success: true,
    }))
}

/// Update company details.
pub async fn update_company(
    State(state): State<AppState>,
    RecruiterUser(caller): RecruiterUser,
    Path(company_id): Path<String>,
    JsonBody(request): JsonBody<UpdateCompanyRequest>,
) -> ApiResult<Json<CompanyResponse>> {
    let company = state.companies.update(&caller, &company_id, request).await?;
    Ok(Json(CompanyResponse {
        message: Some("Company information updated.".to_string()),
        company,
        success: true,
    }))
}
