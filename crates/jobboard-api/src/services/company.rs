//! Company registration and management.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use jobboard_firestore::{FirestoreError, JobBoardStore};
use jobboard_models::{Company, CompanyId};

use crate::auth::CallerContext;
use crate::error::{ApiError, ApiResult};
use crate::metrics;

const DUPLICATE_NAME: &str = "You can't register same company.";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCompanyRequest {
    #[serde(alias = "name")]
    pub company_name: Option<String>,
}

/// Partial company update. Absent fields are left unchanged; blank optional
/// fields are cleared.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCompanyRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub logo: Option<String>,
}

fn cleared_if_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Clone)]
pub struct CompanyService {
    store: Arc<dyn JobBoardStore>,
}

impl CompanyService {
    pub fn new(store: Arc<dyn JobBoardStore>) -> Self {
        Self { store }
    }

    /// Register a company owned by the caller.
    pub async fn register(&self, caller: &CallerContext, name: Option<&str>) -> ApiResult<Company> {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ApiError::bad_request("Company name is required."))?;

        if self.store.find_company_by_name(name).await?.is_some() {
            return Err(ApiError::conflict(DUPLICATE_NAME));
        }

        let company = Company::new(name, caller.user_id.clone());
        self.store.insert_company(&company).await?;

        metrics::record_company_registered();
        info!(company_id = %company.id, owner = %caller.user_id, "Company registered");

        Ok(company)
    }

    /// Companies owned by the caller, newest first. `NotFound` when there are none.
    pub async fn owned(&self, caller: &CallerContext) -> ApiResult<Vec<Company>> {
        let companies = self.store.list_companies_by_owner(&caller.user_id).await?;
        if companies.is_empty() {
            return Err(ApiError::not_found("Companies not found."));
        }
        Ok(companies)
    }

    pub async fn get(&self, raw_id: &str) -> ApiResult<Company> {
        let not_found = || ApiError::not_found("Company not found.");
        let id = CompanyId::parse(raw_id).map_err(|_| not_found())?;
        self.store.get_company(&id).await?.ok_or_else(not_found)
    }

    /// Apply a partial update and return the stored company.
    pub async fn update(
        &self,
        caller: &CallerContext,
        raw_id: &str,
        update: UpdateCompanyRequest,
    ) -> ApiResult<Company> {
        let mut company = self.get(raw_id).await?;

        if let Some(name) = update.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            if name != company.name {
                if let Some(existing) = self.store.find_company_by_name(name).await? {
                    if existing.id != company.id {
                        return Err(ApiError::conflict(DUPLICATE_NAME));
                    }
                }
                company.name = name.to_string();
            }
        }
        if let Some(description) = update.description {
            company.description = cleared_if_blank(description);
        }
        if let Some(website) = update.website {
            company.website = cleared_if_blank(website);
        }
        if let Some(location) = update.location {
            company.location = cleared_if_blank(location);
        }
        if let Some(logo) = update.logo {
            company.logo = cleared_if_blank(logo);
        }
        company.updated_at = Utc::now();

        self.store.update_company(&company).await.map_err(|e| match e {
            FirestoreError::NotFound(_) => ApiError::not_found("Company not found."),
            other => other.into(),
        })?;

        info!(company_id = %company.id, updated_by = %caller.user_id, "Company updated");
        Ok(company)
    }
}
