//! Profile handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use jobboard_models::User;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::JsonBody;
use crate::services::user::UpdateProfileRequest;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user: User,
    pub success: bool,
}

/// Get the caller's profile.
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<ProfileResponse>> {
    let user = state.users.profile(&caller).await?;
    Ok(Json(ProfileResponse {
        user,
        success: true,
    }))
}

#[derive(Serialize)]
pub struct UpdateProfileResponse {
    pub message: String,
    pub user: User,
    pub success: bool,
}

/// Update the caller's profile fields.
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    JsonBody(request): JsonBody<UpdateProfileRequest>,
) -> ApiResult<Json<UpdateProfileResponse>> {
    let user = state.users.update_profile(&caller, request).await?;
    Ok(Json(UpdateProfileResponse {
        message: "Profile updated successfully.".to_string(),
        user,
        success: true,
    }))
}
