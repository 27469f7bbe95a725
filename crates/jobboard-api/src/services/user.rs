//! User profiles: lookup and self-service updates.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use jobboard_firestore::{FirestoreError, JobBoardStore};
use jobboard_models::User;

use crate::auth::CallerContext;
use crate::error::{ApiError, ApiResult};

const USER_NOT_FOUND: &str = "User not found.";

/// Profile fields a user may change. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    /// Opaque resume reference. Blank clears it.
    pub resume_url: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn JobBoardStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn JobBoardStore>) -> Self {
        Self { store }
    }

    /// The caller's own user record.
    pub async fn profile(&self, caller: &CallerContext) -> ApiResult<User> {
        self.store
            .get_user(&caller.user_id)
            .await?
            .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))
    }

    /// Apply the given profile fields to the caller's record.
    pub async fn update_profile(
        &self,
        caller: &CallerContext,
        request: UpdateProfileRequest,
    ) -> ApiResult<User> {
        let mut user = self.profile(caller).await?;

        if let Some(fullname) = non_blank(request.fullname) {
            user.fullname = fullname;
        }
        if let Some(email) = non_blank(request.email) {
            if !email.contains('@') {
                return Err(ApiError::bad_request("Invalid email address."));
            }
            user.email = email;
        }
        if let Some(phone) = request.phone_number {
            user.phone_number = phone.trim().to_string();
        }
        if let Some(resume) = request.resume_url {
            user.resume_url = non_blank(Some(resume));
        }

        match self.store.update_user(&user).await {
            Ok(()) => {}
            Err(FirestoreError::NotFound(_)) => return Err(ApiError::not_found(USER_NOT_FOUND)),
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::*;
    use jobboard_models::{UserId, UserRole};

    #[tokio::test]
    async fn test_profile() {
        let store = store();
        let user = seed_user(&store, "Sam", UserRole::Student).await;
        let service = UserService::new(store);

        let profile = service.profile(&caller(&user)).await.unwrap();
        assert_eq!(profile.email, "sam@example.com");

        let stranger = CallerContext::new(UserId::new(), UserRole::Student);
        let err = service.profile(&stranger).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_profile_applies_given_fields() {
        let store = store();
        let user = seed_user(&store, "Sam", UserRole::Student).await;
        let service = UserService::new(store.clone());

        let updated = service
            .update_profile(
                &caller(&user),
                UpdateProfileRequest {
                    fullname: Some("  Sam Carter ".to_string()),
                    email: Some("".to_string()),
                    resume_url: Some("https://cdn.example.com/sam.pdf".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.fullname, "Sam Carter");
        assert_eq!(updated.email, "sam@example.com");
        assert_eq!(updated.phone_number, "555-0100");

        let stored = store.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.resume_url.as_deref(), Some("https://cdn.example.com/sam.pdf"));
        assert_eq!(stored.role, UserRole::Student);

        let cleared = service
            .update_profile(
                &caller(&user),
                UpdateProfileRequest {
                    resume_url: Some(" ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.resume_url.is_none());
    }

    #[tokio::test]
    async fn test_update_profile_rejects_bad_email_and_unknown_user() {
        let store = store();
        let user = seed_user(&store, "Sam", UserRole::Student).await;
        let service = UserService::new(store.clone());

        let err = service
            .update_profile(
                &caller(&user),
                UpdateProfileRequest {
                    email: Some("not-an-address".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        let stored = store.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.email, "sam@example.com");

        let stranger = CallerContext::new(UserId::new(), UserRole::Student);
        let err = service
            .update_profile(&stranger, UpdateProfileRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == USER_NOT_FOUND));
    }
}
