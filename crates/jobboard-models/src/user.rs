//! User models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::ids::UserId;

/// Role carried by a user's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Job seeker
    #[default]
    Student,
    /// Posts jobs and reviews applications
    Recruiter,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Recruiter => "recruiter",
        }
    }
}

impl FromStr for UserRole {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(UserRole::Student),
            "recruiter" => Ok(UserRole::Recruiter),
            _ => Err(ModelError::InvalidRole(s.to_string())),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User record, provisioned by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,

    #[serde(default)]
    pub fullname: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub phone_number: String,

    #[serde(default)]
    pub role: UserRole,

    /// Resume location in object storage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user record.
    pub fn new(fullname: impl Into<String>, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: UserId::new(),
            fullname: fullname.into(),
            email: email.into(),
            phone_number: String::new(),
            role,
            resume_url: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in [UserRole::Student, UserRole::Recruiter] {
            assert_eq!(role.as_str().parse::<UserRole>(), Ok(role));
        }
        assert_eq!(
            "admin".parse::<UserRole>(),
            Err(ModelError::InvalidRole("admin".to_string()))
        );
    }

    #[test]
    fn test_user_serializes_camel_case() {
        let user = User::new("Ada Lovelace", "ada@example.com", UserRole::Student);
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["phoneNumber"], "");
        assert_eq!(json["role"], "student");
        assert!(json.get("resumeUrl").is_none());
    }
}
