//! Company models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::{CompanyId, UserId};

/// Company that jobs are posted under.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: CompanyId,

    /// Unique display name, also used as a lookup key
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,

    /// Registering user
    pub user_id: UserId,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Company {
    /// Create a new company owned by `user_id`.
    pub fn new(name: impl Into<String>, user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: CompanyId::new(),
            name: name.into(),
            description: None,
            website: None,
            location: None,
            logo: None,
            user_id,
            created_at: now,
            updated_at: now,
        }
    }
}
