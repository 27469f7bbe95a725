//! Job application models.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ModelError, ModelResult};
use crate::ids::{ApplicationId, JobId, UserId};

/// Review status of an application.
///
/// Stored documents may carry a value written by another client; such values
/// are kept as `Unrecognized` and displayed verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Unrecognized(String),
}

impl ApplicationStatus {
    /// Parse a caller-supplied status (case-insensitive).
    pub fn parse_input(s: &str) -> ModelResult<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ModelError::InvalidStatus(s.to_string())),
        }
    }

    /// Interpret a stored status value exactly as written.
    pub fn from_stored(s: impl Into<String>) -> Self {
        let s = s.into();
        match s.as_str() {
            "pending" => Self::Pending,
            "accepted" => Self::Accepted,
            "rejected" => Self::Rejected,
            _ => Self::Unrecognized(s),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Unrecognized(s) => s,
        }
    }

    /// Human-readable label shown to applicants and recruiters.
    pub fn display_label(&self) -> &str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Accepted => "Selected",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Unrecognized(s) => s,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ApplicationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ApplicationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_stored(raw))
    }
}

/// A user's application to a job posting.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,

    /// Job applied to
    pub job: JobId,

    /// Applying user
    pub applicant: UserId,

    #[serde(default)]
    #[schemars(with = "String")]
    pub status: ApplicationStatus,

    pub created_at: DateTime<Utc>,
}

impl Application {
    /// Create a new pending application.
    pub fn new(job: JobId, applicant: UserId) -> Self {
        Self {
            id: ApplicationId::new(),
            job,
            applicant,
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Store-level uniqueness key for the (job, applicant) pair.
    pub fn unique_key(&self) -> String {
        application_key(&self.job, &self.applicant)
    }
}

/// Build the uniqueness key for a (job, applicant) pair.
pub fn application_key(job: &JobId, applicant: &UserId) -> String {
    format!("{}_{}", job, applicant)
}
