//! Document identifiers.
//!
//! Every entity is keyed by a 24-character lowercase hex string: four bytes
//! of big-endian creation seconds followed by eight random bytes. Sorting ids
//! lexically therefore sorts them by creation second.

use std::fmt;

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ModelError, ModelResult};

/// Length of an identifier in hex characters.
pub const ID_LEN: usize = 24;

/// Check whether a string is a well-formed identifier (24 hex digits, any case).
pub fn is_well_formed_id(s: &str) -> bool {
    s.len() == ID_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Generate a fresh identifier.
fn generate_id() -> String {
    let secs = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
    let random = Uuid::new_v4();

    let mut out = String::with_capacity(ID_LEN);
    for byte in secs.to_be_bytes().iter().chain(&random.as_bytes()[..8]) {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

macro_rules! document_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a new identifier.
            pub fn new() -> Self {
                Self(generate_id())
            }

            /// Parse a caller-supplied identifier, normalizing to lowercase.
            pub fn parse(s: &str) -> ModelResult<Self> {
                if is_well_formed_id(s) {
                    Ok(Self(s.to_ascii_lowercase()))
                } else {
                    Err(ModelError::InvalidId(s.to_string()))
                }
            }

            /// Wrap a stored identifier without validation.
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Get the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

document_id!(
    /// Identifier of a user record.
    UserId
);

document_id!(
    /// Identifier of a company record.
    CompanyId
);

document_id!(
    /// Identifier of a job posting.
    JobId
);

document_id!(
    /// Identifier of a job application.
    ApplicationId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_well_formed() {
        let id = JobId::new();
        assert_eq!(id.as_str().len(), ID_LEN);
        assert!(is_well_formed_id(id.as_str()));
        assert_eq!(id.as_str(), id.as_str().to_ascii_lowercase());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(ApplicationId::new(), ApplicationId::new());
    }

    #[test]
    fn test_parse_normalizes_case() {
        let id = CompanyId::parse("65A1B2C3D4E5F60718293A4B").unwrap();
        assert_eq!(id.as_str(), "65a1b2c3d4e5f60718293a4b");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(JobId::parse("").is_err());
        assert!(JobId::parse("not-an-id").is_err());
        assert!(JobId::parse("65a1b2c3d4e5f60718293a4").is_err());
        assert!(JobId::parse("65a1b2c3d4e5f60718293a4bz").is_err());
        assert!(JobId::parse("zza1b2c3d4e5f60718293a4b").is_err());
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = UserId::from_string("65a1b2c3d4e5f60718293a4b");
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"65a1b2c3d4e5f60718293a4b\""
        );
    }
}
