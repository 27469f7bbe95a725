//! Per-field schema violations.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::ValidationErrors;

/// A single rejected field, as reported to API clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldViolation {
    /// Field name as it appears in JSON
    pub field: String,
    pub message: String,
    /// Rule that failed (e.g. "length", "range", "Number")
    pub kind: String,
    /// Offending value, when known
    pub value: Value,
}

impl FieldViolation {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        kind: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            kind: kind.into(),
            value,
        }
    }
}

/// Flatten `validator` errors into violations sorted by field name.
pub fn violations_from(errors: &ValidationErrors) -> Vec<FieldViolation> {
    let mut violations: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = to_camel_case(&field.to_string());
            errs.iter().map(move |e| FieldViolation {
                field: field.clone(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Validation failed: {}", e.code)),
                kind: e.code.to_string(),
                value: e.params.get("value").cloned().unwrap_or(Value::Null),
            })
        })
        .collect();

    violations.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.kind.cmp(&b.kind)));
    violations
}

fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper = false;
    for c in s.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("job_type"), "jobType");
        assert_eq!(to_camel_case("experience_level"), "experienceLevel");
        assert_eq!(to_camel_case("title"), "title");
    }
}
