//! Job posting models.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::ids::{ApplicationId, CompanyId, JobId, UserId};
use crate::validation::{violations_from, FieldViolation};

/// A value that is either a number or free text.
///
/// Used for salary ("85000" vs "Competitive") and experience level
/// (3 vs "1-3 years").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum NumericOrText {
    Numeric(f64),
    Text(String),
}

impl NumericOrText {
    /// Coerce raw text: numeric when it parses as a finite number, otherwise
    /// kept as given. Blank input yields `None`.
    pub fn coerce(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Some(Self::Numeric(n)),
            _ => Some(Self::Text(raw.to_string())),
        }
    }

    /// Coerce an arbitrary JSON value.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(n) => n.as_f64().map(Self::Numeric),
            Value::String(s) => Self::coerce(s),
            Value::Bool(b) => Some(Self::Text(b.to_string())),
            Value::Array(_) | Value::Object(_) => Some(Self::Text(value.to_string())),
        }
    }

    /// Experience display: "<n> yrs" for numbers, text verbatim, "" when blank.
    pub fn experience_display(&self) -> String {
        match self {
            NumericOrText::Numeric(n) => format!("{} yrs", n),
            NumericOrText::Text(s) if !s.trim().is_empty() => s.clone(),
            NumericOrText::Text(_) => String::new(),
        }
    }
}

/// Normalize a requirements payload into trimmed, non-empty strings.
///
/// Accepts an array of strings or a single comma-separated string.
pub fn normalize_requirements(value: Option<&Value>) -> Vec<String> {
    let items: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };

    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Validated input for a new job posting.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub salary: Option<NumericOrText>,
    pub location: String,
    pub job_type: String,
    pub experience_level: NumericOrText,
    pub position: i64,
    pub company: CompanyId,
    pub created_by: UserId,
}

/// Job posting stored in the document database.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,

    #[validate(length(min = 1, max = 200, message = "Job title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 10000, message = "Job description must be 1-10000 characters"))]
    pub description: String,

    #[serde(default)]
    #[validate(length(max = 50, message = "At most 50 requirements are allowed"))]
    pub requirements: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_salary"))]
    pub salary: Option<NumericOrText>,

    #[validate(length(min = 1, max = 200, message = "Location must be 1-200 characters"))]
    pub location: String,

    #[validate(length(min = 1, max = 100, message = "Job type must be 1-100 characters"))]
    pub job_type: String,

    #[validate(custom(function = "validate_experience"))]
    pub experience_level: NumericOrText,

    /// Number of open positions
    #[serde(default)]
    #[validate(range(min = 0, max = 100000, message = "Position count must be between 0 and 100000"))]
    pub position: i64,

    pub company: CompanyId,

    pub created_by: UserId,

    /// Applications received, oldest first. Absent on legacy documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applications: Option<Vec<ApplicationId>>,

    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Create a job record from validated input, with an empty application list.
    pub fn new(input: NewJob) -> Self {
        Self {
            id: JobId::new(),
            title: input.title,
            description: input.description,
            requirements: input.requirements,
            salary: input.salary,
            location: input.location,
            job_type: input.job_type,
            experience_level: input.experience_level,
            position: input.position,
            company: input.company,
            created_by: input.created_by,
            applications: Some(Vec::new()),
            created_at: Utc::now(),
        }
    }

    /// Run schema validation, reporting every failing field.
    pub fn check_schema(&self) -> Result<(), Vec<FieldViolation>> {
        self.validate().map_err(|e| violations_from(&e))
    }

    /// Number of applications on record (0 when the list is absent).
    pub fn total_applicants(&self) -> usize {
        self.applications.as_ref().map(Vec::len).unwrap_or(0)
    }

    pub fn experience_display(&self) -> String {
        self.experience_level.experience_display()
    }

    /// Case-insensitive substring match on title or description.
    /// An empty keyword matches every job.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        if keyword.is_empty() {
            return true;
        }
        let needle = keyword.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

fn validate_salary(salary: &NumericOrText) -> Result<(), ValidationError> {
    match salary {
        NumericOrText::Numeric(n) if *n < 0.0 => {
            let mut err = ValidationError::new("range");
            err.message = Some(Cow::from("Salary cannot be negative"));
            err.add_param(Cow::from("value"), n);
            Err(err)
        }
        _ => Ok(()),
    }
}

fn validate_experience(experience: &NumericOrText) -> Result<(), ValidationError> {
    match experience {
        NumericOrText::Numeric(n) if *n < 0.0 => {
            let mut err = ValidationError::new("range");
            err.message = Some(Cow::from("Experience cannot be negative"));
            err.add_param(Cow::from("value"), n);
            Err(err)
        }
        NumericOrText::Text(s) if s.trim().is_empty() => {
            let mut err = ValidationError::new("required");
            err.message = Some(Cow::from("Experience level is required"));
            err.add_param(Cow::from("value"), s);
            Err(err)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_input() -> NewJob {
        NewJob {
            title: "Engineer".to_string(),
            description: "Build things".to_string(),
            requirements: vec![],
            salary: None,
            location: "Remote".to_string(),
            job_type: "Full-time".to_string(),
            experience_level: NumericOrText::Numeric(2.0),
            position: 0,
            company: CompanyId::new(),
            created_by: UserId::new(),
        }
    }

    #[test]
    fn test_coerce_numeric_and_text() {
        assert_eq!(NumericOrText::coerce("85000"), Some(NumericOrText::Numeric(85000.0)));
        assert_eq!(NumericOrText::coerce(" 2.5 "), Some(NumericOrText::Numeric(2.5)));
        assert_eq!(
            NumericOrText::coerce("Competitive"),
            Some(NumericOrText::Text("Competitive".to_string()))
        );
        assert_eq!(NumericOrText::coerce("   "), None);
        assert_eq!(
            NumericOrText::coerce("NaN"),
            Some(NumericOrText::Text("NaN".to_string()))
        );
    }

    #[test]
    fn test_from_json() {
        assert_eq!(NumericOrText::from_json(&json!(12)), Some(NumericOrText::Numeric(12.0)));
        assert_eq!(NumericOrText::from_json(&json!("12")), Some(NumericOrText::Numeric(12.0)));
        assert_eq!(NumericOrText::from_json(&json!(null)), None);
        assert_eq!(NumericOrText::from_json(&json!("")), None);
    }

    #[test]
    fn test_experience_display() {
        assert_eq!(NumericOrText::Numeric(2.0).experience_display(), "2 yrs");
        assert_eq!(NumericOrText::Numeric(1.5).experience_display(), "1.5 yrs");
        assert_eq!(
            NumericOrText::Text("1-3 years".to_string()).experience_display(),
            "1-3 years"
        );
        assert_eq!(NumericOrText::Text("  ".to_string()).experience_display(), "");
    }

    #[test]
    fn test_untagged_serde() {
        assert_eq!(serde_json::to_value(NumericOrText::Numeric(3.0)).unwrap(), json!(3.0));
        let parsed: NumericOrText = serde_json::from_value(json!("senior")).unwrap();
        assert_eq!(parsed, NumericOrText::Text("senior".to_string()));
    }

    #[test]
    fn test_normalize_requirements() {
        assert_eq!(
            normalize_requirements(Some(&json!("Rust, SQL , ,Docker"))),
            vec!["Rust", "SQL", "Docker"]
        );
        assert_eq!(
            normalize_requirements(Some(&json!([" Rust ", "", "Go"]))),
            vec!["Rust", "Go"]
        );
        assert!(normalize_requirements(Some(&json!(""))).is_empty());
        assert!(normalize_requirements(None).is_empty());
        assert!(normalize_requirements(Some(&json!(42))).is_empty());
    }

    #[test]
    fn test_new_job_starts_with_empty_application_list() {
        let job = Job::new(sample_input());
        assert_eq!(job.applications, Some(vec![]));
        assert_eq!(job.total_applicants(), 0);
        assert!(job.check_schema().is_ok());
    }

    #[test]
    fn test_total_applicants_absent_list() {
        let mut job = Job::new(sample_input());
        job.applications = None;
        assert_eq!(job.total_applicants(), 0);
    }

    #[test]
    fn test_schema_violations_are_reported_per_field() {
        let mut job = Job::new(sample_input());
        job.title = String::new();
        job.position = -1;
        job.salary = Some(NumericOrText::Numeric(-10.0));

        let violations = job.check_schema().unwrap_err();
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["position", "salary", "title"]);

        let position = &violations[0];
        assert_eq!(position.kind, "range");
        assert_eq!(position.value, json!(-1));
    }

    #[test]
    fn test_matches_keyword() {
        let job = Job::new(sample_input());
        assert!(job.matches_keyword(""));
        assert!(job.matches_keyword("ENGINEER"));
        assert!(job.matches_keyword("things"));
        assert!(!job.matches_keyword("designer"));
    }
}
