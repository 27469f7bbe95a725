//! Mapping between entities and Firestore documents.
//!
//! Field names match the JSON names the API exposes. Readers tolerate
//! documents written by older clients: optional fields default, and a job
//! without an `applications` field keeps that absence.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use jobboard_models::{
    Application, ApplicationId, ApplicationStatus, Company, CompanyId, Job, JobId, NumericOrText,
    User, UserId, UserRole,
};

use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FromFirestoreValue, ToFirestoreValue, Value};

/// Collection names.
pub mod collections {
    pub const USERS: &str = "users";
    pub const COMPANIES: &str = "companies";
    pub const JOBS: &str = "jobs";
    pub const APPLICATIONS: &str = "applications";
    /// One document per (job, applicant) pair, keyed by `application_key`.
    pub const APPLICATION_KEYS: &str = "application_keys";
}

fn fields_of(doc: &Document) -> FirestoreResult<&HashMap<String, Value>> {
    doc.fields
        .as_ref()
        .ok_or_else(|| FirestoreError::InvalidResponse("Document has no fields".to_string()))
}

fn get_string(fields: &HashMap<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(String::from_firestore_value)
        .unwrap_or_default()
}

fn get_opt_string(fields: &HashMap<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(String::from_firestore_value)
}

fn get_timestamp(fields: &HashMap<String, Value>, key: &str) -> DateTime<Utc> {
    fields
        .get(key)
        .and_then(DateTime::<Utc>::from_firestore_value)
        .unwrap_or_else(Utc::now)
}

fn insert_opt(fields: &mut HashMap<String, Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        fields.insert(key.to_string(), v.to_firestore_value());
    }
}

// =============================================================================
// Users
// =============================================================================

pub fn user_to_fields(user: &User) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("fullname".to_string(), user.fullname.to_firestore_value());
    fields.insert("email".to_string(), user.email.to_firestore_value());
    fields.insert("phoneNumber".to_string(), user.phone_number.to_firestore_value());
    fields.insert("role".to_string(), user.role.as_str().to_firestore_value());
    insert_opt(&mut fields, "resumeUrl", &user.resume_url);
    fields.insert("createdAt".to_string(), user.created_at.to_firestore_value());
    fields
}

pub fn document_to_user(doc: &Document, id: &str) -> FirestoreResult<User> {
    let fields = fields_of(doc)?;

    Ok(User {
        id: UserId::from_string(id),
        fullname: get_string(fields, "fullname"),
        email: get_string(fields, "email"),
        phone_number: get_string(fields, "phoneNumber"),
        role: get_string(fields, "role").parse().unwrap_or_default(),
        resume_url: get_opt_string(fields, "resumeUrl"),
        created_at: get_timestamp(fields, "createdAt"),
    })
}

// =============================================================================
// Companies
// =============================================================================

pub fn company_to_fields(company: &Company) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("name".to_string(), company.name.to_firestore_value());
    insert_opt(&mut fields, "description", &company.description);
    insert_opt(&mut fields, "website", &company.website);
    insert_opt(&mut fields, "location", &company.location);
    insert_opt(&mut fields, "logo", &company.logo);
    fields.insert("userId".to_string(), company.user_id.as_str().to_firestore_value());
    fields.insert("createdAt".to_string(), company.created_at.to_firestore_value());
    fields.insert("updatedAt".to_string(), company.updated_at.to_firestore_value());
    fields
}

pub fn document_to_company(doc: &Document, id: &str) -> FirestoreResult<Company> {
    let fields = fields_of(doc)?;
    let created_at = get_timestamp(fields, "createdAt");

    Ok(Company {
        id: CompanyId::from_string(id),
        name: get_string(fields, "name"),
        description: get_opt_string(fields, "description"),
        website: get_opt_string(fields, "website"),
        location: get_opt_string(fields, "location"),
        logo: get_opt_string(fields, "logo"),
        user_id: UserId::from_string(doc.require::<String>("userId")?),
        created_at,
        updated_at: fields
            .get("updatedAt")
            .and_then(DateTime::<Utc>::from_firestore_value)
            .unwrap_or(created_at),
    })
}

// =============================================================================
// Jobs
// =============================================================================

fn numeric_or_text_value(value: &NumericOrText) -> Value {
    match value {
        NumericOrText::Numeric(n) => n.to_firestore_value(),
        NumericOrText::Text(s) => s.to_firestore_value(),
    }
}

fn numeric_or_text_from(value: &Value) -> Option<NumericOrText> {
    match value {
        Value::DoubleValue(_) | Value::IntegerValue(_) => {
            f64::from_firestore_value(value).map(NumericOrText::Numeric)
        }
        Value::StringValue(s) => Some(NumericOrText::Text(s.clone())),
        _ => None,
    }
}

pub fn job_to_fields(job: &Job) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("title".to_string(), job.title.to_firestore_value());
    fields.insert("description".to_string(), job.description.to_firestore_value());
    fields.insert("requirements".to_string(), job.requirements.to_firestore_value());
    if let Some(salary) = &job.salary {
        fields.insert("salary".to_string(), numeric_or_text_value(salary));
    }
    fields.insert("location".to_string(), job.location.to_firestore_value());
    fields.insert("jobType".to_string(), job.job_type.to_firestore_value());
    fields.insert(
        "experienceLevel".to_string(),
        numeric_or_text_value(&job.experience_level),
    );
    fields.insert("position".to_string(), job.position.to_firestore_value());
    fields.insert("company".to_string(), job.company.as_str().to_firestore_value());
    fields.insert("createdBy".to_string(), job.created_by.as_str().to_firestore_value());
    if let Some(applications) = &job.applications {
        let ids: Vec<String> = applications.iter().map(|a| a.to_string()).collect();
        fields.insert("applications".to_string(), ids.to_firestore_value());
    }
    fields.insert("createdAt".to_string(), job.created_at.to_firestore_value());
    fields
}

pub fn document_to_job(doc: &Document, id: &str) -> FirestoreResult<Job> {
    let fields = fields_of(doc)?;

    Ok(Job {
        id: JobId::from_string(id),
        title: get_string(fields, "title"),
        description: get_string(fields, "description"),
        requirements: fields
            .get("requirements")
            .and_then(Vec::<String>::from_firestore_value)
            .unwrap_or_default(),
        salary: fields.get("salary").and_then(numeric_or_text_from),
        location: get_string(fields, "location"),
        job_type: get_string(fields, "jobType"),
        experience_level: fields
            .get("experienceLevel")
            .and_then(numeric_or_text_from)
            .unwrap_or_else(|| NumericOrText::Text(String::new())),
        position: fields
            .get("position")
            .and_then(i64::from_firestore_value)
            .unwrap_or(0),
        company: CompanyId::from_string(doc.require::<String>("company")?),
        created_by: UserId::from_string(doc.require::<String>("createdBy")?),
        applications: fields
            .get("applications")
            .and_then(Vec::<String>::from_firestore_value)
            .map(|ids| ids.into_iter().map(ApplicationId::from_string).collect()),
        created_at: get_timestamp(fields, "createdAt"),
    })
}

// =============================================================================
// Applications
// =============================================================================

pub fn application_to_fields(app: &Application) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("job".to_string(), app.job.as_str().to_firestore_value());
    fields.insert("applicant".to_string(), app.applicant.as_str().to_firestore_value());
    fields.insert("status".to_string(), app.status.as_str().to_firestore_value());
    fields.insert("createdAt".to_string(), app.created_at.to_firestore_value());
    fields
}

pub fn document_to_application(doc: &Document, id: &str) -> FirestoreResult<Application> {
    let fields = fields_of(doc)?;

    Ok(Application {
        id: ApplicationId::from_string(id),
        job: JobId::from_string(doc.require::<String>("job")?),
        applicant: UserId::from_string(doc.require::<String>("applicant")?),
        status: get_opt_string(fields, "status")
            .map(ApplicationStatus::from_stored)
            .unwrap_or_default(),
        created_at: get_timestamp(fields, "createdAt"),
    })
}

/// Uniqueness marker for a (job, applicant) pair.
pub fn application_key_fields(app: &Application) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("application".to_string(), app.id.as_str().to_firestore_value());
    fields.insert("createdAt".to_string(), app.created_at.to_firestore_value());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobboard_models::NewJob;

    fn sample_job() -> Job {
        Job::new(NewJob {
            title: "Backend Engineer".to_string(),
            description: "APIs".to_string(),
            requirements: vec!["Rust".to_string(), "SQL".to_string()],
            salary: Some(NumericOrText::Text("Competitive".to_string())),
            location: "Berlin".to_string(),
            job_type: "Full-time".to_string(),
            experience_level: NumericOrText::Numeric(3.0),
            position: 2,
            company: CompanyId::new(),
            created_by: UserId::new(),
        })
    }

    #[test]
    fn test_job_fields_roundtrip() {
        let job = sample_job();
        let doc = Document::new(job_to_fields(&job));
        let parsed = document_to_job(&doc, job.id.as_str()).unwrap();

        assert_eq!(parsed.id, job.id);
        assert_eq!(parsed.requirements, job.requirements);
        assert_eq!(parsed.salary, job.salary);
        assert_eq!(parsed.experience_level, NumericOrText::Numeric(3.0));
        assert_eq!(parsed.position, 2);
        assert_eq!(parsed.applications, Some(vec![]));
        assert_eq!(parsed.company, job.company);
    }

    #[test]
    fn test_job_without_application_list_stays_absent() {
        let mut job = sample_job();
        job.applications = None;
        let fields = job_to_fields(&job);
        assert!(!fields.contains_key("applications"));

        let parsed = document_to_job(&Document::new(fields), job.id.as_str()).unwrap();
        assert_eq!(parsed.applications, None);
        assert_eq!(parsed.total_applicants(), 0);
    }

    #[test]
    fn test_job_missing_company_is_invalid() {
        let job = sample_job();
        let mut fields = job_to_fields(&job);
        fields.remove("company");
        assert!(document_to_job(&Document::new(fields), job.id.as_str()).is_err());
    }

    #[test]
    fn test_application_preserves_unrecognized_status() {
        let app = Application::new(JobId::new(), UserId::new());
        let mut fields = application_to_fields(&app);
        fields.insert("status".to_string(), Value::StringValue("Shortlisted".to_string()));

        let parsed = document_to_application(&Document::new(fields), app.id.as_str()).unwrap();
        assert_eq!(parsed.status.as_str(), "Shortlisted");
        assert_eq!(parsed.job, app.job);
    }

    #[test]
    fn test_integer_salary_reads_as_numeric() {
        let job = sample_job();
        let mut fields = job_to_fields(&job);
        fields.insert("salary".to_string(), Value::IntegerValue("85000".to_string()));
        let parsed = document_to_job(&Document::new(fields), job.id.as_str()).unwrap();
        assert_eq!(parsed.salary, Some(NumericOrText::Numeric(85000.0)));
    }

    #[test]
    fn test_user_roundtrip() {
        let user = User::new("Ada", "ada@example.com", UserRole::Recruiter);
        let parsed = document_to_user(&Document::new(user_to_fields(&user)), user.id.as_str()).unwrap();
        assert_eq!(parsed.role, UserRole::Recruiter);
        assert_eq!(parsed.fullname, "Ada");
        assert_eq!(parsed.resume_url, None);
    }

    #[test]
    fn test_unknown_role_reads_as_student() {
        let user = User::new("Ada", "ada@example.com", UserRole::Recruiter);
        let mut fields = user_to_fields(&user);
        fields.insert("role".to_string(), "admin".to_firestore_value());
        let parsed = document_to_user(&Document::new(fields), user.id.as_str()).unwrap();
        assert_eq!(parsed.role, UserRole::Student);
    }
}
