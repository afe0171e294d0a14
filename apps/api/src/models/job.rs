use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::user::{EducationLevel, ExperienceLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "job_type", rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Freelance,
}

/// Salary range, stored flat and serialized as a nested object.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Salary {
    #[sqlx(rename = "salary_min")]
    pub min: i64,
    #[sqlx(rename = "salary_max")]
    pub max: i64,
    #[sqlx(rename = "salary_currency")]
    pub currency: String,
}

/// A job posting row. `employer_id` is immutable after creation; only the
/// owning employer may mutate or delete the row.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub employer_id: Uuid,
    pub description: String,
    pub requirements: String,
    pub responsibilities: String,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub experience: ExperienceLevel,
    pub education: EducationLevel,
    #[sqlx(flatten)]
    pub salary: Salary,
    pub skills: Vec<String>,
    pub benefits: Vec<String>,
    pub category: String,
    pub industry: String,
    pub is_remote: bool,
    pub is_active: bool,
    pub is_featured: bool,
    pub application_deadline: Option<DateTime<Utc>>,
    pub views: i64,
    pub applications: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Employer identity carried on listing rows (name + company only).
/// Decoded from a `jsonb_build_object` projection in the listing queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
}

/// Employer contact block for the single-job page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerContact {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
}

/// A job joined with its employer's name/company, as returned by listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobListRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: Job,
    pub employer: sqlx::types::Json<EmployerSummary>,
}

/// A job joined with employer contact details, for `GET /api/jobs/:id`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobDetailRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: Job,
    pub employer: sqlx::types::Json<EmployerContact>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> Job {
        Job {
            id: Uuid::new_v4(),
            title: "Backend Engineer".into(),
            company: "Acme".into(),
            employer_id: Uuid::new_v4(),
            description: "Build APIs".into(),
            requirements: "Rust".into(),
            responsibilities: "Ship".into(),
            location: "Remote".into(),
            job_type: JobType::FullTime,
            experience: ExperienceLevel::Senior,
            education: EducationLevel::Bachelor,
            salary: Salary {
                min: 90_000,
                max: 120_000,
                currency: "USD".into(),
            },
            skills: vec!["rust".into(), "sql".into()],
            benefits: vec![],
            category: "Engineering".into(),
            industry: "Software".into(),
            is_remote: true,
            is_active: true,
            is_featured: false,
            application_deadline: None,
            views: 0,
            applications: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_job_type_wire_names() {
        assert_eq!(serde_json::to_value(JobType::FullTime).unwrap(), "full-time");
        assert_eq!(serde_json::to_value(JobType::PartTime).unwrap(), "part-time");
        assert_eq!(serde_json::to_value(JobType::Freelance).unwrap(), "freelance");
    }

    #[test]
    fn test_job_serializes_nested_salary_and_type_key() {
        let json = serde_json::to_value(sample_job()).unwrap();
        assert_eq!(json["salary"]["min"], 90_000);
        assert_eq!(json["salary"]["currency"], "USD");
        assert_eq!(json["type"], "full-time");
        assert!(json.get("jobType").is_none());
    }

    #[test]
    fn test_list_row_flattens_job_fields() {
        let row = JobListRow {
            job: sample_job(),
            employer: sqlx::types::Json(EmployerSummary {
                id: Uuid::new_v4(),
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                company: Some("Acme".into()),
            }),
        };
        let json = serde_json::to_value(row).unwrap();
        assert_eq!(json["title"], "Backend Engineer");
        assert_eq!(json["employer"]["firstName"], "Ada");
    }
}
