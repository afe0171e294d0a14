use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The two mutually exclusive account roles. Role is set at registration and
/// no endpoint mutates it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "user_role", rename_all = "kebab-case")]
pub enum UserRole {
    Employer,
    Candidate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "experience_level", rename_all = "kebab-case")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    Executive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "education_level", rename_all = "kebab-case")]
pub enum EducationLevel {
    HighSchool,
    Bachelor,
    Master,
    Phd,
}

/// Stored reference to an uploaded resume. File storage is an external
/// collaborator; only the filename/path pair lives here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRef {
    #[sqlx(rename = "resume_filename")]
    pub filename: Option<String>,
    #[sqlx(rename = "resume_path")]
    pub path: Option<String>,
}

/// A user row. The password hash never reaches a client: it is skipped on
/// serialization.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub experience: Option<ExperienceLevel>,
    pub education: Option<EducationLevel>,
    #[sqlx(flatten)]
    pub resume: ResumeRef,
    pub profile_picture: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Restricted candidate projection for employer-side search and the public
/// candidate page. Excludes contact-sensitive fields beyond what is listed.
/// Email is only filled by employer-scoped queries; `sqlx(default)` lets a
/// projection without that column decode to `None`.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub experience: Option<ExperienceLevel>,
    pub education: Option<EducationLevel>,
    pub bio: Option<String>,
}
