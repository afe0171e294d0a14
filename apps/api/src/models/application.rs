use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::user::{ResumeRef, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "application_status", rename_all = "kebab-case")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Shortlisted,
    Interviewed,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "availability", rename_all = "kebab-case")]
pub enum Availability {
    Immediate,
    #[serde(rename = "2-weeks")]
    #[sqlx(rename = "2-weeks")]
    TwoWeeks,
    #[serde(rename = "1-month")]
    #[sqlx(rename = "1-month")]
    OneMonth,
    #[serde(rename = "3-months")]
    #[sqlx(rename = "3-months")]
    ThreeMonths,
    Flexible,
}

/// Per-party notes. Each side writes only its own slot.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notes {
    #[sqlx(rename = "employer_notes")]
    pub employer: Option<String>,
    #[sqlx(rename = "candidate_notes")]
    pub candidate: Option<String>,
}

/// A candidate's submission against one job. At most one row exists per
/// (job, candidate) pair, enforced by a unique index.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub employer_id: Uuid,
    pub status: ApplicationStatus,
    pub cover_letter: String,
    #[sqlx(flatten)]
    pub resume: ResumeRef,
    pub additional_documents: serde_json::Value,
    pub expected_salary: Option<i64>,
    pub availability: Option<Availability>,
    #[sqlx(flatten)]
    pub notes: Notes,
    pub is_viewed: bool,
    pub viewed_at: Option<DateTime<Utc>>,
    pub applied_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Which notes slot a given user writes to, based on their side of the
    /// application. `None` when the user is party to neither side.
    pub fn notes_slot_for(&self, user_id: Uuid) -> Option<UserRole> {
        if self.candidate_id == user_id {
            Some(UserRole::Candidate)
        } else if self.employer_id == user_id {
            Some(UserRole::Employer)
        } else {
            None
        }
    }

    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.notes_slot_for(user_id).is_some()
    }
}

/// An application joined with its referenced job/candidate/employer
/// projections (built as JSON in the query). The job may be null when the
/// posting was deleted after the application was submitted.
///
/// `sqlx(default)` so a query that does not project one of the reference
/// columns still decodes; the derive alone errors on a missing column.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApplicationDetailRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub application: Application,
    #[sqlx(default)]
    pub job: Option<sqlx::types::Json<serde_json::Value>>,
    #[sqlx(default)]
    pub candidate: Option<sqlx::types::Json<serde_json::Value>>,
    #[sqlx(default)]
    pub employer: Option<sqlx::types::Json<serde_json::Value>>,
}

/// One bucket of the employer's per-status application counts.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StatusCount {
    pub status: ApplicationStatus,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_application(candidate_id: Uuid, employer_id: Uuid) -> Application {
        Application {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            candidate_id,
            employer_id,
            status: ApplicationStatus::Pending,
            cover_letter: "I would like to apply.".into(),
            resume: ResumeRef {
                filename: None,
                path: None,
            },
            additional_documents: serde_json::json!([]),
            expected_salary: None,
            availability: Some(Availability::TwoWeeks),
            notes: Notes {
                employer: None,
                candidate: None,
            },
            is_viewed: false,
            viewed_at: None,
            applied_at: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_wire_names() {
        for (variant, raw) in [
            (ApplicationStatus::Pending, "pending"),
            (ApplicationStatus::Reviewed, "reviewed"),
            (ApplicationStatus::Shortlisted, "shortlisted"),
            (ApplicationStatus::Interviewed, "interviewed"),
            (ApplicationStatus::Accepted, "accepted"),
            (ApplicationStatus::Rejected, "rejected"),
        ] {
            assert_eq!(serde_json::to_value(variant).unwrap(), raw);
        }
    }

    #[test]
    fn test_availability_wire_names() {
        for (variant, raw) in [
            (Availability::Immediate, "immediate"),
            (Availability::TwoWeeks, "2-weeks"),
            (Availability::OneMonth, "1-month"),
            (Availability::ThreeMonths, "3-months"),
            (Availability::Flexible, "flexible"),
        ] {
            assert_eq!(serde_json::to_value(variant).unwrap(), raw);
            let parsed: Availability =
                serde_json::from_value(serde_json::Value::String(raw.into())).unwrap();
            assert_eq!(parsed, variant);
        }
    }

    #[test]
    fn test_notes_slot_candidate() {
        let candidate = Uuid::new_v4();
        let employer = Uuid::new_v4();
        let app = sample_application(candidate, employer);
        assert_eq!(app.notes_slot_for(candidate), Some(UserRole::Candidate));
        assert_eq!(app.notes_slot_for(employer), Some(UserRole::Employer));
    }

    #[test]
    fn test_notes_slot_stranger() {
        let app = sample_application(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(app.notes_slot_for(Uuid::new_v4()), None);
        assert!(!app.is_party(Uuid::new_v4()));
    }

    #[test]
    fn test_application_serializes_nested_notes() {
        let app = sample_application(Uuid::new_v4(), Uuid::new_v4());
        let json = serde_json::to_value(app).unwrap();
        assert!(json["notes"].get("employer").is_some());
        assert_eq!(json["status"], "pending");
        assert_eq!(json["availability"], "2-weeks");
        assert_eq!(json["isViewed"], false);
    }
}
