use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{Application, ApplicationDetailRow, ApplicationStatus, StatusCount};
use crate::models::user::UserRole;

/// Job summary projection, nullable because a posting may have been deleted
/// after the application was submitted.
const JOB_SUMMARY: &str = "CASE WHEN j.id IS NULL THEN NULL ELSE jsonb_build_object(
    'id', j.id,
    'title', j.title,
    'company', j.company,
    'location', j.location,
    'type', j.job_type,
    'salary', jsonb_build_object(
        'min', j.salary_min, 'max', j.salary_max, 'currency', j.salary_currency
    )
) END AS job";

const JOB_DETAIL: &str = "CASE WHEN j.id IS NULL THEN NULL ELSE jsonb_build_object(
    'id', j.id,
    'title', j.title,
    'company', j.company,
    'location', j.location,
    'type', j.job_type,
    'salary', jsonb_build_object(
        'min', j.salary_min, 'max', j.salary_max, 'currency', j.salary_currency
    ),
    'description', j.description,
    'requirements', j.requirements
) END AS job";

const EMPLOYER_SUMMARY: &str = "jsonb_build_object(
    'id', e.id,
    'firstName', e.first_name,
    'lastName', e.last_name,
    'company', e.company
) AS employer";

const EMPLOYER_CONTACT: &str = "jsonb_build_object(
    'id', e.id,
    'firstName', e.first_name,
    'lastName', e.last_name,
    'company', e.company,
    'email', e.email,
    'phone', e.phone
) AS employer";

const CANDIDATE_SUMMARY: &str = "jsonb_build_object(
    'id', c.id,
    'firstName', c.first_name,
    'lastName', c.last_name,
    'email', c.email,
    'phone', c.phone,
    'location', c.location,
    'skills', c.skills,
    'experience', c.experience
) AS candidate";

const CANDIDATE_DETAIL: &str = "jsonb_build_object(
    'id', c.id,
    'firstName', c.first_name,
    'lastName', c.last_name,
    'email', c.email,
    'phone', c.phone,
    'location', c.location,
    'skills', c.skills,
    'experience', c.experience,
    'bio', c.bio
) AS candidate";

pub struct NewApplication<'a> {
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub employer_id: Uuid,
    pub cover_letter: &'a str,
    pub expected_salary: Option<i64>,
    pub availability: Option<crate::models::application::Availability>,
}

/// Inserts the application row. A concurrent duplicate for the same
/// (job, candidate) pair loses to the unique index and surfaces as a
/// database error with SQLSTATE 23505.
pub async fn insert_application(
    pool: &PgPool,
    new: NewApplication<'_>,
) -> Result<Application, AppError> {
    Ok(sqlx::query_as(
        r#"
        INSERT INTO applications
            (job_id, candidate_id, employer_id, cover_letter, expected_salary, availability)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(new.job_id)
    .bind(new.candidate_id)
    .bind(new.employer_id)
    .bind(new.cover_letter)
    .bind(new.expected_salary)
    .bind(new.availability)
    .fetch_one(pool)
    .await?)
}

pub async fn find_application(pool: &PgPool, id: Uuid) -> Result<Option<Application>, AppError> {
    Ok(sqlx::query_as("SELECT * FROM applications WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

/// True when the candidate has already applied to the job.
pub async fn application_exists(
    pool: &PgPool,
    job_id: Uuid,
    candidate_id: Uuid,
) -> Result<bool, AppError> {
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM applications WHERE job_id = $1 AND candidate_id = $2")
            .bind(job_id)
            .bind(candidate_id)
            .fetch_optional(pool)
            .await?;
    Ok(existing.is_some())
}

// Every populated query must project all three reference columns
// (`job`, `candidate`, `employer`) so the row type decodes regardless of
// which sides the listing joins. Unjoined sides select `NULL::jsonb`.
fn detail_sql() -> String {
    format!(
        "SELECT a.*, {JOB_DETAIL}, {CANDIDATE_DETAIL}, {EMPLOYER_CONTACT}
         FROM applications a
         LEFT JOIN jobs j ON j.id = a.job_id
         JOIN users c ON c.id = a.candidate_id
         JOIN users e ON e.id = a.employer_id
         WHERE a.id = $1"
    )
}

fn by_candidate_sql() -> String {
    format!(
        "SELECT a.*, {JOB_SUMMARY}, NULL::jsonb AS candidate, {EMPLOYER_SUMMARY}
         FROM applications a
         LEFT JOIN jobs j ON j.id = a.job_id
         JOIN users e ON e.id = a.employer_id
         WHERE a.candidate_id = $1
         ORDER BY a.applied_at DESC"
    )
}

fn by_employer_sql() -> String {
    format!(
        "SELECT a.*, {JOB_SUMMARY}, {CANDIDATE_SUMMARY}, NULL::jsonb AS employer
         FROM applications a
         LEFT JOIN jobs j ON j.id = a.job_id
         JOIN users c ON c.id = a.candidate_id
         WHERE a.employer_id = $1
         ORDER BY a.applied_at DESC"
    )
}

/// Fully populated single application for the detail page.
pub async fn application_detail(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<ApplicationDetailRow>, AppError> {
    Ok(sqlx::query_as(&detail_sql())
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

/// A candidate's applications, newest first, with job and employer summaries.
pub async fn applications_by_candidate(
    pool: &PgPool,
    candidate_id: Uuid,
) -> Result<Vec<ApplicationDetailRow>, AppError> {
    Ok(sqlx::query_as(&by_candidate_sql())
        .bind(candidate_id)
        .fetch_all(pool)
        .await?)
}

/// Applications to all of an employer's jobs, newest first, with job and
/// candidate projections.
pub async fn applications_by_employer(
    pool: &PgPool,
    employer_id: Uuid,
) -> Result<Vec<ApplicationDetailRow>, AppError> {
    Ok(sqlx::query_as(&by_employer_sql())
        .bind(employer_id)
        .fetch_all(pool)
        .await?)
}

/// Sets the viewed flag and timestamp on first employer retrieval. The
/// guard makes repeated calls no-ops, so `viewed_at` never moves again.
pub async fn mark_as_viewed(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE applications
         SET is_viewed = TRUE, viewed_at = now(), updated_at = now()
         WHERE id = $1 AND is_viewed = FALSE",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Sets the status and, when given, overwrites the employer notes slot.
pub async fn set_status(
    pool: &PgPool,
    id: Uuid,
    status: ApplicationStatus,
    notes: Option<&str>,
) -> Result<Application, AppError> {
    Ok(sqlx::query_as(
        "UPDATE applications
         SET status = $2, employer_notes = COALESCE($3, employer_notes), updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(status)
    .bind(notes)
    .fetch_one(pool)
    .await?)
}

/// Writes the notes slot belonging to the caller's side of the application.
pub async fn set_notes(
    pool: &PgPool,
    id: Uuid,
    slot: UserRole,
    notes: &str,
) -> Result<Application, AppError> {
    let sql = match slot {
        UserRole::Candidate => {
            "UPDATE applications SET candidate_notes = $2, updated_at = now()
             WHERE id = $1 RETURNING *"
        }
        UserRole::Employer => {
            "UPDATE applications SET employer_notes = $2, updated_at = now()
             WHERE id = $1 RETURNING *"
        }
    };
    Ok(sqlx::query_as(sql)
        .bind(id)
        .bind(notes)
        .fetch_one(pool)
        .await?)
}

pub async fn delete_application(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    sqlx::query("DELETE FROM applications WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Per-status counts over all applications to the employer's jobs.
pub async fn status_counts(pool: &PgPool, employer_id: Uuid) -> Result<Vec<StatusCount>, AppError> {
    Ok(sqlx::query_as(
        "SELECT status, COUNT(*) AS count FROM applications
         WHERE employer_id = $1 GROUP BY status",
    )
    .bind(employer_id)
    .fetch_all(pool)
    .await?)
}

pub async fn count_for_employer(pool: &PgPool, employer_id: Uuid) -> Result<i64, AppError> {
    Ok(
        sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE employer_id = $1")
            .bind(employer_id)
            .fetch_one(pool)
            .await?,
    )
}

/// Applications to the employer's jobs submitted in the trailing seven days.
pub async fn recent_count_for_employer(
    pool: &PgPool,
    employer_id: Uuid,
) -> Result<i64, AppError> {
    Ok(sqlx::query_scalar(
        "SELECT COUNT(*) FROM applications
         WHERE employer_id = $1 AND applied_at >= now() - INTERVAL '7 days'",
    )
    .bind(employer_id)
    .fetch_one(pool)
    .await?)
}

pub async fn count_for_candidate(pool: &PgPool, candidate_id: Uuid) -> Result<i64, AppError> {
    Ok(
        sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE candidate_id = $1")
            .bind(candidate_id)
            .fetch_one(pool)
            .await?,
    )
}

pub async fn count_for_candidate_with_status(
    pool: &PgPool,
    candidate_id: Uuid,
    status: ApplicationStatus,
) -> Result<i64, AppError> {
    Ok(sqlx::query_scalar(
        "SELECT COUNT(*) FROM applications WHERE candidate_id = $1 AND status = $2",
    )
    .bind(candidate_id)
    .bind(status)
    .fetch_one(pool)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Row decoding reads the three reference columns by name, so a listing
    // that dropped one of them would fail at fetch time for every caller.
    #[test]
    fn test_populated_queries_project_all_reference_columns() {
        for sql in [detail_sql(), by_candidate_sql(), by_employer_sql()] {
            for alias in ["AS job", "AS candidate", "AS employer"] {
                assert!(sql.contains(alias), "missing `{alias}` in: {sql}");
            }
        }
    }

    #[test]
    fn test_listings_null_out_the_callers_own_side() {
        assert!(by_candidate_sql().contains("NULL::jsonb AS candidate"));
        assert!(by_employer_sql().contains("NULL::jsonb AS employer"));
        // The detail page populates all three for real.
        assert!(!detail_sql().contains("NULL::jsonb"));
    }
}
