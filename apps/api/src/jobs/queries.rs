use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{Job, JobDetailRow, JobListRow, JobType};
use crate::models::user::{EducationLevel, ExperienceLevel};
use crate::validation::escape_like;

/// Employer name/company projection attached to listing rows.
const EMPLOYER_SUMMARY: &str = "jsonb_build_object(
    'id', u.id,
    'firstName', u.first_name,
    'lastName', u.last_name,
    'company', u.company
) AS employer";

/// Employer contact projection for the single-job page.
const EMPLOYER_CONTACT: &str = "jsonb_build_object(
    'id', u.id,
    'firstName', u.first_name,
    'lastName', u.last_name,
    'company', u.company,
    'email', u.email,
    'phone', u.phone,
    'location', u.location
) AS employer";

/// Validated listing filters. Listings are always restricted to active jobs.
#[derive(Debug, Default)]
pub struct JobFilters {
    pub search: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub experience: Option<ExperienceLevel>,
    pub category: Option<String>,
    pub remote: Option<bool>,
}

/// Appends the WHERE clauses shared by the listing and count queries.
fn push_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, filters: &'a JobFilters) {
    qb.push(" WHERE j.is_active = TRUE");

    if let Some(search) = &filters.search {
        qb.push(" AND j.search_tsv @@ websearch_to_tsquery('english', ");
        qb.push_bind(search);
        qb.push(")");
    }
    if let Some(location) = &filters.location {
        qb.push(" AND j.location ILIKE ");
        qb.push_bind(format!("%{}%", escape_like(location)));
    }
    if let Some(job_type) = filters.job_type {
        qb.push(" AND j.job_type = ");
        qb.push_bind(job_type);
    }
    if let Some(experience) = filters.experience {
        qb.push(" AND j.experience = ");
        qb.push_bind(experience);
    }
    if let Some(category) = &filters.category {
        qb.push(" AND j.category ILIKE ");
        qb.push_bind(format!("%{}%", escape_like(category)));
    }
    if let Some(remote) = filters.remote {
        qb.push(" AND j.is_remote = ");
        qb.push_bind(remote);
    }
}

/// Filtered, paginated page of active jobs, newest first, with employer
/// name/company attached.
pub async fn list_jobs(
    pool: &PgPool,
    filters: &JobFilters,
    page: i64,
    limit: i64,
) -> Result<Vec<JobListRow>, AppError> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT j.*, {EMPLOYER_SUMMARY} FROM jobs j JOIN users u ON u.id = j.employer_id"
    ));
    push_filters(&mut qb, filters);
    qb.push(" ORDER BY j.created_at DESC LIMIT ");
    qb.push_bind(limit);
    qb.push(" OFFSET ");
    qb.push_bind((page - 1) * limit);

    Ok(qb.build_query_as().fetch_all(pool).await?)
}

/// Total number of jobs matching the filters.
pub async fn count_jobs(pool: &PgPool, filters: &JobFilters) -> Result<i64, AppError> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM jobs j");
    push_filters(&mut qb, filters);
    Ok(qb.build_query_scalar().fetch_one(pool).await?)
}

/// Up to six active featured jobs for the homepage highlight set.
pub async fn featured_jobs(pool: &PgPool) -> Result<Vec<JobListRow>, AppError> {
    Ok(sqlx::query_as(&format!(
        "SELECT j.*, {EMPLOYER_SUMMARY}
         FROM jobs j JOIN users u ON u.id = j.employer_id
         WHERE j.is_active = TRUE AND j.is_featured = TRUE
         ORDER BY j.created_at DESC
         LIMIT 6"
    ))
    .fetch_all(pool)
    .await?)
}

pub async fn find_job(pool: &PgPool, id: Uuid) -> Result<Option<Job>, AppError> {
    Ok(sqlx::query_as("SELECT * FROM jobs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn find_job_with_employer(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<JobDetailRow>, AppError> {
    Ok(sqlx::query_as(&format!(
        "SELECT j.*, {EMPLOYER_CONTACT}
         FROM jobs j JOIN users u ON u.id = j.employer_id
         WHERE j.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?)
}

/// Adds one to the view counter. Callers only invoke this for active jobs.
pub async fn increment_views(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    sqlx::query("UPDATE jobs SET views = views + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Adds one to the application counter after a successful submission.
pub async fn increment_applications(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    sqlx::query("UPDATE jobs SET applications = applications + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Fields of a validated create request.
pub struct NewJob<'a> {
    pub title: &'a str,
    pub company: &'a str,
    pub employer_id: Uuid,
    pub description: &'a str,
    pub requirements: &'a str,
    pub responsibilities: &'a str,
    pub location: &'a str,
    pub job_type: JobType,
    pub experience: ExperienceLevel,
    pub education: EducationLevel,
    pub salary_min: i64,
    pub salary_max: i64,
    pub salary_currency: &'a str,
    pub skills: &'a [String],
    pub benefits: &'a [String],
    pub category: &'a str,
    pub industry: &'a str,
    pub is_remote: bool,
    pub is_featured: bool,
    pub application_deadline: Option<DateTime<Utc>>,
}

pub async fn create_job(pool: &PgPool, new: NewJob<'_>) -> Result<Job, AppError> {
    Ok(sqlx::query_as(
        r#"
        INSERT INTO jobs
            (title, company, employer_id, description, requirements, responsibilities,
             location, job_type, experience, education, salary_min, salary_max,
             salary_currency, skills, benefits, category, industry, is_remote,
             is_featured, application_deadline)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
        RETURNING *
        "#,
    )
    .bind(new.title)
    .bind(new.company)
    .bind(new.employer_id)
    .bind(new.description)
    .bind(new.requirements)
    .bind(new.responsibilities)
    .bind(new.location)
    .bind(new.job_type)
    .bind(new.experience)
    .bind(new.education)
    .bind(new.salary_min)
    .bind(new.salary_max)
    .bind(new.salary_currency)
    .bind(new.skills)
    .bind(new.benefits)
    .bind(new.category)
    .bind(new.industry)
    .bind(new.is_remote)
    .bind(new.is_featured)
    .bind(new.application_deadline)
    .fetch_one(pool)
    .await?)
}

/// Validated partial-update set. `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct JobChanges {
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub responsibilities: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub experience: Option<ExperienceLevel>,
    pub education: Option<EducationLevel>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_currency: Option<String>,
    pub skills: Option<Vec<String>>,
    pub benefits: Option<Vec<String>>,
    pub category: Option<String>,
    pub industry: Option<String>,
    pub is_remote: Option<bool>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub application_deadline: Option<DateTime<Utc>>,
}

/// Applies only the fields present in the change set.
pub async fn update_job(pool: &PgPool, id: Uuid, changes: &JobChanges) -> Result<Job, AppError> {
    let mut qb = QueryBuilder::new("UPDATE jobs SET updated_at = now()");
    push_changes(&mut qb, changes);
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    qb.push(" RETURNING *");
    Ok(qb.build_query_as().fetch_one(pool).await?)
}

fn push_changes<'a>(qb: &mut QueryBuilder<'a, Postgres>, changes: &'a JobChanges) {
    macro_rules! set {
        ($column:literal, $value:expr) => {
            if let Some(value) = $value {
                qb.push(concat!(", ", $column, " = "));
                qb.push_bind(value);
            }
        };
    }
    set!("title", &changes.title);
    set!("company", &changes.company);
    set!("description", &changes.description);
    set!("requirements", &changes.requirements);
    set!("responsibilities", &changes.responsibilities);
    set!("location", &changes.location);
    set!("job_type", changes.job_type);
    set!("experience", changes.experience);
    set!("education", changes.education);
    set!("salary_min", changes.salary_min);
    set!("salary_max", changes.salary_max);
    set!("salary_currency", &changes.salary_currency);
    set!("skills", &changes.skills);
    set!("benefits", &changes.benefits);
    set!("category", &changes.category);
    set!("industry", &changes.industry);
    set!("is_remote", changes.is_remote);
    set!("is_active", changes.is_active);
    set!("is_featured", changes.is_featured);
    set!("application_deadline", changes.application_deadline);
}

pub async fn count_by_employer(pool: &PgPool, employer_id: Uuid) -> Result<i64, AppError> {
    Ok(
        sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE employer_id = $1")
            .bind(employer_id)
            .fetch_one(pool)
            .await?,
    )
}

pub async fn count_active_by_employer(pool: &PgPool, employer_id: Uuid) -> Result<i64, AppError> {
    Ok(sqlx::query_scalar(
        "SELECT COUNT(*) FROM jobs WHERE employer_id = $1 AND is_active = TRUE",
    )
    .bind(employer_id)
    .fetch_one(pool)
    .await?)
}

/// All jobs posted by one employer, newest first, active or not.
pub async fn jobs_by_employer(pool: &PgPool, employer_id: Uuid) -> Result<Vec<Job>, AppError> {
    Ok(
        sqlx::query_as("SELECT * FROM jobs WHERE employer_id = $1 ORDER BY created_at DESC")
            .bind(employer_id)
            .fetch_all(pool)
            .await?,
    )
}

/// Flips the active flag and returns the updated row.
pub async fn toggle_status(pool: &PgPool, id: Uuid) -> Result<Job, AppError> {
    Ok(sqlx::query_as(
        "UPDATE jobs SET is_active = NOT is_active, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_one(pool)
    .await?)
}

pub async fn delete_job(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    sqlx::query("DELETE FROM jobs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_sql(filters: &JobFilters) -> String {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM jobs j");
        push_filters(&mut qb, filters);
        qb.into_sql()
    }

    #[test]
    fn test_no_filters_restricts_to_active() {
        let sql = filter_sql(&JobFilters::default());
        assert_eq!(sql, "SELECT COUNT(*) FROM jobs j WHERE j.is_active = TRUE");
    }

    #[test]
    fn test_search_uses_text_index() {
        let sql = filter_sql(&JobFilters {
            search: Some("rust backend".into()),
            ..Default::default()
        });
        assert!(sql.contains("websearch_to_tsquery"));
        assert!(sql.contains("search_tsv"));
    }

    #[test]
    fn test_all_filters_appear_once() {
        let sql = filter_sql(&JobFilters {
            search: Some("rust".into()),
            location: Some("berlin".into()),
            job_type: Some(JobType::Contract),
            experience: Some(ExperienceLevel::Senior),
            category: Some("eng".into()),
            remote: Some(true),
        });
        for clause in [
            "j.location ILIKE",
            "j.job_type =",
            "j.experience =",
            "j.category ILIKE",
            "j.is_remote =",
        ] {
            assert_eq!(sql.matches(clause).count(), 1, "missing clause {clause}");
        }
    }

    #[test]
    fn test_changes_only_touch_present_fields() {
        let changes = JobChanges {
            title: Some("Staff Engineer".into()),
            salary_max: Some(150_000),
            ..Default::default()
        };
        let mut qb = QueryBuilder::new("UPDATE jobs SET updated_at = now()");
        push_changes(&mut qb, &changes);
        let sql = qb.into_sql();
        assert!(sql.contains("title ="));
        assert!(sql.contains("salary_max ="));
        assert!(!sql.contains("description ="));
        assert!(!sql.contains("is_active ="));
    }

    #[test]
    fn test_empty_changes_still_touch_updated_at() {
        let changes = JobChanges::default();
        let mut qb = QueryBuilder::new("UPDATE jobs SET updated_at = now()");
        push_changes(&mut qb, &changes);
        assert_eq!(qb.into_sql(), "UPDATE jobs SET updated_at = now()");
    }
}
