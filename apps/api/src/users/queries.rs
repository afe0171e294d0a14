use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{CandidateSummary, EducationLevel, ExperienceLevel, User};
use crate::validation::escape_like;

/// Validated profile changes. `None` leaves the column untouched; fields
/// outside this set are never written (submitting them is silently ignored).
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<ExperienceLevel>,
    pub education: Option<EducationLevel>,
    pub company: Option<String>,
}

pub async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    changes: &ProfileChanges,
) -> Result<User, AppError> {
    let mut qb = QueryBuilder::new("UPDATE users SET updated_at = now()");
    push_changes(&mut qb, changes);
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    qb.push(" RETURNING *");
    Ok(qb.build_query_as().fetch_one(pool).await?)
}

fn push_changes<'a>(qb: &mut QueryBuilder<'a, Postgres>, changes: &'a ProfileChanges) {
    macro_rules! set {
        ($column:literal, $value:expr) => {
            if let Some(value) = $value {
                qb.push(concat!(", ", $column, " = "));
                qb.push_bind(value);
            }
        };
    }
    set!("first_name", &changes.first_name);
    set!("last_name", &changes.last_name);
    set!("phone", &changes.phone);
    set!("location", &changes.location);
    set!("bio", &changes.bio);
    set!("skills", &changes.skills);
    set!("experience", changes.experience);
    set!("education", changes.education);
    set!("company", &changes.company);
}

/// Stores the resume filename/path reference on the user row.
pub async fn set_resume(
    pool: &PgPool,
    id: Uuid,
    filename: &str,
    path: &str,
) -> Result<User, AppError> {
    Ok(sqlx::query_as(
        "UPDATE users
         SET resume_filename = $2, resume_path = $3, updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(filename)
    .bind(path)
    .fetch_one(pool)
    .await?)
}

/// Candidate search filters for the employer-side directory.
#[derive(Debug, Default)]
pub struct CandidateFilters {
    pub search: Option<String>,
    pub skills: Vec<String>,
    pub experience: Option<ExperienceLevel>,
    pub location: Option<String>,
}

const CANDIDATE_SEARCH_LIMIT: i64 = 20;

/// Active candidates matching the filters, restricted projection, capped
/// at twenty rows.
pub async fn search_candidates(
    pool: &PgPool,
    filters: &CandidateFilters,
) -> Result<Vec<CandidateSummary>, AppError> {
    let mut qb = QueryBuilder::new(
        "SELECT id, first_name, last_name, email, location, skills,
                experience, education, bio
         FROM users
         WHERE role = 'candidate' AND is_active = TRUE",
    );
    push_candidate_filters(&mut qb, filters);
    qb.push(" LIMIT ");
    qb.push_bind(CANDIDATE_SEARCH_LIMIT);

    Ok(qb.build_query_as().fetch_all(pool).await?)
}

fn push_candidate_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, filters: &'a CandidateFilters) {
    if let Some(search) = &filters.search {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (first_name ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR last_name ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR EXISTS (SELECT 1 FROM unnest(skills) AS s WHERE s ILIKE ");
        qb.push_bind(pattern);
        qb.push("))");
    }
    if !filters.skills.is_empty() {
        // Any-match against the explicit skill list.
        qb.push(" AND skills && ");
        qb.push_bind(&filters.skills);
    }
    if let Some(experience) = filters.experience {
        qb.push(" AND experience = ");
        qb.push_bind(experience);
    }
    if let Some(location) = &filters.location {
        qb.push(" AND location ILIKE ");
        qb.push_bind(format!("%{}%", escape_like(location)));
    }
}

/// Public candidate profile: no phone, and the email column is nulled out
/// rather than dropped so the shared row type always finds it.
const CANDIDATE_PUBLIC_SQL: &str =
    "SELECT id, first_name, last_name, NULL::text AS email, location, skills,
            experience, education, bio
     FROM users
     WHERE id = $1 AND role = 'candidate'";

pub async fn candidate_by_id(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<CandidateSummary>, AppError> {
    Ok(sqlx::query_as(CANDIDATE_PUBLIC_SQL)
        .bind(id)
        .fetch_optional(pool)
        .await?)
}
