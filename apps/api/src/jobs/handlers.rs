use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::extract::Employer;
use crate::errors::AppError;
use crate::jobs::queries::{self, JobChanges, JobFilters, NewJob};
use crate::models::job::JobType;
use crate::models::user::{EducationLevel, ExperienceLevel, User};
use crate::pagination::{paginate, parse_page_params};
use crate::state::AppState;
use crate::validation::Validator;

/// Raw listing query parameters. Values arrive as strings and are validated
/// into `JobFilters` so malformed input surfaces as a 400 field-error list.
#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    pub experience: Option<String>,
    pub category: Option<String>,
    pub remote: Option<String>,
}

fn parse_filters(v: &mut Validator, q: &JobListQuery) -> JobFilters {
    let remote = match q.remote.as_deref() {
        None => None,
        Some("true") => Some(true),
        Some("false") => Some(false),
        Some(_) => {
            v.error("remote", "remote must be a boolean");
            None
        }
    };
    JobFilters {
        search: q.search.as_ref().map(|s| s.trim().to_string()),
        location: q.location.as_ref().map(|s| s.trim().to_string()),
        job_type: v.one_of::<JobType>("type", q.job_type.as_deref()),
        experience: v.one_of::<ExperienceLevel>("experience", q.experience.as_deref()),
        category: q.category.as_ref().map(|s| s.trim().to_string()),
        remote,
    }
}

/// GET /api/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(q): Query<JobListQuery>,
) -> Result<Json<Value>, AppError> {
    let mut v = Validator::new();
    let (page, limit) = parse_page_params(&mut v, q.page.as_deref(), q.limit.as_deref());
    let filters = parse_filters(&mut v, &q);
    v.finish()?;

    let jobs = queries::list_jobs(&state.db, &filters, page, limit).await?;
    let total = queries::count_jobs(&state.db, &filters).await?;

    Ok(Json(json!({
        "jobs": jobs,
        "pagination": paginate(page, limit, total),
        "total": total
    })))
}

/// GET /api/jobs/featured
pub async fn handle_featured_jobs(
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let jobs = queries::featured_jobs(&state.db).await?;
    Ok(Json(json!({ "jobs": jobs })))
}

/// GET /api/jobs/:id
///
/// Public. Reading an active job bumps its view counter; a failed bump is
/// logged and the read still succeeds.
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let mut row = queries::find_job_with_employer(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found.".into()))?;

    if row.job.is_active {
        match queries::increment_views(&state.db, id).await {
            Ok(()) => row.job.views += 1,
            Err(e) => tracing::warn!("Failed to increment views for job {id}: {e}"),
        }
    }

    Ok(Json(json!({ "job": row })))
}

#[derive(Debug, Deserialize)]
pub struct SalaryInput {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub responsibilities: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub salary: Option<SalaryInput>,
    pub skills: Option<Vec<String>>,
    pub benefits: Option<Vec<String>>,
    pub category: Option<String>,
    pub industry: Option<String>,
    pub is_remote: Option<bool>,
    pub is_featured: Option<bool>,
    pub application_deadline: Option<DateTime<Utc>>,
}

/// POST /api/jobs (employer only)
pub async fn handle_create_job(
    Employer(user): Employer,
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut v = Validator::new();
    v.require("title", req.title.as_deref());
    v.require("description", req.description.as_deref());
    v.require("requirements", req.requirements.as_deref());
    v.require("responsibilities", req.responsibilities.as_deref());
    v.require("location", req.location.as_deref());
    let job_type: Option<JobType> = v.require_one_of("type", req.job_type.as_deref());
    let experience: Option<ExperienceLevel> =
        v.require_one_of("experience", req.experience.as_deref());
    let education: Option<EducationLevel> = v.require_one_of("education", req.education.as_deref());
    let salary_min = req.salary.as_ref().and_then(|s| s.min);
    let salary_max = req.salary.as_ref().and_then(|s| s.max);
    v.require_number("salary.min", salary_min);
    v.require_number("salary.max", salary_max);
    v.require("category", req.category.as_deref());
    v.require("industry", req.industry.as_deref());

    // Company falls back to the employer's profile; if neither is set we
    // cannot satisfy the NOT NULL column.
    let company = user.company.clone().or_else(|| req.company.clone());
    if company.is_none() {
        v.error("company", "company is required");
    }
    v.finish()?;

    let (Some(job_type), Some(experience), Some(education), Some(company)) =
        (job_type, experience, education, company)
    else {
        return Err(AppError::BadRequest("Invalid job payload.".into()));
    };

    let job = queries::create_job(
        &state.db,
        NewJob {
            title: req.title.as_deref().unwrap_or_default().trim(),
            company: company.trim(),
            employer_id: user.id,
            description: req.description.as_deref().unwrap_or_default(),
            requirements: req.requirements.as_deref().unwrap_or_default(),
            responsibilities: req.responsibilities.as_deref().unwrap_or_default(),
            location: req.location.as_deref().unwrap_or_default().trim(),
            job_type,
            experience,
            education,
            salary_min: salary_min.unwrap_or_default(),
            salary_max: salary_max.unwrap_or_default(),
            salary_currency: req
                .salary
                .as_ref()
                .and_then(|s| s.currency.as_deref())
                .unwrap_or("USD"),
            skills: req.skills.as_deref().unwrap_or(&[]),
            benefits: req.benefits.as_deref().unwrap_or(&[]),
            category: req.category.as_deref().unwrap_or_default().trim(),
            industry: req.industry.as_deref().unwrap_or_default().trim(),
            is_remote: req.is_remote.unwrap_or(false),
            is_featured: req.is_featured.unwrap_or(false),
            application_deadline: req.application_deadline,
        },
    )
    .await?;

    tracing::info!("Employer {} created job {}", user.id, job.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Job created successfully",
            "job": job
        })),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub responsibilities: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub salary: Option<SalaryInput>,
    pub skills: Option<Vec<String>>,
    pub benefits: Option<Vec<String>>,
    pub category: Option<String>,
    pub industry: Option<String>,
    pub is_remote: Option<bool>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub application_deadline: Option<DateTime<Utc>>,
}

/// Loads the job and rejects the request unless `user` owns it.
async fn owned_job(
    state: &AppState,
    id: Uuid,
    user: &User,
    action: &str,
) -> Result<(), AppError> {
    let job = queries::find_job(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found.".into()))?;
    if job.employer_id != user.id {
        return Err(AppError::Forbidden(format!(
            "Not authorized to {action} this job."
        )));
    }
    Ok(())
}

/// PUT /api/jobs/:id (owning employer only)
///
/// Partial update: only fields present in the body are applied.
pub async fn handle_update_job(
    Employer(user): Employer,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateJobRequest>,
) -> Result<Json<Value>, AppError> {
    let mut v = Validator::new();
    v.non_empty("title", req.title.as_deref());
    v.non_empty("description", req.description.as_deref());
    v.non_empty("requirements", req.requirements.as_deref());
    v.non_empty("responsibilities", req.responsibilities.as_deref());
    v.non_empty("location", req.location.as_deref());
    let job_type: Option<JobType> = v.one_of("type", req.job_type.as_deref());
    let experience: Option<ExperienceLevel> = v.one_of("experience", req.experience.as_deref());
    let education: Option<EducationLevel> = v.one_of("education", req.education.as_deref());
    v.non_empty("category", req.category.as_deref());
    v.non_empty("industry", req.industry.as_deref());
    v.finish()?;

    owned_job(&state, id, &user, "update").await?;

    let changes = JobChanges {
        title: req.title,
        company: req.company,
        description: req.description,
        requirements: req.requirements,
        responsibilities: req.responsibilities,
        location: req.location,
        job_type,
        experience,
        education,
        salary_min: req.salary.as_ref().and_then(|s| s.min),
        salary_max: req.salary.as_ref().and_then(|s| s.max),
        salary_currency: req.salary.as_ref().and_then(|s| s.currency.clone()),
        skills: req.skills,
        benefits: req.benefits,
        category: req.category,
        industry: req.industry,
        is_remote: req.is_remote,
        is_active: req.is_active,
        is_featured: req.is_featured,
        application_deadline: req.application_deadline,
    };
    let job = queries::update_job(&state.db, id, &changes).await?;

    Ok(Json(json!({
        "message": "Job updated successfully",
        "job": job
    })))
}

/// DELETE /api/jobs/:id (owning employer only)
///
/// Existing applications keep referencing the deleted job id; they are not
/// cascaded and the counter is not reconciled.
pub async fn handle_delete_job(
    Employer(user): Employer,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    owned_job(&state, id, &user, "delete").await?;
    queries::delete_job(&state.db, id).await?;

    tracing::info!("Employer {} deleted job {id}", user.id);

    Ok(Json(json!({ "message": "Job deleted successfully" })))
}

/// GET /api/jobs/employer/my-jobs (employer only)
pub async fn handle_my_jobs(
    Employer(user): Employer,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let jobs = queries::jobs_by_employer(&state.db, user.id).await?;
    Ok(Json(json!({ "jobs": jobs })))
}

/// PATCH /api/jobs/:id/toggle-status (owning employer only)
pub async fn handle_toggle_status(
    Employer(user): Employer,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    owned_job(&state, id, &user, "update").await?;
    let job = queries::toggle_status(&state.db, id).await?;

    let message = if job.is_active {
        "Job activated successfully"
    } else {
        "Job deactivated successfully"
    };
    Ok(Json(json!({ "message": message, "job": job })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filters_accepts_valid_input() {
        let mut v = Validator::new();
        let q = JobListQuery {
            job_type: Some("contract".into()),
            experience: Some("senior".into()),
            remote: Some("true".into()),
            location: Some("  Berlin ".into()),
            ..Default::default()
        };
        let filters = parse_filters(&mut v, &q);
        assert!(v.is_empty());
        assert_eq!(filters.job_type, Some(JobType::Contract));
        assert_eq!(filters.experience, Some(ExperienceLevel::Senior));
        assert_eq!(filters.remote, Some(true));
        assert_eq!(filters.location.as_deref(), Some("Berlin"));
    }

    #[test]
    fn test_parse_filters_rejects_bad_enum() {
        let mut v = Validator::new();
        let q = JobListQuery {
            job_type: Some("fulltime".into()),
            ..Default::default()
        };
        parse_filters(&mut v, &q);
        assert!(!v.is_empty());
    }

    #[test]
    fn test_parse_filters_rejects_bad_remote() {
        let mut v = Validator::new();
        let q = JobListQuery {
            remote: Some("yes".into()),
            ..Default::default()
        };
        let filters = parse_filters(&mut v, &q);
        assert!(!v.is_empty());
        assert_eq!(filters.remote, None);
    }

    #[test]
    fn test_create_request_parses_nested_salary() {
        let req: CreateJobRequest = serde_json::from_value(serde_json::json!({
            "title": "Backend Engineer",
            "type": "full-time",
            "salary": { "min": 90000, "max": 120000 },
            "isRemote": true
        }))
        .unwrap();
        assert_eq!(req.salary.as_ref().and_then(|s| s.min), Some(90_000));
        assert_eq!(req.is_remote, Some(true));
        assert_eq!(req.job_type.as_deref(), Some("full-time"));
    }
}
