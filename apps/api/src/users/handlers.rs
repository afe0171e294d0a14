use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::applications::queries as application_queries;
use crate::auth::extract::{AuthUser, Employer};
use crate::errors::AppError;
use crate::jobs::queries as job_queries;
use crate::models::application::ApplicationStatus;
use crate::models::user::{EducationLevel, ExperienceLevel, UserRole};
use crate::state::AppState;
use crate::users::queries::{self, CandidateFilters, ProfileChanges};
use crate::validation::Validator;

/// GET /api/users/profile
pub async fn handle_get_profile(AuthUser(user): AuthUser) -> Json<Value> {
    Json(json!({ "user": user }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub company: Option<String>,
}

/// PUT /api/users/profile
///
/// Accepts a fixed allow-list of mutable fields; anything else in the body
/// is ignored.
pub async fn handle_update_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let mut v = Validator::new();
    v.non_empty("firstName", req.first_name.as_deref());
    v.non_empty("lastName", req.last_name.as_deref());
    v.max_len("bio", req.bio.as_deref(), 500);
    let experience: Option<ExperienceLevel> = v.one_of("experience", req.experience.as_deref());
    let education: Option<EducationLevel> = v.one_of("education", req.education.as_deref());
    v.finish()?;

    let changes = ProfileChanges {
        first_name: req.first_name.map(|s| s.trim().to_string()),
        last_name: req.last_name.map(|s| s.trim().to_string()),
        phone: req.phone.map(|s| s.trim().to_string()),
        location: req.location.map(|s| s.trim().to_string()),
        bio: req.bio,
        skills: req.skills,
        experience,
        education,
        company: req.company.map(|s| s.trim().to_string()),
    };
    let user = queries::update_profile(&state.db, user.id, &changes).await?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": user
    })))
}

#[derive(Debug, Deserialize)]
pub struct ResumeUploadRequest {
    pub filename: Option<String>,
    pub path: Option<String>,
}

/// POST /api/users/resume (candidate only)
///
/// File storage is an external collaborator; only the filename/path
/// reference is recorded here.
pub async fn handle_upload_resume(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ResumeUploadRequest>,
) -> Result<Json<Value>, AppError> {
    if user.role != UserRole::Candidate {
        return Err(AppError::Forbidden(
            "Only candidates can upload resumes.".into(),
        ));
    }

    let mut v = Validator::new();
    v.require("filename", req.filename.as_deref());
    v.require("path", req.path.as_deref());
    v.finish()?;

    let user = queries::set_resume(
        &state.db,
        user.id,
        req.filename.as_deref().unwrap_or_default(),
        req.path.as_deref().unwrap_or_default(),
    )
    .await?;

    Ok(Json(json!({
        "message": "Resume uploaded successfully",
        "resume": user.resume
    })))
}

/// GET /api/users/stats
///
/// Role-dependent aggregate counts.
pub async fn handle_stats(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let stats = match user.role {
        UserRole::Employer => {
            let total_jobs = job_queries::count_by_employer(&state.db, user.id).await?;
            let active_jobs = job_queries::count_active_by_employer(&state.db, user.id).await?;
            let total_applications =
                application_queries::count_for_employer(&state.db, user.id).await?;
            let recent_applications =
                application_queries::recent_count_for_employer(&state.db, user.id).await?;
            json!({
                "totalJobs": total_jobs,
                "activeJobs": active_jobs,
                "totalApplications": total_applications,
                "recentApplications": recent_applications
            })
        }
        UserRole::Candidate => {
            let total = application_queries::count_for_candidate(&state.db, user.id).await?;
            let pending = application_queries::count_for_candidate_with_status(
                &state.db,
                user.id,
                ApplicationStatus::Pending,
            )
            .await?;
            let shortlisted = application_queries::count_for_candidate_with_status(
                &state.db,
                user.id,
                ApplicationStatus::Shortlisted,
            )
            .await?;
            let accepted = application_queries::count_for_candidate_with_status(
                &state.db,
                user.id,
                ApplicationStatus::Accepted,
            )
            .await?;
            json!({
                "totalApplications": total,
                "pendingApplications": pending,
                "shortlistedApplications": shortlisted,
                "acceptedApplications": accepted
            })
        }
    };

    Ok(Json(json!({ "stats": stats })))
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateSearchQuery {
    pub search: Option<String>,
    pub skills: Option<String>,
    pub experience: Option<String>,
    pub location: Option<String>,
}

/// GET /api/users/search-candidates (employer only)
pub async fn handle_search_candidates(
    Employer(_user): Employer,
    State(state): State<AppState>,
    Query(q): Query<CandidateSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let mut v = Validator::new();
    let experience: Option<ExperienceLevel> = v.one_of("experience", q.experience.as_deref());
    v.finish()?;

    let filters = CandidateFilters {
        search: q.search.as_ref().map(|s| s.trim().to_string()),
        skills: parse_skill_list(q.skills.as_deref()),
        experience,
        location: q.location.as_ref().map(|s| s.trim().to_string()),
    };
    let candidates = queries::search_candidates(&state.db, &filters).await?;

    Ok(Json(json!({ "candidates": candidates })))
}

/// Splits a comma-separated skill list, dropping empty entries.
fn parse_skill_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// GET /api/users/candidate/:id (public)
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let candidate = queries::candidate_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Candidate not found.".into()))?;

    Ok(Json(json!({ "candidate": candidate })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skill_list() {
        assert_eq!(
            parse_skill_list(Some("rust, sql , ,axum")),
            vec!["rust", "sql", "axum"]
        );
        assert!(parse_skill_list(None).is_empty());
        assert!(parse_skill_list(Some("  ")).is_empty());
    }

    #[test]
    fn test_update_profile_ignores_unknown_fields() {
        let req: UpdateProfileRequest = serde_json::from_value(serde_json::json!({
            "firstName": "Ada",
            "role": "employer",
            "isVerified": true,
            "email": "sneaky@example.com"
        }))
        .unwrap();
        assert_eq!(req.first_name.as_deref(), Some("Ada"));
        // role/email/isVerified are not part of the allow-list struct at all;
        // nothing in the update path can write them.
    }

    #[test]
    fn test_update_profile_parses_allow_list() {
        let req: UpdateProfileRequest = serde_json::from_value(serde_json::json!({
            "bio": "Hi",
            "skills": ["rust", "sql"],
            "experience": "senior",
            "education": "master"
        }))
        .unwrap();
        assert_eq!(req.skills.as_deref().map(|s| s.len()), Some(2));
        assert_eq!(req.experience.as_deref(), Some("senior"));
    }
}
