use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::applications::queries::{self, NewApplication};
use crate::auth::extract::{AuthUser, Candidate, Employer};
use crate::errors::AppError;
use crate::jobs::queries as job_queries;
use crate::models::application::{ApplicationStatus, Availability};
use crate::models::user::UserRole;
use crate::state::AppState;
use crate::validation::Validator;

pub const COVER_LETTER_MAX: usize = 2000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationRequest {
    pub job_id: Option<Uuid>,
    pub cover_letter: Option<String>,
    pub expected_salary: Option<i64>,
    pub availability: Option<String>,
}

/// POST /api/applications (candidate only)
///
/// Creating the row and bumping the job's applications counter are logically
/// one operation, but they are two writes: a failed bump after a persisted
/// row is logged and left uncompensated.
pub async fn handle_submit(
    Candidate(user): Candidate,
    State(state): State<AppState>,
    Json(req): Json<SubmitApplicationRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut v = Validator::new();
    if req.job_id.is_none() {
        v.error("jobId", "jobId is required");
    }
    v.require("coverLetter", req.cover_letter.as_deref());
    v.max_len("coverLetter", req.cover_letter.as_deref(), COVER_LETTER_MAX);
    let availability: Option<Availability> = v.one_of("availability", req.availability.as_deref());
    v.finish()?;

    let job_id = req
        .job_id
        .ok_or_else(|| AppError::BadRequest("jobId is required".into()))?;

    let job = job_queries::find_job(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found.".into()))?;

    if !job.is_active {
        return Err(AppError::BadRequest(
            "This job is no longer accepting applications.".into(),
        ));
    }

    if queries::application_exists(&state.db, job_id, user.id).await? {
        return Err(AppError::BadRequest(
            "You have already applied for this job.".into(),
        ));
    }

    let application = queries::insert_application(
        &state.db,
        NewApplication {
            job_id,
            candidate_id: user.id,
            employer_id: job.employer_id,
            cover_letter: req.cover_letter.as_deref().unwrap_or_default(),
            expected_salary: req.expected_salary,
            availability,
        },
    )
    .await
    .map_err(|e| {
        // Concurrent duplicate submissions race past the pre-check; the
        // unique index serializes them and the loser lands here.
        if e.is_unique_violation() {
            AppError::BadRequest("You have already applied for this job.".into())
        } else {
            e
        }
    })?;

    if let Err(e) = job_queries::increment_applications(&state.db, job_id).await {
        tracing::error!(
            "Application {} persisted but counter increment failed for job {job_id}: {e}",
            application.id
        );
    }

    tracing::info!(
        "Candidate {} applied to job {job_id} (application {})",
        user.id,
        application.id
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Application submitted successfully",
            "application": application
        })),
    ))
}

/// GET /api/applications/my-applications (candidate only)
pub async fn handle_my_applications(
    Candidate(user): Candidate,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let applications = queries::applications_by_candidate(&state.db, user.id).await?;
    Ok(Json(json!({ "applications": applications })))
}

/// GET /api/applications/employer/applications (employer only)
pub async fn handle_employer_applications(
    Employer(user): Employer,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let applications = queries::applications_by_employer(&state.db, user.id).await?;
    Ok(Json(json!({ "applications": applications })))
}

/// GET /api/applications/:id (owning candidate or owning employer)
///
/// The first retrieval by the owning employer marks the application viewed;
/// later retrievals leave `viewedAt` untouched.
pub async fn handle_get_application(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let mut row = queries::application_detail(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found.".into()))?;

    if !row.application.is_party(user.id) {
        return Err(AppError::Forbidden(
            "Not authorized to view this application.".into(),
        ));
    }

    if row.application.employer_id == user.id && !row.application.is_viewed {
        queries::mark_as_viewed(&state.db, id).await?;
        row.application.is_viewed = true;
        row.application.viewed_at = Some(chrono::Utc::now());
    }

    Ok(Json(json!({ "application": row })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// PATCH /api/applications/:id/status (employer owning the application)
pub async fn handle_update_status(
    Employer(user): Employer,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let mut v = Validator::new();
    let status: Option<ApplicationStatus> = v.require_one_of("status", req.status.as_deref());
    v.finish()?;
    let status = status.ok_or_else(|| AppError::BadRequest("status is required".into()))?;

    let application = queries::find_application(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found.".into()))?;

    if application.employer_id != user.id {
        return Err(AppError::Forbidden(
            "Not authorized to update this application.".into(),
        ));
    }

    let notes = req.notes.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let application = queries::set_status(&state.db, id, status, notes).await?;

    Ok(Json(json!({
        "message": "Application status updated successfully",
        "application": application
    })))
}

#[derive(Debug, Deserialize)]
pub struct AddNotesRequest {
    pub notes: Option<String>,
}

/// POST /api/applications/:id/notes (either party)
///
/// Writes the caller's own notes slot, never the other party's.
pub async fn handle_add_notes(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddNotesRequest>,
) -> Result<Json<Value>, AppError> {
    let mut v = Validator::new();
    v.require("notes", req.notes.as_deref());
    v.finish()?;

    let application = queries::find_application(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found.".into()))?;

    let slot: UserRole = application.notes_slot_for(user.id).ok_or_else(|| {
        AppError::Forbidden("Not authorized to add notes to this application.".into())
    })?;

    let notes = req.notes.unwrap_or_default();
    let application = queries::set_notes(&state.db, id, slot, notes.trim()).await?;

    Ok(Json(json!({
        "message": "Notes added successfully",
        "application": application
    })))
}

/// DELETE /api/applications/:id (owning candidate only; withdraw)
///
/// The job's applications counter is not decremented.
pub async fn handle_withdraw(
    Candidate(user): Candidate,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let application = queries::find_application(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found.".into()))?;

    if application.candidate_id != user.id {
        return Err(AppError::Forbidden(
            "Not authorized to withdraw this application.".into(),
        ));
    }

    queries::delete_application(&state.db, id).await?;

    tracing::info!("Candidate {} withdrew application {id}", user.id);

    Ok(Json(json!({ "message": "Application withdrawn successfully" })))
}

/// GET /api/applications/employer/stats (employer only)
pub async fn handle_employer_stats(
    Employer(user): Employer,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let stats = queries::status_counts(&state.db, user.id).await?;
    let total_applications = queries::count_for_employer(&state.db, user.id).await?;
    let recent_applications = queries::recent_count_for_employer(&state.db, user.id).await?;

    Ok(Json(json!({
        "stats": stats,
        "totalApplications": total_applications,
        "recentApplications": recent_applications
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_request_parses_camel_case() {
        let req: SubmitApplicationRequest = serde_json::from_value(serde_json::json!({
            "jobId": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "coverLetter": "Hello",
            "expectedSalary": 80000,
            "availability": "2-weeks"
        }))
        .unwrap();
        assert!(req.job_id.is_some());
        assert_eq!(req.expected_salary, Some(80_000));
        assert_eq!(req.availability.as_deref(), Some("2-weeks"));
    }

    #[test]
    fn test_cover_letter_limit_is_2000() {
        let mut v = Validator::new();
        let long = "x".repeat(COVER_LETTER_MAX + 1);
        v.max_len("coverLetter", Some(long.as_str()), COVER_LETTER_MAX);
        assert!(!v.is_empty());
    }

    #[test]
    fn test_status_request_rejects_unknown_status() {
        let mut v = Validator::new();
        let parsed: Option<ApplicationStatus> = v.require_one_of("status", Some("archived"));
        assert!(parsed.is_none());
        assert!(!v.is_empty());
    }
}
