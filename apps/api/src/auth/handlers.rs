use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::extract::AuthUser;
use crate::auth::jwt::issue_token;
use crate::errors::AppError;
use crate::models::user::{User, UserRole};
use crate::state::AppState;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut v = Validator::new();
    v.require("email", req.email.as_deref());
    v.require("password", req.password.as_deref());
    v.min_len("password", req.password.as_deref(), 6);
    let role: Option<UserRole> = v.require_one_of("role", req.role.as_deref());
    v.require("firstName", req.first_name.as_deref());
    v.require("lastName", req.last_name.as_deref());
    v.finish()?;

    // The checks above guarantee these are present.
    let email = req.email.unwrap_or_default().trim().to_lowercase();
    let password = req.password.unwrap_or_default();
    let role = role.ok_or_else(|| AppError::BadRequest("role is required".into()))?;
    let first_name = req.first_name.unwrap_or_default().trim().to_string();
    let last_name = req.last_name.unwrap_or_default().trim().to_string();

    let existing: Option<(uuid::Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest(
            "User already exists with this email.".into(),
        ));
    }

    let password_hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {e}")))?;

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (email, password_hash, role, first_name, last_name, company)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(role)
    .bind(&first_name)
    .bind(&last_name)
    .bind(req.company.as_deref().map(str::trim))
    .fetch_one(&state.db)
    .await?;

    tracing::info!("Registered {:?} account {}", user.role, user.id);

    let token = issue_token(&state.config.jwt_secret, user.id, user.role)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "token": token,
            "user": user
        })),
    ))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let mut v = Validator::new();
    v.require("email", req.email.as_deref());
    v.require("password", req.password.as_deref());
    v.finish()?;

    let email = req.email.unwrap_or_default().trim().to_lowercase();
    let password = req.password.unwrap_or_default();

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;

    let user = user.ok_or_else(|| AppError::BadRequest("Invalid credentials.".into()))?;

    let matches = bcrypt::verify(&password, &user.password_hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to verify password: {e}")))?;
    if !matches {
        return Err(AppError::BadRequest("Invalid credentials.".into()));
    }

    if !user.is_active {
        return Err(AppError::BadRequest("Account is deactivated.".into()));
    }

    let token = issue_token(&state.config.jwt_secret, user.id, user.role)?;
    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "user": user
    })))
}

/// GET /api/auth/me
pub async fn handle_me(AuthUser(user): AuthUser) -> Json<Value> {
    Json(json!({ "user": user }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bcrypt_verify_round_trip() {
        // Cost 4 keeps the test fast; the handler uses DEFAULT_COST.
        let hash = bcrypt::hash("hunter42", 4).unwrap();
        assert!(bcrypt::verify("hunter42", &hash).unwrap());
        assert!(!bcrypt::verify("hunter43", &hash).unwrap());
    }

    #[test]
    fn test_register_request_accepts_camel_case() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "email": "A@B.com",
            "password": "secret1",
            "role": "candidate",
            "firstName": "Ada",
            "lastName": "Lovelace"
        }))
        .unwrap();
        assert_eq!(req.first_name.as_deref(), Some("Ada"));
        assert_eq!(req.role.as_deref(), Some("candidate"));
    }

    #[test]
    fn test_register_request_ignores_unknown_fields() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "email": "a@b.com",
            "password": "secret1",
            "role": "employer",
            "firstName": "A",
            "lastName": "B",
            "isVerified": true
        }))
        .unwrap();
        assert_eq!(req.email.as_deref(), Some("a@b.com"));
    }
}
