use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};

use crate::auth::jwt::decode_token;
use crate::errors::AppError;
use crate::models::user::{User, UserRole};
use crate::state::AppState;

/// The authenticated user behind a bearer token. Resolving the extractor
/// decodes the token and loads the user row; any failure rejects the request
/// with a 401 before handler logic runs.
pub struct AuthUser(pub User);

/// Role gate: the authenticated user must be an employer, else 403.
pub struct Employer(pub User);

/// Role gate: the authenticated user must be a candidate, else 403.
pub struct Candidate(pub User);

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("No token provided.".into()))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = decode_token(&state.config.jwt_secret, token)?;

        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(claims.sub)
            .fetch_optional(&state.db)
            .await?;

        match user {
            Some(user) if user.is_active => Ok(AuthUser(user)),
            _ => Err(AppError::Unauthorized("Invalid token.".into())),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Employer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::Employer {
            return Err(AppError::Forbidden(
                "Access denied. Employer role required.".into(),
            ));
        }
        Ok(Employer(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Candidate {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::Candidate {
            return Err(AppError::Forbidden(
                "Access denied. Candidate role required.".into(),
            ));
        }
        Ok(Candidate(user))
    }
}
