use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use tower_sessions::Session;
use uuid::Uuid;

use super::session::SESSION_KEY_USER_ID;
use crate::error::AppError;
use crate::models::user::User;

/// Authentication error responses
#[derive(Debug)]
pub enum AuthError {
    Unauthorized,
    SessionError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AuthError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AuthenticationError",
                "Authentication required. Please log in.",
            ),
            AuthError::SessionError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalError",
                "Session error occurred.",
            ),
        };

        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized => AppError::Unauthorized,
            AuthError::SessionError => AppError::Internal(anyhow::anyhow!("Session error")),
        }
    }
}

/// Middleware that requires the user to be authenticated
pub async fn require_auth(
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user_id: Option<Uuid> = session
        .get(SESSION_KEY_USER_ID)
        .await
        .map_err(|_| AuthError::SessionError)?;

    if user_id.is_none() {
        return Err(AuthError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Extension type that holds the authenticated user ID
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Extracts the authenticated user ID from the session
pub async fn get_authenticated_user(session: &Session) -> Result<AuthenticatedUser, AuthError> {
    let user_id: Uuid = session
        .get(SESSION_KEY_USER_ID)
        .await
        .map_err(|_| AuthError::SessionError)?
        .ok_or(AuthError::Unauthorized)?;

    Ok(AuthenticatedUser { user_id })
}

/// Session user, if logged in
pub async fn optional_user_id(session: &Session) -> Result<Option<Uuid>, AuthError> {
    session
        .get(SESSION_KEY_USER_ID)
        .await
        .map_err(|_| AuthError::SessionError)
}

/// Loads the logged-in, enabled user
pub async fn current_user(pool: &PgPool, session: &Session) -> Result<User, AppError> {
    let auth = get_authenticated_user(session).await?;

    match User::find_by_id(pool, auth.user_id).await? {
        Some(user) if user.is_enabled => Ok(user),
        _ => {
            // Stale session for a deleted or disabled account
            let _ = session.flush().await;
            Err(AppError::Unauthorized)
        }
    }
}

/// Loads the logged-in user and requires the Event Manager role
pub async fn require_event_manager(pool: &PgPool, session: &Session) -> Result<User, AppError> {
    let user = current_user(pool, session).await?;

    if !user.is_event_manager() {
        tracing::warn!(user_id = %user.id, "Event Manager role required");
        return Err(AppError::Forbidden(
            "Only Event Managers can perform this action".to_string(),
        ));
    }

    Ok(user)
}
