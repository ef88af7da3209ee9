use axum::{extract::State, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::middleware::{
    auth::optional_user_id,
    session::{AppState, SESSION_KEY_USER_ID},
};
use crate::api::params::{non_blank, optional_url, JsonList};
use crate::api::response::{ok, Envelope};
use crate::error::{AppError, Result};
use crate::models::{
    attendee_profile::{AttendeeProfile, CreateProfileData, ProfileWithInterests},
    user::{CreateUserData, User},
};
use crate::services::{booking::is_plausible_email, password};

#[derive(Deserialize)]
struct RegisterRequest {
    email: String,
    password: String,
    first_name: Option<String>,
    last_name: Option<String>,
    full_name: Option<String>,
    event_id: Option<Uuid>,
    #[serde(default)]
    open_to_networking: bool,
    social_link: Option<String>,
    company: Option<String>,
    job_title: Option<String>,
    bio: Option<String>,
    #[serde(default)]
    interests: JsonList<String>,
}

#[derive(Serialize)]
struct RegisterResponse {
    user_id: Uuid,
    email: String,
    attendee_profile_id: Uuid,
}

/// Creates an attendee account with its profile and interests
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Envelope<RegisterResponse>> {
    let email = req.email.trim().to_lowercase();
    if !is_plausible_email(&email) {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }

    if User::email_exists(&state.pool, &email).await? {
        return Err(AppError::Validation("User already exists".to_string()));
    }

    let interests = req.interests.into_vec("interests")?;
    let social_link = optional_url(req.social_link, "social_link")?;
    let password_hash = password::hash_password(&req.password)?;

    let mut tx = state.pool.begin().await?;

    let user = User::create(
        &mut tx,
        CreateUserData {
            email,
            password_hash,
            first_name: non_blank(req.first_name).or_else(|| non_blank(req.full_name.clone())),
            last_name: non_blank(req.last_name),
        },
    )
    .await?;

    let profile = AttendeeProfile::create(
        &mut tx,
        CreateProfileData {
            user_id: user.id,
            event_id: req.event_id,
            full_name: non_blank(req.full_name).or_else(|| Some(user.full_name.clone())),
            open_to_networking: req.open_to_networking,
            social_link,
            company: non_blank(req.company),
            job_title: non_blank(req.job_title),
            bio: non_blank(req.bio),
            interests,
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(user_id = %user.id, profile_id = %profile.id, "User registered");

    ok(RegisterResponse {
        user_id: user.id,
        email: user.email,
        attendee_profile_id: profile.id,
    })
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    user_id: Uuid,
    email: String,
    full_name: String,
    role: String,
}

async fn api_login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Envelope<LoginResponse>> {
    let invalid = || AppError::Validation("Invalid email or password".to_string());

    let user = User::find_by_email(&state.pool, &req.email)
        .await?
        .ok_or_else(invalid)?;

    if !user.is_enabled || !password::verify_password(&req.password, &user.password_hash) {
        tracing::info!(user_id = %user.id, "Login rejected");
        return Err(invalid());
    }

    // New session id on privilege change
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Session error: {}", e)))?;
    session
        .insert(SESSION_KEY_USER_ID, user.id)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Session error: {}", e)))?;

    tracing::info!(user_id = %user.id, "User logged in");

    ok(LoginResponse {
        user_id: user.id,
        email: user.email,
        full_name: user.full_name,
        role: user.role,
    })
}

async fn api_logout(session: Session) -> Result<Envelope<&'static str>> {
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Session error: {}", e)))?;

    ok("Logged out successfully")
}

#[derive(Serialize)]
struct CurrentUser {
    user_id: Option<Uuid>,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    full_name: Option<String>,
    role: Option<String>,
    is_logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    profiles: Option<Vec<ProfileWithInterests>>,
}

impl CurrentUser {
    fn guest() -> Self {
        Self {
            user_id: None,
            email: None,
            first_name: None,
            last_name: None,
            full_name: None,
            role: None,
            is_logged_in: false,
            profiles: None,
        }
    }

    fn from_user(user: User) -> Self {
        Self {
            user_id: Some(user.id),
            email: Some(user.email),
            first_name: user.first_name,
            last_name: user.last_name,
            full_name: Some(user.full_name),
            role: Some(user.role),
            is_logged_in: true,
            profiles: None,
        }
    }
}

async fn session_user(state: &AppState, session: &Session) -> Result<Option<User>> {
    let Some(user_id) = optional_user_id(session).await? else {
        return Ok(None);
    };

    Ok(User::find_by_id(&state.pool, user_id)
        .await?
        .filter(|u| u.is_enabled))
}

/// Logged-in user, or a guest marker
async fn get_current_user(
    State(state): State<AppState>,
    session: Session,
) -> Result<Envelope<CurrentUser>> {
    match session_user(&state, &session).await? {
        Some(user) => ok(CurrentUser::from_user(user)),
        None => ok(CurrentUser::guest()),
    }
}

/// Logged-in user with all attendee profiles and their interests
async fn get_current_attendee(
    State(state): State<AppState>,
    session: Session,
) -> Result<Envelope<CurrentUser>> {
    let Some(user) = session_user(&state, &session).await? else {
        return ok(CurrentUser::guest());
    };

    let mut profiles = Vec::new();
    for profile in AttendeeProfile::list_by_user(&state.pool, user.id).await? {
        profiles.push(profile.with_interests(&state.pool).await?);
    }

    let mut current = CurrentUser::from_user(user);
    current.profiles = Some(profiles);
    ok(current)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth.register", post(register))
        .route("/api/auth.api_login", post(api_login))
        .route("/api/auth.api_logout", post(api_logout))
        .route("/api/auth.get_current_user", get(get_current_user))
        .route("/api/auth.get_current_attendee", get(get_current_attendee))
}
