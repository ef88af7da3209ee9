use axum::extract::FromRef;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tower_sessions::{cookie::Key, Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::Config;
use crate::services::signature;

/// Session keys used in the application
pub const SESSION_KEY_USER_ID: &str = "user_id";

/// Wraps any session store in the application's cookie policy
pub fn session_layer<S: SessionStore + Clone>(
    store: S,
    session_secret: &str,
    secure: bool,
) -> SessionManagerLayer<S, tower_sessions::service::SignedCookie> {
    let key = Key::from(&signature::derive_cookie_key(session_secret));

    SessionManagerLayer::new(store)
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(24)))
        .with_signed(key)
}

/// Creates the PostgreSQL-backed session layer
pub async fn create_session_layer(
    pool: PgPool,
    config: &Config,
) -> Result<SessionManagerLayer<PostgresStore, tower_sessions::service::SignedCookie>, sqlx::Error>
{
    let session_store = PostgresStore::new(pool);
    session_store.migrate().await?;

    Ok(session_layer(
        session_store,
        config.session_secret.expose_secret(),
        config.secure_cookies(),
    ))
}

/// Shared request state
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub ticket_key: [u8; 32],
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let ticket_key = signature::derive_key(config.ticket_signing_key.expose_secret());
        Self {
            pool,
            config,
            ticket_key,
        }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> PgPool {
        state.pool.clone()
    }
}
