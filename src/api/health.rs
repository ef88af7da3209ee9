use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Instant;

use crate::api::middleware::session::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub version: &'static str,
    pub checked_at: String,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub reachable: bool,
    pub latency_ms: u128,
    pub pool_size: u32,
    pub idle_connections: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness check: 200 while the database answers, 503 otherwise
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let database = check_database(&state.pool).await;

    if let Some(error) = &database.error {
        tracing::warn!(error = %error, "Health check failed");
    }

    let report = HealthReport {
        healthy: database.reachable,
        version: env!("CARGO_PKG_VERSION"),
        checked_at: chrono::Utc::now().to_rfc3339(),
        database,
    };

    let status = if report.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(report))
}

async fn check_database(pool: &PgPool) -> DatabaseHealth {
    let start = Instant::now();
    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;

    DatabaseHealth {
        reachable: result.is_ok(),
        latency_ms: start.elapsed().as_millis(),
        pool_size: pool.size(),
        idle_connections: pool.num_idle(),
        error: result.err().map(|e| e.to_string()),
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
