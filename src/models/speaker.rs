use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Speaker {
    pub id: Uuid,
    pub full_name: String,
    pub bio: Option<String>,
    pub photo: Option<String>,
    pub role: Option<String>,
    pub company: Option<String>,
    pub event_id: Option<Uuid>,
    pub sessions: Vec<Uuid>,
}

impl Speaker {
    /// All speakers by name, with the sessions they present
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let speakers = sqlx::query_as::<_, Self>(
            r#"
            SELECT
                sp.id, sp.full_name, sp.bio, sp.photo, sp.role, sp.company, sp.event_id,
                ARRAY(
                    SELECT ss.session_id FROM speaker_sessions ss
                    WHERE ss.speaker_id = sp.id
                ) AS sessions
            FROM speakers sp
            ORDER BY sp.full_name ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(speakers)
    }
}
