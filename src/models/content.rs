use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DigitalContent {
    pub id: Uuid,
    pub event_id: Uuid,
    pub session_id: Option<Uuid>,
    pub title: String,
    pub content_type: String,
    pub thumbnail: Option<String>,
    pub access_level: Option<String>,
    pub description: Option<String>,
    pub file: Option<String>,
    pub publish_date: Option<NaiveDate>,
}

impl DigitalContent {
    /// Content for an event, latest publications first
    pub async fn list_by_event(pool: &PgPool, event_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let items = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM digital_content
            WHERE event_id = $1
            ORDER BY publish_date DESC NULLS LAST, title ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(pool)
        .await?;

        Ok(items)
    }
}
