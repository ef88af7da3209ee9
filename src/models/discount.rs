use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DiscountCode {
    pub id: Uuid,
    pub event_id: Uuid,
    pub code: String,
    pub amount: i64,
    pub is_active: bool,
}

impl DiscountCode {
    /// Finds an active code for an event, ignoring case
    pub async fn find_active(
        pool: &PgPool,
        event_id: Uuid,
        code: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let discount = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM discount_codes
            WHERE event_id = $1
              AND UPPER(code) = UPPER($2)
              AND is_active = TRUE
            "#,
        )
        .bind(event_id)
        .bind(code.trim())
        .fetch_optional(pool)
        .await?;

        Ok(discount)
    }
}
