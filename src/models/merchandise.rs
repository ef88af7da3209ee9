use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Merchandise {
    pub id: Uuid,
    pub event_id: Uuid,
    pub item_name: String,
    pub description: Option<String>,
    pub price: i64,
    pub currency: String,
    pub item_image: Option<String>,
    pub stock_quantity: i32,
}

impl Merchandise {
    /// Lists merchandise for an event by name
    pub async fn list_by_event(pool: &PgPool, event_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let items = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM merchandise
            WHERE event_id = $1
            ORDER BY item_name ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(pool)
        .await?;

        Ok(items)
    }

    /// Takes `quantity` units out of stock. Returns false if not enough are left.
    pub async fn reserve_stock(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        quantity: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE merchandise
            SET stock_quantity = stock_quantity - $2
            WHERE id = $1 AND stock_quantity >= $2
            "#,
        )
        .bind(id)
        .bind(quantity)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
