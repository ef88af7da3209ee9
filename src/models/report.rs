use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Revenue per event split by source
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RevenueRow {
    pub event_id: Uuid,
    pub event_name: String,
    pub currency: String,
    pub registration_revenue: i64,
    pub sponsor_revenue: i64,
    pub booth_revenue: i64,
    pub total_revenue: i64,
}

impl RevenueRow {
    /// Registration totals, sponsor tier amounts and booth package prices,
    /// optionally for a single event
    pub async fn breakdown(
        pool: &PgPool,
        event_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, Self>(
            r#"
            WITH revenue AS (
                SELECT
                    e.id AS event_id,
                    e.event_name,
                    e.currency,
                    COALESCE((
                        SELECT SUM(r.total_amount) FROM registrations r
                        WHERE r.event_id = e.id AND r.status <> 'Cancelled'
                    ), 0)::BIGINT AS registration_revenue,
                    COALESCE((
                        SELECT SUM(st.amount) FROM sponsors s
                        JOIN sponsor_tiers st ON st.id = s.tier_id
                        WHERE s.event_id = e.id
                    ), 0)::BIGINT AS sponsor_revenue,
                    COALESCE((
                        SELECT SUM(bp.price) FROM exhibitors x
                        JOIN booth_packages bp ON bp.id = x.booth_package_id
                        WHERE x.event_id = e.id
                    ), 0)::BIGINT AS booth_revenue
                FROM events e
                WHERE $1::uuid IS NULL OR e.id = $1
            )
            SELECT
                *,
                registration_revenue + sponsor_revenue + booth_revenue AS total_revenue
            FROM revenue
            ORDER BY event_name ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}
