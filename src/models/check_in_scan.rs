use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CheckInScan {
    pub id: Uuid,
    pub event_id: Uuid,
    pub ticket_id: Option<Uuid>, // nullable: unreadable codes have no ticket
    pub scan_result: String, // "success", "invalid_signature", "ticket_not_found", ...
    pub raw_payload: Option<String>, // Scanned QR text for debugging
    pub scanned_by: Option<Uuid>,
    pub scanned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCheckInScanData {
    pub event_id: Uuid,
    pub ticket_id: Option<Uuid>,
    pub scan_result: String,
    pub raw_payload: Option<String>,
    pub scanned_by: Option<Uuid>,
}

impl CheckInScan {
    /// Record a scan attempt
    pub async fn create(pool: &PgPool, data: CreateCheckInScanData) -> Result<Self, sqlx::Error> {
        let scan = sqlx::query_as::<_, CheckInScan>(
            r#"
            INSERT INTO check_in_scans (event_id, ticket_id, scan_result, raw_payload, scanned_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.event_id)
        .bind(data.ticket_id)
        .bind(data.scan_result)
        .bind(data.raw_payload)
        .bind(data.scanned_by)
        .fetch_one(pool)
        .await?;

        Ok(scan)
    }

    /// List scans for a specific event
    pub async fn list_by_event(
        pool: &PgPool,
        event_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let scans = sqlx::query_as::<_, CheckInScan>(
            r#"
            SELECT * FROM check_in_scans
            WHERE event_id = $1
            ORDER BY scanned_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(event_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(scans)
    }

    /// Count scans by event and result
    pub async fn count_by_event_and_result(
        pool: &PgPool,
        event_id: Uuid,
        result: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let count = if let Some(result) = result {
            sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*) FROM check_in_scans
                WHERE event_id = $1 AND scan_result = $2
                "#,
            )
            .bind(event_id)
            .bind(result)
            .fetch_one(pool)
            .await?
        } else {
            sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*) FROM check_in_scans
                WHERE event_id = $1
                "#,
            )
            .bind(event_id)
            .fetch_one(pool)
            .await?
        };

        Ok(count)
    }

    /// Count distinct tickets scanned at an event
    pub async fn count_unique_tickets_by_event(
        pool: &PgPool,
        event_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT ticket_id)
            FROM check_in_scans
            WHERE event_id = $1 AND ticket_id IS NOT NULL
            "#,
        )
        .bind(event_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}
