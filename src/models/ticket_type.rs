use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TicketType {
    pub id: Uuid,
    pub event_id: Uuid,
    pub ticket_category: String,
    pub ticket_category_name: String,
    pub ticket_price: i64,
    pub access_level: Option<String>,
    pub sales_start: Option<DateTime<Utc>>,
    pub sales_end: Option<DateTime<Utc>>,
}

impl TicketType {
    /// Lists ticket types for an event, cheapest first
    pub async fn list_by_event(pool: &PgPool, event_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let ticket_types = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM ticket_types
            WHERE event_id = $1
            ORDER BY ticket_price ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(pool)
        .await?;

        Ok(ticket_types)
    }

    /// Whether tickets of this type can be sold at `now`. Open-ended windows
    /// are unrestricted on that side.
    pub fn is_on_sale(&self, now: DateTime<Utc>) -> bool {
        let started = self.sales_start.map_or(true, |start| start <= now);
        let not_ended = self.sales_end.map_or(true, |end| now <= end);
        started && not_ended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ticket_type(
        sales_start: Option<DateTime<Utc>>,
        sales_end: Option<DateTime<Utc>>,
    ) -> TicketType {
        TicketType {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            ticket_category: "VIP".to_string(),
            ticket_category_name: "VIP Pass".to_string(),
            ticket_price: 2500,
            access_level: Some("All Access".to_string()),
            sales_start,
            sales_end,
        }
    }

    #[test]
    fn test_sales_window() {
        let now = Utc::now();
        let hour = Duration::hours(1);

        assert!(ticket_type(None, None).is_on_sale(now));
        assert!(ticket_type(Some(now - hour), Some(now + hour)).is_on_sale(now));
        assert!(!ticket_type(Some(now + hour), None).is_on_sale(now));
        assert!(!ticket_type(None, Some(now - hour)).is_on_sale(now));
    }
}
