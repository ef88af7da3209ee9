use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventFeedback {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackSummary {
    pub entries: Vec<EventFeedback>,
    pub count: usize,
    pub average_rating: Option<f64>,
}

impl FeedbackSummary {
    pub fn from_entries(entries: Vec<EventFeedback>) -> Self {
        let count = entries.len();
        let average_rating = if count == 0 {
            None
        } else {
            let sum: i64 = entries.iter().map(|f| f.rating as i64).sum();
            Some(sum as f64 / count as f64)
        };

        Self {
            entries,
            count,
            average_rating,
        }
    }
}

pub fn is_valid_rating(rating: i32) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

impl EventFeedback {
    pub async fn create(
        pool: &PgPool,
        event_id: Uuid,
        user_id: Uuid,
        rating: i32,
        feedback: Option<String>,
    ) -> Result<Self, sqlx::Error> {
        let entry = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO event_feedback (event_id, user_id, rating, feedback)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(rating)
        .bind(feedback)
        .fetch_one(pool)
        .await?;

        Ok(entry)
    }

    /// Feedback for an event, newest first
    pub async fn list_by_event(pool: &PgPool, event_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let entries = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM event_feedback
            WHERE event_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(event_id)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rating: i32) -> EventFeedback {
        EventFeedback {
            id: Uuid::new_v4(),
            event_id: Uuid::nil(),
            user_id: Uuid::nil(),
            rating,
            feedback: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_rating_bounds() {
        assert!(!is_valid_rating(0));
        assert!(is_valid_rating(1));
        assert!(is_valid_rating(5));
        assert!(!is_valid_rating(6));
    }

    #[test]
    fn test_summary_average() {
        let summary = FeedbackSummary::from_entries(vec![entry(5), entry(4), entry(2)]);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.average_rating, Some(11.0 / 3.0));

        assert_eq!(FeedbackSummary::from_entries(vec![]).average_rating, None);
    }
}
