use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NetworkingMessage {
    pub id: Uuid,
    pub event_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub sender_name: String,
    pub receiver_name: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateMessageData {
    pub event_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub sender_name: String,
    pub receiver_name: String,
    pub message: String,
}

impl NetworkingMessage {
    pub async fn create(pool: &PgPool, data: CreateMessageData) -> Result<Self, sqlx::Error> {
        let message = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO networking_messages (
                event_id, sender_id, receiver_id, sender_name, receiver_name, message
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(data.event_id)
        .bind(data.sender_id)
        .bind(data.receiver_id)
        .bind(&data.sender_name)
        .bind(&data.receiver_name)
        .bind(&data.message)
        .fetch_one(pool)
        .await?;

        Ok(message)
    }

    /// Messages exchanged between two users for an event, oldest first
    pub async fn list_conversation(
        pool: &PgPool,
        event_id: Uuid,
        user_id: Uuid,
        other_user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let messages = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM networking_messages
            WHERE event_id = $1
              AND (
                (sender_id = $2 AND receiver_id = $3)
                OR (sender_id = $3 AND receiver_id = $2)
              )
            ORDER BY created_at ASC
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(other_user_id)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }

    /// Marks a message read if `receiver_id` is its receiver
    pub async fn mark_read(
        pool: &PgPool,
        id: Uuid,
        receiver_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let message = sqlx::query_as::<_, Self>(
            r#"
            UPDATE networking_messages
            SET is_read = TRUE
            WHERE id = $1 AND receiver_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(receiver_id)
        .fetch_optional(pool)
        .await?;

        Ok(message)
    }
}
