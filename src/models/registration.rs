use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub email: String,
    pub user_id: Option<Uuid>,
    pub discount_code: Option<String>,
    pub discount_amount: i64,
    pub total_amount: i64,
    pub status: String,         // "Pending", "Confirmed" or "Cancelled"
    pub payment_status: String, // "Unpaid" or "Paid"
    pub confirmation_code: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateRegistrationData {
    pub event_id: Uuid,
    pub email: String,
    pub user_id: Option<Uuid>,
    pub discount_code: Option<String>,
    pub discount_amount: i64,
    pub total_amount: i64,
    pub confirmation_code: String,
}

impl Registration {
    /// Inserts a pending, unpaid registration
    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        data: CreateRegistrationData,
    ) -> Result<Self, sqlx::Error> {
        let registration = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO registrations (
                event_id, email, user_id, discount_code,
                discount_amount, total_amount, confirmation_code
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(data.event_id)
        .bind(&data.email)
        .bind(data.user_id)
        .bind(&data.discount_code)
        .bind(data.discount_amount)
        .bind(data.total_amount)
        .bind(&data.confirmation_code)
        .fetch_one(&mut **tx)
        .await?;

        Ok(registration)
    }

    /// Latest registration made with this email for an event
    pub async fn find_by_email_and_event(
        pool: &PgPool,
        email: &str,
        event_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let registration = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM registrations
            WHERE LOWER(email) = LOWER($1) AND event_id = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(event_id)
        .fetch_optional(pool)
        .await?;

        Ok(registration)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegistrationAttendee {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub position: i32,
    pub full_name: String,
    pub email: String,
    pub ticket_type_id: Uuid,
    pub ticket_price: i64,
    pub merchandise_total: i64,
    pub discount_amount: i64,
    pub total_amount: i64,
}

#[derive(Debug, Clone)]
pub struct CreateAttendeeData {
    pub registration_id: Uuid,
    pub position: i32,
    pub full_name: String,
    pub email: String,
    pub ticket_type_id: Uuid,
    pub ticket_price: i64,
    pub merchandise_total: i64,
    pub discount_amount: i64,
    pub total_amount: i64,
}

impl RegistrationAttendee {
    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        data: CreateAttendeeData,
    ) -> Result<Self, sqlx::Error> {
        let attendee = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO registration_attendees (
                registration_id, position, full_name, email, ticket_type_id,
                ticket_price, merchandise_total, discount_amount, total_amount
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(data.registration_id)
        .bind(data.position)
        .bind(&data.full_name)
        .bind(&data.email)
        .bind(data.ticket_type_id)
        .bind(data.ticket_price)
        .bind(data.merchandise_total)
        .bind(data.discount_amount)
        .bind(data.total_amount)
        .fetch_one(&mut **tx)
        .await?;

        Ok(attendee)
    }

    /// Lists the attendees of a registration in booking order
    pub async fn list_by_registration(
        pool: &PgPool,
        registration_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let attendees = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM registration_attendees
            WHERE registration_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(registration_id)
        .fetch_all(pool)
        .await?;

        Ok(attendees)
    }
}

/// One merchandise line on an attendee, priced at booking time
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendeeMerchandise {
    pub attendee_id: Uuid,
    pub merchandise_id: Uuid,
    pub item_name: String,
    pub quantity: i32,
    pub price: i64,
}

impl AttendeeMerchandise {
    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        attendee_id: Uuid,
        merchandise_id: Uuid,
        quantity: i32,
        price: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO attendee_merchandise (attendee_id, merchandise_id, quantity, price)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(attendee_id)
        .bind(merchandise_id)
        .bind(quantity)
        .bind(price)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Lists merchandise lines for a set of attendees
    pub async fn list_by_attendees(
        pool: &PgPool,
        attendee_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        let items = sqlx::query_as::<_, Self>(
            r#"
            SELECT am.attendee_id, am.merchandise_id, m.item_name, am.quantity, am.price
            FROM attendee_merchandise am
            JOIN merchandise m ON m.id = am.merchandise_id
            WHERE am.attendee_id = ANY($1)
            ORDER BY m.item_name ASC
            "#,
        )
        .bind(attendee_ids)
        .fetch_all(pool)
        .await?;

        Ok(items)
    }
}
