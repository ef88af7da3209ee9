use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

pub const ROLE_ATTENDEE: &str = "Attendee";
pub const ROLE_EVENT_MANAGER: &str = "Event Manager";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: String,
    pub role: String, // "Attendee" or "Event Manager"
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUserData {
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl CreateUserData {
    /// First and last name joined, falling back to the email
    pub fn full_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if name.is_empty() {
            self.email.clone()
        } else {
            name
        }
    }
}

impl User {
    /// Creates a new attendee account
    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        data: CreateUserData,
    ) -> Result<Self, sqlx::Error> {
        let full_name = data.full_name();

        let user = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, full_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&full_name)
        .fetch_one(&mut **tx)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by login email, ignoring case
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM users WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))
            "#,
        )
        .bind(email.trim())
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    pub fn is_event_manager(&self) -> bool {
        self.role == ROLE_EVENT_MANAGER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(first: Option<&str>, last: Option<&str>) -> CreateUserData {
        CreateUserData {
            email: "amina@example.com".to_string(),
            password_hash: String::new(),
            first_name: first.map(String::from),
            last_name: last.map(String::from),
        }
    }

    #[test]
    fn test_full_name() {
        assert_eq!(data(Some("Amina"), Some("Otieno")).full_name(), "Amina Otieno");
        assert_eq!(data(Some("Amina"), None).full_name(), "Amina");
        assert_eq!(data(Some(" "), Some("Otieno")).full_name(), "Otieno");
        assert_eq!(data(None, None).full_name(), "amina@example.com");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: "amina@example.com".to_string(),
            password_hash: "pbkdf2_sha256$100000$salt$hash".to_string(),
            first_name: None,
            last_name: None,
            full_name: "Amina".to_string(),
            role: ROLE_EVENT_MANAGER.to_string(),
            is_enabled: true,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(user.is_event_manager());
    }
}
