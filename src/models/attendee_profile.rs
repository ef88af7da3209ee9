use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendeeProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Option<Uuid>,
    pub full_name: Option<String>,
    pub profile_image: Option<String>,
    pub role: String,
    pub open_to_networking: bool,
    pub social_link: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Profile with its interests attached, as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct ProfileWithInterests {
    #[serde(flatten)]
    pub profile: AttendeeProfile,
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateProfileData {
    pub user_id: Uuid,
    pub event_id: Option<Uuid>,
    pub full_name: Option<String>,
    pub open_to_networking: bool,
    pub social_link: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub bio: Option<String>,
    pub interests: Vec<String>,
}

/// Trims, drops blanks and duplicates (case-insensitive), keeping first spelling
pub fn normalize_interests(interests: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    interests
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .filter(|i| seen.insert(i.to_lowercase()))
        .map(String::from)
        .collect()
}

impl AttendeeProfile {
    /// Creates a profile and its interests
    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        data: CreateProfileData,
    ) -> Result<Self, sqlx::Error> {
        let profile = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO attendee_profiles (
                user_id, event_id, full_name, open_to_networking,
                social_link, company, job_title, bio
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(data.event_id)
        .bind(&data.full_name)
        .bind(data.open_to_networking)
        .bind(&data.social_link)
        .bind(&data.company)
        .bind(&data.job_title)
        .bind(&data.bio)
        .fetch_one(&mut **tx)
        .await?;

        for interest in normalize_interests(&data.interests) {
            sqlx::query(
                r#"
                INSERT INTO profile_interests (profile_id, interest)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(profile.id)
            .bind(interest)
            .execute(&mut **tx)
            .await?;
        }

        Ok(profile)
    }

    /// The user's most recent profile
    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let profile = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM attendee_profiles
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    /// All profiles of a user, oldest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let profiles = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM attendee_profiles
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(profiles)
    }

    pub async fn list_interests(pool: &PgPool, profile_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
        let interests = sqlx::query_scalar::<_, String>(
            r#"
            SELECT interest FROM profile_interests
            WHERE profile_id = $1
            ORDER BY interest ASC
            "#,
        )
        .bind(profile_id)
        .fetch_all(pool)
        .await?;

        Ok(interests)
    }

    /// Profiles open to networking whose user holds a valid ticket for the event,
    /// or whose profile is tied to it directly
    pub async fn list_open_for_event(
        pool: &PgPool,
        event_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let profiles = sqlx::query_as::<_, Self>(
            r#"
            SELECT DISTINCT p.* FROM attendee_profiles p
            JOIN users u ON u.id = p.user_id
            WHERE p.open_to_networking = TRUE
              AND (
                p.event_id = $1
                OR EXISTS (
                    SELECT 1 FROM tickets t
                    WHERE t.event_id = $1 AND LOWER(t.email) = LOWER(u.email) AND t.status = 'Valid'
                )
              )
            ORDER BY p.id ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(pool)
        .await?;

        Ok(profiles)
    }

    pub async fn with_interests(self, pool: &PgPool) -> Result<ProfileWithInterests, sqlx::Error> {
        let interests = Self::list_interests(pool, self.id).await?;
        Ok(ProfileWithInterests {
            profile: self,
            interests,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_interests() {
        let raw = vec![
            " Rust ".to_string(),
            "rust".to_string(),
            "".to_string(),
            "Fintech".to_string(),
        ];
        assert_eq!(normalize_interests(&raw), vec!["Rust", "Fintech"]);
    }
}
