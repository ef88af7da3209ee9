use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Suggested,
    Connected,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Suggested => "Suggested",
            MatchStatus::Connected => "Connected",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchSuggestion {
    pub id: Uuid,
    pub event_id: Uuid,
    pub attendee_1: Uuid, // always the smaller profile id
    pub attendee_2: Uuid,
    pub match_score: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A match seen from one side: the other attendee's profile and the score
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchView {
    pub match_id: Uuid,
    pub event_id: Uuid,
    pub match_score: i32,
    pub status: String,
    pub updated_at: DateTime<Utc>,
    pub profile_id: Uuid,
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub social_link: Option<String>,
    pub interests: Vec<String>,
}

/// Orders a pair so the same two profiles always map to one row
pub fn ordered_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl MatchSuggestion {
    /// Stores a suggestion unless the pair already has one for the event.
    /// Returns true if a row was inserted.
    pub async fn insert_if_absent(
        pool: &PgPool,
        event_id: Uuid,
        a: Uuid,
        b: Uuid,
        score: i32,
    ) -> Result<bool, sqlx::Error> {
        let (attendee_1, attendee_2) = ordered_pair(a, b);

        let result = sqlx::query(
            r#"
            INSERT INTO match_suggestions (event_id, attendee_1, attendee_2, match_score)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (event_id, attendee_1, attendee_2) DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(attendee_1)
        .bind(attendee_2)
        .bind(score)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let suggestion = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM match_suggestions WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(suggestion)
    }

    /// Lists matches of a profile in the given status where the other side is
    /// still open to networking. Suggested matches come best-first, connected
    /// ones most recent first.
    pub async fn list_for_profile(
        pool: &PgPool,
        profile_id: Uuid,
        status: MatchStatus,
        event_id: Option<Uuid>,
    ) -> Result<Vec<MatchView>, sqlx::Error> {
        let order = match status {
            MatchStatus::Suggested => "m.match_score DESC, m.created_at ASC",
            MatchStatus::Connected => "m.updated_at DESC",
        };

        let query = format!(
            r#"
            SELECT
                m.id AS match_id, m.event_id, m.match_score, m.status, m.updated_at,
                p.id AS profile_id, p.user_id, p.full_name, p.company, p.job_title,
                p.bio, p.profile_image, p.social_link,
                ARRAY(
                    SELECT i.interest FROM profile_interests i
                    WHERE i.profile_id = p.id ORDER BY i.interest
                ) AS interests
            FROM match_suggestions m
            JOIN attendee_profiles p
              ON p.id = CASE WHEN m.attendee_1 = $1 THEN m.attendee_2 ELSE m.attendee_1 END
            WHERE (m.attendee_1 = $1 OR m.attendee_2 = $1)
              AND m.status = $2
              AND p.open_to_networking = TRUE
              AND ($3::uuid IS NULL OR m.event_id = $3)
            ORDER BY {}
            "#,
            order
        );

        let matches = sqlx::query_as::<_, MatchView>(&query)
            .bind(profile_id)
            .bind(status.as_str())
            .bind(event_id)
            .fetch_all(pool)
            .await?;

        Ok(matches)
    }

    /// Moves a suggestion to Connected
    pub async fn mark_connected(pool: &PgPool, id: Uuid) -> Result<Self, sqlx::Error> {
        let suggestion = sqlx::query_as::<_, Self>(
            r#"
            UPDATE match_suggestions
            SET status = 'Connected', updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(suggestion)
    }

    pub fn involves(&self, profile_id: Uuid) -> bool {
        self.attendee_1 == profile_id || self.attendee_2 == profile_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_pair_is_symmetric() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(ordered_pair(a, b), ordered_pair(b, a));
        let (first, second) = ordered_pair(a, b);
        assert!(first <= second);
    }
}
