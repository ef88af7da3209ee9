use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SponsorTier {
    pub id: Uuid,
    pub event_id: Uuid,
    pub tier_name: String,
    pub amount: i64,
    pub currency: String,
    pub description: Option<String>,
}

impl SponsorTier {
    /// Tiers for an event, cheapest first
    pub async fn list_by_event(pool: &PgPool, event_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tiers = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM sponsor_tiers
            WHERE event_id = $1
            ORDER BY amount ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(pool)
        .await?;

        Ok(tiers)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let tier = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM sponsor_tiers WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(tier)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BoothPackage {
    pub id: Uuid,
    pub event_id: Uuid,
    pub package_name: String,
    pub booth_size: Option<String>,
    pub price: i64,
    pub currency: String,
    pub available_booths: i32,
    pub includes_passes: i32,
    pub includes_power: bool,
    pub includes_internet: bool,
}

impl BoothPackage {
    /// Packages for an event, cheapest first
    pub async fn list_by_event(pool: &PgPool, event_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let packages = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM booth_packages
            WHERE event_id = $1
            ORDER BY price ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(pool)
        .await?;

        Ok(packages)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let package = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM booth_packages WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(package)
    }

    /// Takes one booth. Returns false when none are left.
    pub async fn claim_booth(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE booth_packages
            SET available_booths = available_booths - 1
            WHERE id = $1 AND available_booths > 0
            "#,
        )
        .bind(id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sponsor {
    pub id: Uuid,
    pub event_id: Uuid,
    pub tier_id: Uuid,
    pub sponsor_name: String,
    pub company: Option<String>,
    pub company_logo: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateSponsorData {
    pub event_id: Uuid,
    pub tier_id: Uuid,
    pub sponsor_name: String,
    pub company: Option<String>,
    pub company_logo: Option<String>,
}

impl Sponsor {
    pub async fn create(pool: &PgPool, data: CreateSponsorData) -> Result<Self, sqlx::Error> {
        let sponsor = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO sponsors (event_id, tier_id, sponsor_name, company, company_logo)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.event_id)
        .bind(data.tier_id)
        .bind(&data.sponsor_name)
        .bind(&data.company)
        .bind(&data.company_logo)
        .fetch_one(pool)
        .await?;

        Ok(sponsor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Exhibitor {
    pub id: Uuid,
    pub event_id: Uuid,
    pub booth_package_id: Uuid,
    pub exhibitor_name: String,
    pub email: String,
    pub phone: String,
    pub logo: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
    pub status: String, // "Draft" until reviewed
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateExhibitorData {
    pub event_id: Uuid,
    pub booth_package_id: Uuid,
    pub exhibitor_name: String,
    pub email: String,
    pub phone: String,
    pub logo: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
}

impl Exhibitor {
    /// Records a draft exhibitor request
    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        data: CreateExhibitorData,
    ) -> Result<Self, sqlx::Error> {
        let exhibitor = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO exhibitors (
                event_id, booth_package_id, exhibitor_name, email, phone, logo, website, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(data.event_id)
        .bind(data.booth_package_id)
        .bind(&data.exhibitor_name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.logo)
        .bind(&data.website)
        .bind(&data.notes)
        .fetch_one(&mut **tx)
        .await?;

        Ok(exhibitor)
    }
}
