use crate::error::AppError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use safari_booking_shared::{AccommodationTier, TourSummaryResponse};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Catalog entity (read-only collaborator): a tour package identified by
/// slug. Booking logic only needs its identity, per-tier base prices and
/// the active flag.
#[derive(Debug, Clone, FromRow)]
pub struct TourPackage {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub duration_days: i32,
    pub duration_nights: i32,
    pub min_participants: i32,
    pub max_participants: Option<i32>,
    pub price_budget: Decimal,
    pub price_standard: Decimal,
    pub price_luxury: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TourPackage {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, AppError> {
        let tour = sqlx::query_as::<_, Self>("SELECT * FROM tour_packages WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(tour)
    }

    /// Find an active tour package by slug.
    pub async fn find_active_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, AppError> {
        let tour = sqlx::query_as::<_, Self>(
            "SELECT * FROM tour_packages WHERE slug = $1 AND is_active",
        )
        .bind(slug)
        .fetch_optional(pool)
        .await?;

        Ok(tour)
    }

    pub async fn list_active(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, AppError> {
        let tours = sqlx::query_as::<_, Self>(
            "SELECT * FROM tour_packages WHERE is_active ORDER BY title LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(tours)
    }

    pub async fn count_active(pool: &PgPool) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tour_packages WHERE is_active")
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Per-participant base price for an accommodation tier.
    pub fn tier_price(&self, tier: AccommodationTier) -> Decimal {
        match tier {
            AccommodationTier::Budget => self.price_budget,
            AccommodationTier::Standard => self.price_standard,
            AccommodationTier::Luxury => self.price_luxury,
        }
    }

    pub fn to_summary(&self) -> TourSummaryResponse {
        TourSummaryResponse {
            id: self.id,
            slug: self.slug.clone(),
            title: self.title.clone(),
            duration_days: self.duration_days,
            duration_nights: self.duration_nights,
            price_standard: self.price_standard,
        }
    }
}
