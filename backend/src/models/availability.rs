use crate::error::AppError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use safari_booking_shared::{
    AccommodationTier, AvailabilityResponse, Capacity, SpotsRemaining,
};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// A bookable date window for one tour package, carrying the capacity
/// ledger. `max_participants = NULL` means capacity on request.
/// `booked_participants` is mutated only through the availability ledger
/// operations in `services::availability`.
#[derive(Debug, Clone, FromRow)]
pub struct TourAvailability {
    pub id: Uuid,
    pub tour_package_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub max_participants: Option<i32>,
    pub booked_participants: i32,
    pub price_modifier_budget: Decimal,
    pub price_modifier_standard: Decimal,
    pub price_modifier_luxury: Decimal,
    pub accepting_bookings: bool,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TourAvailability {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, AppError> {
        let window = sqlx::query_as::<_, Self>("SELECT * FROM tour_availability WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(window)
    }

    /// All open windows for a tour, soonest first.
    pub async fn find_open_for_tour(
        pool: &PgPool,
        tour_package_id: Uuid,
    ) -> Result<Vec<Self>, AppError> {
        let windows = sqlx::query_as::<_, Self>(
            "SELECT * FROM tour_availability
             WHERE tour_package_id = $1 AND accepting_bookings
             ORDER BY start_date",
        )
        .bind(tour_package_id)
        .fetch_all(pool)
        .await?;

        Ok(windows)
    }

    /// The earliest open window for a tour, used by quick booking when the
    /// caller does not pick one.
    pub async fn first_open_for_tour(
        pool: &PgPool,
        tour_package_id: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let window = sqlx::query_as::<_, Self>(
            "SELECT * FROM tour_availability
             WHERE tour_package_id = $1 AND accepting_bookings
             ORDER BY start_date
             LIMIT 1",
        )
        .bind(tour_package_id)
        .fetch_one(pool)
        .await
        .map(Some)
        .or_else(|e| match e {
            sqlx::Error::RowNotFound => Ok(None),
            other => Err(AppError::from(other)),
        })?;

        Ok(window)
    }

    /// Re-read a window inside a transaction, taking the row lock.
    pub async fn find_by_id_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let window =
            sqlx::query_as::<_, Self>("SELECT * FROM tour_availability WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;

        Ok(window)
    }

    pub fn capacity(&self) -> Capacity {
        Capacity::from_column(self.max_participants)
    }

    pub fn remaining(&self) -> SpotsRemaining {
        self.capacity().remaining(self.booked_participants)
    }

    /// Seasonal price modifier for an accommodation tier.
    pub fn modifier_for(&self, tier: AccommodationTier) -> Decimal {
        match tier {
            AccommodationTier::Budget => self.price_modifier_budget,
            AccommodationTier::Standard => self.price_modifier_standard,
            AccommodationTier::Luxury => self.price_modifier_luxury,
        }
    }

    pub fn to_response(&self) -> AvailabilityResponse {
        AvailabilityResponse {
            id: self.id,
            start_date: self.start_date,
            end_date: self.end_date,
            remaining: self.remaining(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(max: Option<i32>, booked: i32) -> TourAvailability {
        TourAvailability {
            id: Uuid::new_v4(),
            tour_package_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 7, 8).unwrap(),
            max_participants: max,
            booked_participants: booked,
            price_modifier_budget: Decimal::ONE,
            price_modifier_standard: Decimal::ONE,
            price_modifier_luxury: Decimal::ONE,
            accepting_bookings: true,
            notes: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn remaining_is_count_for_bounded_window() {
        assert_eq!(window(Some(10), 4).remaining(), SpotsRemaining::Spots(6));
        assert_eq!(window(Some(10), 10).remaining(), SpotsRemaining::Spots(0));
    }

    #[test]
    fn remaining_is_on_request_for_unbounded_window() {
        // Never zero or any other sentinel, regardless of booked count
        assert_eq!(window(None, 0).remaining(), SpotsRemaining::OnRequest);
        assert_eq!(window(None, 500).remaining(), SpotsRemaining::OnRequest);
    }
}
