use crate::error::AppError;
use crate::models::availability::TourAvailability;
use crate::models::tour::TourPackage;
use safari_booking_shared::{AvailabilityResponse, SpotsRemaining};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::warn;
use uuid::Uuid;

/// The availability ledger. All mutations of `booked_participants` go
/// through `reserve` and `release`, each executed on the caller's
/// transaction so the counter moves together with the booking row.
#[derive(Clone)]
pub struct AvailabilityService {
    db_pool: PgPool,
}

impl AvailabilityService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Open windows for a tour, for the catalog detail endpoint.
    pub async fn windows_for_tour(&self, slug: &str) -> Result<Vec<AvailabilityResponse>, AppError> {
        let tour = TourPackage::find_active_by_slug(&self.db_pool, slug)
            .await?
            .ok_or_else(|| AppError::NotFound("Tour not found".to_string()))?;

        let windows = TourAvailability::find_open_for_tour(&self.db_pool, tour.id).await?;
        Ok(windows.iter().map(TourAvailability::to_response).collect())
    }

    /// Reserve `count` participant-slots on a window.
    ///
    /// The capacity check and the counter increment are one conditional
    /// UPDATE, so two concurrent reservations can never both pass a check
    /// they read in application memory. A window with no participant cap
    /// (capacity on request) admits any count.
    pub async fn reserve(
        tx: &mut Transaction<'_, Postgres>,
        availability_id: Uuid,
        count: i32,
    ) -> Result<TourAvailability, AppError> {
        let reserved = sqlx::query_as::<_, TourAvailability>(
            r#"
            UPDATE tour_availability
            SET booked_participants = booked_participants + $2, updated_at = NOW()
            WHERE id = $1
              AND accepting_bookings
              AND (max_participants IS NULL
                   OR booked_participants + $2 <= max_participants)
            RETURNING *
            "#,
        )
        .bind(availability_id)
        .bind(count)
        .fetch_optional(&mut **tx)
        .await?;

        match reserved {
            Some(window) => Ok(window),
            // The conditional matched nothing; re-read to say why.
            None => {
                let window = TourAvailability::find_by_id_for_update(tx, availability_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound("Availability window not found".to_string())
                    })?;

                if !window.accepting_bookings {
                    return Err(AppError::Validation(
                        "This departure is no longer accepting bookings".to_string(),
                    ));
                }

                let remaining = match window.remaining() {
                    SpotsRemaining::Spots(n) => n,
                    // Unbounded windows always admit, so the UPDATE would
                    // have matched.
                    SpotsRemaining::OnRequest => {
                        return Err(AppError::Internal(
                            "Reservation failed on an unbounded window".to_string(),
                        ))
                    }
                };

                Err(AppError::InsufficientCapacity {
                    requested: count,
                    remaining,
                })
            }
        }
    }

    /// Release `count` previously reserved participant-slots.
    ///
    /// Never fails on underflow: the counter is clamped at zero so a
    /// cancellation always completes, but a clamp that changed the
    /// arithmetic result is logged as an accounting bug.
    pub async fn release(
        tx: &mut Transaction<'_, Postgres>,
        availability_id: Uuid,
        count: i32,
    ) -> Result<TourAvailability, AppError> {
        let window = TourAvailability::find_by_id_for_update(tx, availability_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Availability window not found".to_string()))?;

        let expected = window.booked_participants - count;
        let clamped = expected.max(0);
        if clamped != expected {
            warn!(
                availability_id = %availability_id,
                booked = window.booked_participants,
                released = count,
                "release clamped booked_participants at zero; counter was already inconsistent"
            );
        }

        let updated = sqlx::query_as::<_, TourAvailability>(
            "UPDATE tour_availability
             SET booked_participants = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(availability_id)
        .bind(clamped)
        .fetch_one(&mut **tx)
        .await?;

        Ok(updated)
    }
}
