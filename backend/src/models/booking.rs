use crate::error::AppError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use safari_booking_shared::{
    AccommodationTier, BookingStatus, BookingSummaryResponse, ExtraResponse, ParticipantDetails,
    ParticipantResponse, DEFAULT_CURRENCY,
};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// The central transactional record. Never physically deleted; cancellation
/// is a status change, preserving history.
#[derive(Debug, Clone, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub booking_reference: String,
    pub user_id: Uuid,
    pub tour_package_id: Uuid,
    pub tour_availability_id: Uuid,
    pub number_of_participants: i32,
    pub accommodation_tier: AccommodationTier,
    pub status: BookingStatus,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub special_requirements: Option<String>,
    pub dietary_requirements: Option<String>,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Column values for a new booking row; the reference is generated by the
/// service so collisions can be retried there.
pub struct NewBooking<'a> {
    pub booking_reference: &'a str,
    pub user_id: Uuid,
    pub tour_package_id: Uuid,
    pub tour_availability_id: Uuid,
    pub number_of_participants: i32,
    pub accommodation_tier: AccommodationTier,
    pub contact_name: &'a str,
    pub contact_email: &'a str,
    pub contact_phone: &'a str,
    pub special_requirements: Option<&'a str>,
    pub dietary_requirements: Option<&'a str>,
}

impl Booking {
    /// Insert a new booking row inside the caller's transaction. Status
    /// starts at `pending`; the ledger reservation commits together with
    /// this insert or not at all.
    pub async fn insert_tx(
        tx: &mut Transaction<'_, Postgres>,
        new: &NewBooking<'_>,
    ) -> Result<Self, AppError> {
        let booking = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO bookings (
                booking_reference, user_id, tour_package_id, tour_availability_id,
                number_of_participants, accommodation_tier, status,
                contact_name, contact_email, contact_phone,
                special_requirements, dietary_requirements, currency
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(new.booking_reference)
        .bind(new.user_id)
        .bind(new.tour_package_id)
        .bind(new.tour_availability_id)
        .bind(new.number_of_participants)
        .bind(new.accommodation_tier)
        .bind(new.contact_name)
        .bind(new.contact_email)
        .bind(new.contact_phone)
        .bind(new.special_requirements)
        .bind(new.dietary_requirements)
        .bind(DEFAULT_CURRENCY)
        .fetch_one(&mut **tx)
        .await?;

        Ok(booking)
    }

    pub async fn find_by_reference_for_user(
        pool: &PgPool,
        reference: &str,
        user_id: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let booking = sqlx::query_as::<_, Self>(
            "SELECT * FROM bookings WHERE booking_reference = $1 AND user_id = $2",
        )
        .bind(reference)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(booking)
    }

    /// Staff lookup, not scoped to an owning user.
    pub async fn find_by_reference(
        pool: &PgPool,
        reference: &str,
    ) -> Result<Option<Self>, AppError> {
        let booking =
            sqlx::query_as::<_, Self>("SELECT * FROM bookings WHERE booking_reference = $1")
                .bind(reference)
                .fetch_optional(pool)
                .await?;

        Ok(booking)
    }

    /// Lock the booking row for a status transition. The status check and
    /// the update must see the same row state.
    pub async fn find_by_reference_for_update(
        tx: &mut Transaction<'_, Postgres>,
        reference: &str,
    ) -> Result<Option<Self>, AppError> {
        let booking = sqlx::query_as::<_, Self>(
            "SELECT * FROM bookings WHERE booking_reference = $1 FOR UPDATE",
        )
        .bind(reference)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(booking)
    }

    pub async fn update_status_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<Self, AppError> {
        let booking = match status {
            BookingStatus::Confirmed => {
                sqlx::query_as::<_, Self>(
                    "UPDATE bookings
                     SET status = $1, confirmed_at = NOW(), updated_at = NOW()
                     WHERE id = $2
                     RETURNING *",
                )
                .bind(status)
                .bind(id)
                .fetch_one(&mut **tx)
                .await?
            }
            _ => {
                sqlx::query_as::<_, Self>(
                    "UPDATE bookings
                     SET status = $1, updated_at = NOW()
                     WHERE id = $2
                     RETURNING *",
                )
                .bind(status)
                .bind(id)
                .fetch_one(&mut **tx)
                .await?
            }
        };

        Ok(booking)
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BookingListRow>, AppError> {
        let rows = sqlx::query_as::<_, BookingListRow>(
            r#"
            SELECT b.booking_reference, t.slug AS tour_slug, t.title AS tour_title,
                   a.start_date, a.end_date,
                   b.number_of_participants, b.accommodation_tier, b.status, b.created_at
            FROM bookings b
            JOIN tour_packages t ON b.tour_package_id = t.id
            JOIN tour_availability a ON b.tour_availability_id = a.id
            WHERE b.user_id = $1
            ORDER BY b.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    pub async fn count_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

/// Flattened row for the booking listing (joined with tour and window).
#[derive(Debug, Clone, FromRow)]
pub struct BookingListRow {
    pub booking_reference: String,
    pub tour_slug: String,
    pub tour_title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub number_of_participants: i32,
    pub accommodation_tier: AccommodationTier,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl BookingListRow {
    pub fn to_response(&self) -> BookingSummaryResponse {
        BookingSummaryResponse {
            booking_reference: self.booking_reference.clone(),
            tour_slug: self.tour_slug.clone(),
            tour_title: self.tour_title.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            number_of_participants: self.number_of_participants,
            accommodation_tier: self.accommodation_tier,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// A named person attached to one booking. Optional metadata: a booking may
/// carry fewer named participants than seats.
#[derive(Debug, Clone, FromRow)]
pub struct BookingParticipant {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub passport_number: Option<String>,
    pub dietary_requirements: Option<String>,
    pub medical_conditions: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BookingParticipant {
    pub async fn insert_tx(
        tx: &mut Transaction<'_, Postgres>,
        booking_id: Uuid,
        details: &ParticipantDetails,
    ) -> Result<Self, AppError> {
        let participant = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO booking_participants (
                booking_id, first_name, last_name, date_of_birth,
                nationality, passport_number, dietary_requirements, medical_conditions
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(booking_id)
        .bind(&details.first_name)
        .bind(&details.last_name)
        .bind(details.date_of_birth)
        .bind(&details.nationality)
        .bind(&details.passport_number)
        .bind(&details.dietary_requirements)
        .bind(&details.medical_conditions)
        .fetch_one(&mut **tx)
        .await?;

        Ok(participant)
    }

    pub async fn delete_for_booking_tx(
        tx: &mut Transaction<'_, Postgres>,
        booking_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM booking_participants WHERE booking_id = $1")
            .bind(booking_id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub async fn find_by_booking(pool: &PgPool, booking_id: Uuid) -> Result<Vec<Self>, AppError> {
        let participants = sqlx::query_as::<_, Self>(
            "SELECT * FROM booking_participants WHERE booking_id = $1 ORDER BY created_at",
        )
        .bind(booking_id)
        .fetch_all(pool)
        .await?;

        Ok(participants)
    }

    pub fn to_response(&self) -> ParticipantResponse {
        ParticipantResponse {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            date_of_birth: self.date_of_birth,
            nationality: self.nationality.clone(),
            passport_number: self.passport_number.clone(),
            dietary_requirements: self.dietary_requirements.clone(),
            medical_conditions: self.medical_conditions.clone(),
        }
    }
}

/// An add-on line item. `total_price` is recomputed from
/// `quantity * unit_price` on every write and may never drift from that
/// product (also enforced by a table CHECK).
#[derive(Debug, Clone, FromRow)]
pub struct BookingExtra {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl BookingExtra {
    pub async fn create(
        pool: &PgPool,
        booking_id: Uuid,
        name: &str,
        description: Option<&str>,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<Self, AppError> {
        let total_price = Self::line_total(quantity, unit_price);

        let extra = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO booking_extras (booking_id, name, description, quantity, unit_price, total_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(booking_id)
        .bind(name)
        .bind(description)
        .bind(quantity)
        .bind(unit_price)
        .bind(total_price)
        .fetch_one(pool)
        .await?;

        Ok(extra)
    }

    /// Update quantity and/or unit price; the stored total always follows.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<Self, AppError> {
        let total_price = Self::line_total(quantity, unit_price);

        let extra = sqlx::query_as::<_, Self>(
            r#"
            UPDATE booking_extras
            SET quantity = $1, unit_price = $2, total_price = $3
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(quantity)
        .bind(unit_price)
        .bind(total_price)
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(extra)
    }

    pub async fn find_by_booking(pool: &PgPool, booking_id: Uuid) -> Result<Vec<Self>, AppError> {
        let extras = sqlx::query_as::<_, Self>(
            "SELECT * FROM booking_extras WHERE booking_id = $1 ORDER BY created_at",
        )
        .bind(booking_id)
        .fetch_all(pool)
        .await?;

        Ok(extras)
    }

    pub async fn find_for_booking(
        pool: &PgPool,
        id: Uuid,
        booking_id: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let extra = sqlx::query_as::<_, Self>(
            "SELECT * FROM booking_extras WHERE id = $1 AND booking_id = $2",
        )
        .bind(id)
        .bind(booking_id)
        .fetch_optional(pool)
        .await?;

        Ok(extra)
    }

    pub fn line_total(quantity: i32, unit_price: Decimal) -> Decimal {
        Decimal::from(quantity) * unit_price
    }

    pub fn to_response(&self) -> ExtraResponse {
        ExtraResponse {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_price: self.total_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn extra_total_is_quantity_times_unit_price() {
        let unit = Decimal::from_str("12.50").unwrap();
        assert_eq!(
            BookingExtra::line_total(3, unit),
            Decimal::from_str("37.50").unwrap()
        );
        assert_eq!(
            BookingExtra::line_total(5, unit),
            Decimal::from_str("62.50").unwrap()
        );
    }

    #[test]
    fn extra_total_handles_zero_price() {
        assert_eq!(BookingExtra::line_total(4, Decimal::ZERO), Decimal::ZERO);
    }
}
