use crate::error::AppError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use safari_booking_shared::{PaymentMethod, PaymentResponse, PaymentStatus};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// One recorded payment attempt against a booking. Bookings carry no
/// payment status column of their own; it is always derived from the
/// latest payment row.
#[derive(Debug, Clone, FromRow)]
pub struct BookingPayment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub payment_reference: String,
    pub payment_method: PaymentMethod,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl BookingPayment {
    pub async fn record(
        pool: &PgPool,
        booking_id: Uuid,
        payment_reference: &str,
        method: PaymentMethod,
        amount: Decimal,
        currency: &str,
        status: PaymentStatus,
    ) -> Result<Self, AppError> {
        let processed_at = match status {
            PaymentStatus::Completed | PaymentStatus::Failed | PaymentStatus::Refunded => {
                Some(Utc::now())
            }
            _ => None,
        };

        let payment = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO booking_payments (
                booking_id, payment_reference, payment_method, amount, currency, status, processed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(booking_id)
        .bind(payment_reference)
        .bind(method)
        .bind(amount)
        .bind(currency)
        .bind(status)
        .bind(processed_at)
        .fetch_one(pool)
        .await?;

        Ok(payment)
    }

    /// Payments for a booking, newest first.
    pub async fn find_by_booking(pool: &PgPool, booking_id: Uuid) -> Result<Vec<Self>, AppError> {
        let payments = sqlx::query_as::<_, Self>(
            "SELECT * FROM booking_payments WHERE booking_id = $1 ORDER BY created_at DESC",
        )
        .bind(booking_id)
        .fetch_all(pool)
        .await?;

        Ok(payments)
    }

    /// Derived payment state of a booking: the status of its most recent
    /// payment, or `Pending` when none have been recorded.
    pub fn derive_status(payments: &[Self]) -> PaymentStatus {
        payments
            .first()
            .map(|p| p.status)
            .unwrap_or(PaymentStatus::Pending)
    }

    pub fn to_response(&self) -> PaymentResponse {
        PaymentResponse {
            id: self.id,
            payment_reference: self.payment_reference.clone(),
            payment_method: self.payment_method,
            amount: self.amount,
            currency: self.currency.clone(),
            status: self.status,
            created_at: self.created_at,
            processed_at: self.processed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(status: PaymentStatus, created_at: DateTime<Utc>) -> BookingPayment {
        BookingPayment {
            id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            payment_reference: "PAY0011223344".into(),
            payment_method: PaymentMethod::Mpesa,
            amount: Decimal::new(10000, 2),
            currency: "USD".into(),
            status,
            created_at,
            processed_at: None,
        }
    }

    #[test]
    fn derived_status_is_pending_without_payments() {
        assert_eq!(BookingPayment::derive_status(&[]), PaymentStatus::Pending);
    }

    #[test]
    fn derived_status_follows_latest_payment() {
        let now = Utc::now();
        // find_by_booking orders newest first
        let payments = vec![
            payment(PaymentStatus::Completed, now),
            payment(PaymentStatus::Failed, now - chrono::Duration::minutes(5)),
        ];
        assert_eq!(
            BookingPayment::derive_status(&payments),
            PaymentStatus::Completed
        );
    }
}
