use crate::types::*;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// Booking DTOs

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBookingRequest {
    /// The availability window to book against.
    pub availability_id: Uuid,

    #[validate(range(min = 1, max = 100))]
    pub number_of_participants: i32,

    pub accommodation_tier: AccommodationTier,

    /// Contact fields default to the authenticated user's details when
    /// omitted.
    #[validate(length(max = 100))]
    pub contact_name: Option<String>,

    #[validate(email)]
    pub contact_email: Option<String>,

    #[validate(length(max = 20))]
    pub contact_phone: Option<String>,

    #[validate(length(max = 2000))]
    pub special_requirements: Option<String>,

    #[validate(length(max = 2000))]
    pub dietary_requirements: Option<String>,

    /// Optional named participants. May be fewer than
    /// `number_of_participants`; names are metadata, not a per-seat
    /// manifest.
    #[validate]
    pub participants: Option<Vec<ParticipantDetails>>,
}

/// One-click reserve: everything defaults, the earliest open window is
/// picked when no window is given.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuickBookingRequest {
    pub availability_id: Option<Uuid>,

    #[validate(range(min = 1, max = 100))]
    pub number_of_participants: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ParticipantDetails {
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,

    #[validate(length(min = 1, max = 50))]
    pub last_name: String,

    pub date_of_birth: Option<NaiveDate>,

    #[validate(length(max = 50))]
    pub nationality: Option<String>,

    #[validate(length(max = 20))]
    pub passport_number: Option<String>,

    #[validate(length(max = 2000))]
    pub dietary_requirements: Option<String>,

    #[validate(length(max = 2000))]
    pub medical_conditions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetParticipantsRequest {
    #[validate]
    pub participants: Vec<ParticipantDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddExtraRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(range(min = 1))]
    pub quantity: i32,

    /// Validated non-negative in the service; `validator` ranges do not
    /// cover `Decimal`.
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateExtraRequest {
    #[validate(range(min = 1))]
    pub quantity: Option<i32>,

    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    pub payment_method: PaymentMethod,

    pub amount: Decimal,

    /// Defaults to `completed` for cash-on-arrival recording.
    pub status: Option<PaymentStatus>,
}

// Responses

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSummaryResponse {
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDetailResponse {
    pub booking_reference: String,
    pub tour_slug: String,
    pub tour_title: String,
    pub availability_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub number_of_participants: i32,
    pub accommodation_tier: AccommodationTier,
    pub status: BookingStatus,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub special_requirements: Option<String>,
    pub dietary_requirements: Option<String>,
    pub participants: Vec<ParticipantResponse>,
    pub extras: Vec<ExtraResponse>,
    pub payments: Vec<PaymentResponse>,
    /// Derived from the most recent payment record; `pending` when none.
    pub payment_status: PaymentStatus,
    pub total_price: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCreatedResponse {
    pub booking: BookingDetailResponse,
    /// Set for capacity-on-request windows: the reservation is accepted
    /// provisionally and confirmed by staff.
    pub advisory: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub passport_number: Option<String>,
    pub dietary_requirements: Option<String>,
    pub medical_conditions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub payment_reference: String,
    pub payment_method: PaymentMethod,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

// Catalog DTOs

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourSummaryResponse {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub duration_days: i32,
    pub duration_nights: i32,
    pub price_standard: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourDetailResponse {
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
    pub availability: Vec<AvailabilityResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub remaining: SpotsRemaining,
}

// Pagination

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PageQuery {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,

    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_booking_request_rejects_zero_participants() {
        let request = CreateBookingRequest {
            availability_id: Uuid::new_v4(),
            number_of_participants: 0,
            accommodation_tier: AccommodationTier::Standard,
            contact_name: None,
            contact_email: None,
            contact_phone: None,
            special_requirements: None,
            dietary_requirements: None,
            participants: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn participant_name_is_required() {
        let participant = ParticipantDetails {
            first_name: String::new(),
            last_name: "Mushi".to_string(),
            date_of_birth: None,
            nationality: None,
            passport_number: None,
            dietary_requirements: None,
            medical_conditions: None,
        };
        assert!(participant.validate().is_err());
    }

    #[test]
    fn availability_response_serializes_on_request() {
        let response = AvailabilityResponse {
            id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 7, 8).unwrap(),
            remaining: SpotsRemaining::OnRequest,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["remaining"], serde_json::json!("on-request"));
    }
}
