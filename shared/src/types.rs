use serde::{Deserialize, Serialize};
use std::fmt;

// Booking lifecycle enums

/// Booking lifecycle states. Capacity on the availability window is held
/// while the booking is in a capacity-holding state and released exactly
/// once when it leaves one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    Refunded,
}

impl BookingStatus {
    /// Single source of truth for "this booking holds spots on the ledger".
    pub fn holds_capacity(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Cancelled | BookingStatus::Completed | BookingStatus::Refunded
        )
    }

    pub fn can_cancel(&self) -> bool {
        self.holds_capacity()
    }

    pub fn can_confirm(&self) -> bool {
        matches!(self, BookingStatus::Pending)
    }

    pub fn can_complete(&self) -> bool {
        matches!(self, BookingStatus::Confirmed)
    }

    pub fn can_refund(&self) -> bool {
        matches!(self, BookingStatus::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
            BookingStatus::Completed => write!(f, "completed"),
            BookingStatus::Refunded => write!(f, "refunded"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "accommodation_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccommodationTier {
    Budget,
    Standard,
    Luxury,
}

impl fmt::Display for AccommodationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccommodationTier::Budget => write!(f, "budget"),
            AccommodationTier::Standard => write!(f, "standard"),
            AccommodationTier::Luxury => write!(f, "luxury"),
        }
    }
}

// Payment enums

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    BankTransfer,
    Mpesa,
    Cash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Processing => write!(f, "processing"),
            PaymentStatus::Completed => write!(f, "completed"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

// User roles supplied by the identity collaborator via JWT claims.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Staff,
    Admin,
}

// Capacity modeling

/// Capacity of an availability window. A window either has a fixed
/// participant ceiling or accepts bookings provisionally ("capacity on
/// request"), pending manual confirmation by staff. Distinct from "zero
/// spots remaining" by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    Bounded(i32),
    OnRequest,
}

impl Capacity {
    /// Map the nullable column representation onto the variant type.
    pub fn from_column(max_participants: Option<i32>) -> Self {
        match max_participants {
            Some(max) => Capacity::Bounded(max),
            None => Capacity::OnRequest,
        }
    }

    /// Whether a request for `count` more spots fits given `reserved`
    /// already committed. On-request windows always admit.
    pub fn admits(&self, reserved: i32, count: i32) -> bool {
        match self {
            Capacity::Bounded(max) => reserved + count <= *max,
            Capacity::OnRequest => true,
        }
    }

    /// Spots still available given `reserved` already committed.
    pub fn remaining(&self, reserved: i32) -> SpotsRemaining {
        match self {
            Capacity::Bounded(max) => SpotsRemaining::Spots((max - reserved).max(0)),
            Capacity::OnRequest => SpotsRemaining::OnRequest,
        }
    }

    pub fn is_on_request(&self) -> bool {
        matches!(self, Capacity::OnRequest)
    }
}

/// Remaining spots reported to clients: a concrete count for bounded
/// windows, the literal string "on-request" otherwise. Never a sentinel
/// number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpotsRemaining {
    Spots(i32),
    OnRequest,
}

impl Serialize for SpotsRemaining {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            SpotsRemaining::Spots(n) => serializer.serialize_i32(*n),
            SpotsRemaining::OnRequest => serializer.serialize_str("on-request"),
        }
    }
}

impl<'de> Deserialize<'de> for SpotsRemaining {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Spots(i32),
            Label(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Spots(n) => Ok(SpotsRemaining::Spots(n)),
            Raw::Label(s) if s == "on-request" => Ok(SpotsRemaining::OnRequest),
            Raw::Label(other) => Err(serde::de::Error::custom(format!(
                "expected an integer or \"on-request\", got \"{other}\""
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_holding_states() {
        assert!(BookingStatus::Pending.holds_capacity());
        assert!(BookingStatus::Confirmed.holds_capacity());
        assert!(!BookingStatus::Cancelled.holds_capacity());
        assert!(!BookingStatus::Completed.holds_capacity());
        assert!(!BookingStatus::Refunded.holds_capacity());
    }

    #[test]
    fn terminal_states_cannot_cancel() {
        for status in [
            BookingStatus::Cancelled,
            BookingStatus::Completed,
            BookingStatus::Refunded,
        ] {
            assert!(status.is_terminal());
            assert!(!status.can_cancel());
            assert!(!status.can_confirm());
            assert!(!status.can_complete());
            assert!(!status.can_refund());
        }
    }

    #[test]
    fn bounded_capacity_admits_up_to_ceiling() {
        let cap = Capacity::Bounded(10);
        assert!(cap.admits(0, 10));
        assert!(cap.admits(4, 6));
        assert!(!cap.admits(4, 7));
        assert_eq!(cap.remaining(4), SpotsRemaining::Spots(6));
        assert_eq!(cap.remaining(12), SpotsRemaining::Spots(0));
    }

    #[test]
    fn on_request_capacity_always_admits() {
        let cap = Capacity::from_column(None);
        assert!(cap.admits(50, 50));
        assert!(cap.is_on_request());
        assert_eq!(cap.remaining(50), SpotsRemaining::OnRequest);
    }

    #[test]
    fn remaining_serializes_as_number_or_label() {
        let spots = serde_json::to_value(SpotsRemaining::Spots(6)).unwrap();
        assert_eq!(spots, serde_json::json!(6));

        let on_request = serde_json::to_value(SpotsRemaining::OnRequest).unwrap();
        assert_eq!(on_request, serde_json::json!("on-request"));

        let round: SpotsRemaining = serde_json::from_value(on_request).unwrap();
        assert_eq!(round, SpotsRemaining::OnRequest);
    }
}
