use crate::error::{is_transient_db_error, is_unique_violation, AppError};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::availability::TourAvailability;
use crate::models::booking::{Booking, BookingExtra, BookingParticipant, NewBooking};
use crate::models::payment::BookingPayment;
use crate::models::tour::TourPackage;
use crate::services::availability::AvailabilityService;
use crate::services::notification::{NotificationKind, NotificationService};
use crate::utils::reference::{generate_booking_reference, generate_payment_reference};
use rand::Rng;
use rust_decimal::Decimal;
use safari_booking_shared::{
    AccommodationTier, AddExtraRequest, BookingCreatedResponse, BookingDetailResponse,
    BookingStatus, BookingSummaryResponse, CreateBookingRequest, ExtraResponse, PageQuery,
    PaginatedResponse, ParticipantResponse, PaymentResponse, PaymentStatus, QuickBookingRequest,
    RecordPaymentRequest, SetParticipantsRequest, UpdateExtraRequest, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE, REFERENCE_RETRY_ATTEMPTS, TRANSIENT_RETRY_ATTEMPTS,
};
use sqlx::PgPool;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

const RETRY_BASE_DELAY_MS: u64 = 50;

const ON_REQUEST_ADVISORY: &str =
    "This departure has capacity on request; our team will confirm availability with you directly.";

/// Booking lifecycle service. Every state transition runs in its own
/// database transaction together with any ledger movement it implies, and
/// transient contention failures get a bounded retry before surfacing.
#[derive(Clone)]
pub struct BookingService {
    db_pool: PgPool,
    notification_service: NotificationService,
}

/// The four staff/customer actions on an existing booking. Encodes the
/// whole state machine in one place: which statuses permit the action,
/// where it lands, and whether the ledger gives capacity back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleAction {
    Confirm,
    Complete,
    Cancel,
    Refund,
}

impl LifecycleAction {
    fn verb(&self) -> &'static str {
        match self {
            LifecycleAction::Confirm => "confirm",
            LifecycleAction::Complete => "complete",
            LifecycleAction::Cancel => "cancel",
            LifecycleAction::Refund => "refund",
        }
    }

    fn allowed_from(&self, from: BookingStatus) -> bool {
        match self {
            LifecycleAction::Confirm => from.can_confirm(),
            LifecycleAction::Complete => from.can_complete(),
            LifecycleAction::Cancel => from.can_cancel(),
            LifecycleAction::Refund => from.can_refund(),
        }
    }

    fn target(&self) -> BookingStatus {
        match self {
            LifecycleAction::Confirm => BookingStatus::Confirmed,
            LifecycleAction::Complete => BookingStatus::Completed,
            LifecycleAction::Cancel => BookingStatus::Cancelled,
            LifecycleAction::Refund => BookingStatus::Refunded,
        }
    }

    /// Whether the transition hands reserved slots back to the window.
    /// Completing never releases: the seats were consumed by travel.
    fn releases_capacity(&self) -> bool {
        matches!(self, LifecycleAction::Cancel | LifecycleAction::Refund)
    }

    fn notification(&self) -> Option<NotificationKind> {
        match self {
            LifecycleAction::Confirm => Some(NotificationKind::BookingConfirmed),
            LifecycleAction::Cancel => Some(NotificationKind::BookingCancelled),
            LifecycleAction::Refund => Some(NotificationKind::BookingRefunded),
            LifecycleAction::Complete => None,
        }
    }
}

/// Total price of a booking: per-participant tier price scaled by the
/// window's seasonal modifier, plus all extra line items.
pub fn booking_total(
    tier_price: Decimal,
    seasonal_modifier: Decimal,
    participants: i32,
    extras: &[BookingExtra],
) -> Decimal {
    let extras_total: Decimal = extras.iter().map(|e| e.total_price).sum();
    tier_price * seasonal_modifier * Decimal::from(participants) + extras_total
}

fn backoff_delay(attempt: u32) -> Duration {
    let base = RETRY_BASE_DELAY_MS * 2u64.pow(attempt);
    let jitter = rand::thread_rng().gen_range(0..RETRY_BASE_DELAY_MS);
    Duration::from_millis(base + jitter)
}

impl BookingService {
    pub fn new(db_pool: PgPool, notification_service: NotificationService) -> Self {
        Self {
            db_pool,
            notification_service,
        }
    }

    /// Create a booking: reserve capacity and insert the booking row in one
    /// transaction, so a commit means both happened and a rollback means
    /// neither did.
    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        request: CreateBookingRequest,
    ) -> Result<BookingCreatedResponse, AppError> {
        request.validate()?;

        if let Some(participants) = &request.participants {
            if participants.len() > request.number_of_participants as usize {
                return Err(AppError::Validation(format!(
                    "{} named participants exceed the {} booked seats",
                    participants.len(),
                    request.number_of_participants
                )));
            }
        }

        // Pre-reads outside the transaction; the reserve re-checks
        // everything that matters under the write.
        let window = TourAvailability::find_by_id(&self.db_pool, request.availability_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Availability window not found".to_string()))?;

        let tour = TourPackage::find_by_id(&self.db_pool, window.tour_package_id)
            .await?
            .filter(|t| t.is_active)
            .ok_or_else(|| AppError::NotFound("Tour not found".to_string()))?;

        let contact_name = request.contact_name.as_deref().unwrap_or(&user.name);
        let contact_email = request.contact_email.as_deref().unwrap_or(&user.email);
        let contact_phone = request.contact_phone.as_deref().unwrap_or(&user.phone);

        let mut transient_attempts: u32 = 0;
        let mut reference_attempts: u32 = 0;
        let (booking, window) = loop {
            let reference = generate_booking_reference();
            let new = NewBooking {
                booking_reference: &reference,
                user_id: user.user_id,
                tour_package_id: tour.id,
                tour_availability_id: window.id,
                number_of_participants: request.number_of_participants,
                accommodation_tier: request.accommodation_tier,
                contact_name,
                contact_email,
                contact_phone,
                special_requirements: request.special_requirements.as_deref(),
                dietary_requirements: request.dietary_requirements.as_deref(),
            };

            match self.create_once(&new, request.participants.as_deref()).await {
                Ok(pair) => break pair,
                Err(AppError::Database(e)) if is_unique_violation(&e) => {
                    reference_attempts += 1;
                    if reference_attempts >= REFERENCE_RETRY_ATTEMPTS {
                        return Err(AppError::Internal(
                            "Could not allocate a unique booking reference".to_string(),
                        ));
                    }
                    warn!(attempt = reference_attempts, "booking reference collision, regenerating");
                }
                Err(AppError::Database(e)) if is_transient_db_error(&e) => {
                    transient_attempts += 1;
                    if transient_attempts >= TRANSIENT_RETRY_ATTEMPTS {
                        return Err(AppError::Transient(e.to_string()));
                    }
                    warn!(
                        error = %e,
                        attempt = transient_attempts,
                        "transient database failure creating booking, retrying"
                    );
                    tokio::time::sleep(backoff_delay(transient_attempts)).await;
                }
                Err(e) => return Err(e),
            }
        };

        info!(
            booking_reference = %booking.booking_reference,
            tour = %tour.slug,
            participants = booking.number_of_participants,
            "booking created"
        );

        self.notification_service
            .enqueue(
                &booking.contact_email,
                NotificationKind::BookingCreated,
                &booking.booking_reference,
            )
            .await;

        let advisory = window
            .capacity()
            .is_on_request()
            .then(|| ON_REQUEST_ADVISORY.to_string());

        let detail = self.assemble_detail(&booking, &tour, &window).await?;

        Ok(BookingCreatedResponse {
            booking: detail,
            advisory,
            message: format!("Booking {} created", booking.booking_reference),
        })
    }

    async fn create_once(
        &self,
        new: &NewBooking<'_>,
        participants: Option<&[safari_booking_shared::ParticipantDetails]>,
    ) -> Result<(Booking, TourAvailability), AppError> {
        let mut tx = self.db_pool.begin().await?;

        let window =
            AvailabilityService::reserve(&mut tx, new.tour_availability_id, new.number_of_participants)
                .await?;
        let booking = Booking::insert_tx(&mut tx, new).await?;

        if let Some(participants) = participants {
            for details in participants {
                BookingParticipant::insert_tx(&mut tx, booking.id, details).await?;
            }
        }

        tx.commit().await?;
        Ok((booking, window))
    }

    /// One-click booking against a tour: defaults for everything, earliest
    /// open window unless one is named.
    pub async fn quick_create(
        &self,
        user: &AuthenticatedUser,
        tour_slug: &str,
        request: QuickBookingRequest,
    ) -> Result<BookingCreatedResponse, AppError> {
        request.validate()?;

        let tour = TourPackage::find_active_by_slug(&self.db_pool, tour_slug)
            .await?
            .ok_or_else(|| AppError::NotFound("Tour not found".to_string()))?;

        let window = match request.availability_id {
            Some(id) => TourAvailability::find_by_id(&self.db_pool, id)
                .await?
                .filter(|w| w.tour_package_id == tour.id)
                .ok_or_else(|| {
                    AppError::NotFound("Availability window not found for this tour".to_string())
                })?,
            None => TourAvailability::first_open_for_tour(&self.db_pool, tour.id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound("No open departures for this tour".to_string())
                })?,
        };

        self.create(
            user,
            CreateBookingRequest {
                availability_id: window.id,
                number_of_participants: request.number_of_participants.unwrap_or(1),
                accommodation_tier: AccommodationTier::Standard,
                contact_name: None,
                contact_email: None,
                contact_phone: None,
                special_requirements: None,
                dietary_requirements: None,
                participants: None,
            },
        )
        .await
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        query: &PageQuery,
    ) -> Result<PaginatedResponse<BookingSummaryResponse>, AppError> {
        query.validate()?;
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
        let offset = query.offset.unwrap_or(0);

        let rows = Booking::list_for_user(&self.db_pool, user_id, limit, offset).await?;
        let total = Booking::count_for_user(&self.db_pool, user_id).await?;

        Ok(PaginatedResponse {
            data: rows.iter().map(|r| r.to_response()).collect(),
            total,
            limit,
            offset,
            has_more: offset + limit < total,
        })
    }

    pub async fn detail(
        &self,
        user: &AuthenticatedUser,
        reference: &str,
    ) -> Result<BookingDetailResponse, AppError> {
        let booking = self.find_visible(user, reference).await?;

        let tour = TourPackage::find_by_id(&self.db_pool, booking.tour_package_id)
            .await?
            .ok_or_else(|| AppError::Internal("Booking references a missing tour".to_string()))?;
        let window = TourAvailability::find_by_id(&self.db_pool, booking.tour_availability_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal("Booking references a missing availability window".to_string())
            })?;

        self.assemble_detail(&booking, &tour, &window).await
    }

    /// Customer cancellation. Owners may cancel their own bookings; staff
    /// may cancel any.
    pub async fn cancel(
        &self,
        user: &AuthenticatedUser,
        reference: &str,
    ) -> Result<BookingDetailResponse, AppError> {
        let booking = self.find_visible(user, reference).await?;
        self.transition(&booking.booking_reference, LifecycleAction::Cancel)
            .await?;
        self.detail(user, reference).await
    }

    pub async fn confirm(
        &self,
        user: &AuthenticatedUser,
        reference: &str,
    ) -> Result<BookingDetailResponse, AppError> {
        user.require_staff()?;
        self.transition(reference, LifecycleAction::Confirm).await?;
        self.detail(user, reference).await
    }

    pub async fn complete(
        &self,
        user: &AuthenticatedUser,
        reference: &str,
    ) -> Result<BookingDetailResponse, AppError> {
        user.require_staff()?;
        self.transition(reference, LifecycleAction::Complete).await?;
        self.detail(user, reference).await
    }

    pub async fn refund(
        &self,
        user: &AuthenticatedUser,
        reference: &str,
    ) -> Result<BookingDetailResponse, AppError> {
        user.require_staff()?;
        self.transition(reference, LifecycleAction::Refund).await?;
        self.detail(user, reference).await
    }

    /// Run one lifecycle transition under the booking row lock. The status
    /// guard and the ledger release happen against the locked row, so a
    /// concurrent second cancel sees `cancelled` and is rejected instead of
    /// releasing twice.
    async fn transition(
        &self,
        reference: &str,
        action: LifecycleAction,
    ) -> Result<Booking, AppError> {
        let mut attempts: u32 = 0;
        let booking = loop {
            match self.transition_once(reference, action).await {
                Ok(booking) => break booking,
                Err(AppError::Database(e)) if is_transient_db_error(&e) => {
                    attempts += 1;
                    if attempts >= TRANSIENT_RETRY_ATTEMPTS {
                        return Err(AppError::Transient(e.to_string()));
                    }
                    warn!(
                        error = %e,
                        attempt = attempts,
                        action = action.verb(),
                        "transient database failure on booking transition, retrying"
                    );
                    tokio::time::sleep(backoff_delay(attempts)).await;
                }
                Err(e) => return Err(e),
            }
        };

        info!(
            booking_reference = %booking.booking_reference,
            action = action.verb(),
            status = %booking.status,
            "booking transitioned"
        );

        if let Some(kind) = action.notification() {
            self.notification_service
                .enqueue(&booking.contact_email, kind, &booking.booking_reference)
                .await;
        }

        Ok(booking)
    }

    async fn transition_once(
        &self,
        reference: &str,
        action: LifecycleAction,
    ) -> Result<Booking, AppError> {
        let mut tx = self.db_pool.begin().await?;

        let booking = Booking::find_by_reference_for_update(&mut tx, reference)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        if !action.allowed_from(booking.status) {
            return Err(AppError::InvalidTransition {
                from: booking.status,
                action: action.verb(),
            });
        }

        // Leaving a capacity-holding status is the single signal that the
        // reservation is to be handed back; the guard above already
        // rejected anything that would release twice.
        if action.releases_capacity() && booking.status.holds_capacity() {
            AvailabilityService::release(
                &mut tx,
                booking.tour_availability_id,
                booking.number_of_participants,
            )
            .await?;
        }

        let updated = Booking::update_status_tx(&mut tx, booking.id, action.target()).await?;
        tx.commit().await?;

        Ok(updated)
    }

    /// Replace the named participant list. Allowed while the booking still
    /// holds capacity; terminal bookings are immutable.
    pub async fn set_participants(
        &self,
        user: &AuthenticatedUser,
        reference: &str,
        request: SetParticipantsRequest,
    ) -> Result<Vec<ParticipantResponse>, AppError> {
        request.validate()?;

        let booking = self.find_visible(user, reference).await?;
        self.ensure_mutable(&booking, "update participants for")?;

        if request.participants.len() > booking.number_of_participants as usize {
            return Err(AppError::Validation(format!(
                "{} named participants exceed the {} booked seats",
                request.participants.len(),
                booking.number_of_participants
            )));
        }

        let mut tx = self.db_pool.begin().await?;
        BookingParticipant::delete_for_booking_tx(&mut tx, booking.id).await?;
        let mut responses = Vec::with_capacity(request.participants.len());
        for details in &request.participants {
            let participant = BookingParticipant::insert_tx(&mut tx, booking.id, details).await?;
            responses.push(participant.to_response());
        }
        tx.commit().await?;

        Ok(responses)
    }

    pub async fn add_extra(
        &self,
        user: &AuthenticatedUser,
        reference: &str,
        request: AddExtraRequest,
    ) -> Result<ExtraResponse, AppError> {
        request.validate()?;
        if request.unit_price < Decimal::ZERO {
            return Err(AppError::Validation(
                "unit_price must not be negative".to_string(),
            ));
        }

        let booking = self.find_visible(user, reference).await?;
        self.ensure_mutable(&booking, "add extras to")?;

        let extra = BookingExtra::create(
            &self.db_pool,
            booking.id,
            &request.name,
            request.description.as_deref(),
            request.quantity,
            request.unit_price,
        )
        .await?;

        Ok(extra.to_response())
    }

    pub async fn update_extra(
        &self,
        user: &AuthenticatedUser,
        reference: &str,
        extra_id: Uuid,
        request: UpdateExtraRequest,
    ) -> Result<ExtraResponse, AppError> {
        request.validate()?;
        if let Some(price) = request.unit_price {
            if price < Decimal::ZERO {
                return Err(AppError::Validation(
                    "unit_price must not be negative".to_string(),
                ));
            }
        }

        let booking = self.find_visible(user, reference).await?;
        self.ensure_mutable(&booking, "update extras on")?;

        let existing = BookingExtra::find_for_booking(&self.db_pool, extra_id, booking.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Extra not found".to_string()))?;

        let quantity = request.quantity.unwrap_or(existing.quantity);
        let unit_price = request.unit_price.unwrap_or(existing.unit_price);

        let updated = BookingExtra::update(&self.db_pool, existing.id, quantity, unit_price).await?;
        Ok(updated.to_response())
    }

    pub async fn record_payment(
        &self,
        user: &AuthenticatedUser,
        reference: &str,
        request: RecordPaymentRequest,
    ) -> Result<PaymentResponse, AppError> {
        if request.amount < Decimal::ZERO {
            return Err(AppError::Validation(
                "amount must not be negative".to_string(),
            ));
        }

        let booking = self.find_visible(user, reference).await?;
        if matches!(
            booking.status,
            BookingStatus::Cancelled | BookingStatus::Refunded
        ) {
            return Err(AppError::InvalidTransition {
                from: booking.status,
                action: "record a payment for",
            });
        }

        let status = request.status.unwrap_or(PaymentStatus::Completed);

        let mut attempts: u32 = 0;
        let payment = loop {
            let payment_reference = generate_payment_reference();
            match BookingPayment::record(
                &self.db_pool,
                booking.id,
                &payment_reference,
                request.payment_method,
                request.amount,
                &booking.currency,
                status,
            )
            .await
            {
                Ok(payment) => break payment,
                Err(AppError::Database(e)) if is_unique_violation(&e) => {
                    attempts += 1;
                    if attempts >= REFERENCE_RETRY_ATTEMPTS {
                        return Err(AppError::Internal(
                            "Could not allocate a unique payment reference".to_string(),
                        ));
                    }
                    warn!(attempt = attempts, "payment reference collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        };

        self.notification_service
            .enqueue(
                &booking.contact_email,
                NotificationKind::PaymentRecorded,
                &booking.booking_reference,
            )
            .await;

        Ok(payment.to_response())
    }

    /// Owner-scoped lookup, widened for staff.
    async fn find_visible(
        &self,
        user: &AuthenticatedUser,
        reference: &str,
    ) -> Result<Booking, AppError> {
        let booking = if user.is_staff() {
            Booking::find_by_reference(&self.db_pool, reference).await?
        } else {
            Booking::find_by_reference_for_user(&self.db_pool, reference, user.user_id).await?
        };

        booking.ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
    }

    fn ensure_mutable(&self, booking: &Booking, action: &'static str) -> Result<(), AppError> {
        if booking.status.holds_capacity() {
            Ok(())
        } else {
            Err(AppError::InvalidTransition {
                from: booking.status,
                action,
            })
        }
    }

    async fn assemble_detail(
        &self,
        booking: &Booking,
        tour: &TourPackage,
        window: &TourAvailability,
    ) -> Result<BookingDetailResponse, AppError> {
        let participants = BookingParticipant::find_by_booking(&self.db_pool, booking.id).await?;
        let extras = BookingExtra::find_by_booking(&self.db_pool, booking.id).await?;
        let payments = BookingPayment::find_by_booking(&self.db_pool, booking.id).await?;

        let total_price = booking_total(
            tour.tier_price(booking.accommodation_tier),
            window.modifier_for(booking.accommodation_tier),
            booking.number_of_participants,
            &extras,
        );

        Ok(BookingDetailResponse {
            booking_reference: booking.booking_reference.clone(),
            tour_slug: tour.slug.clone(),
            tour_title: tour.title.clone(),
            availability_id: window.id,
            start_date: window.start_date,
            end_date: window.end_date,
            number_of_participants: booking.number_of_participants,
            accommodation_tier: booking.accommodation_tier,
            status: booking.status,
            contact_name: booking.contact_name.clone(),
            contact_email: booking.contact_email.clone(),
            contact_phone: booking.contact_phone.clone(),
            special_requirements: booking.special_requirements.clone(),
            dietary_requirements: booking.dietary_requirements.clone(),
            participants: participants.iter().map(|p| p.to_response()).collect(),
            extras: extras.iter().map(|e| e.to_response()).collect(),
            payments: payments.iter().map(|p| p.to_response()).collect(),
            payment_status: BookingPayment::derive_status(&payments),
            total_price,
            currency: booking.currency.clone(),
            created_at: booking.created_at,
            confirmed_at: booking.confirmed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn state_machine_guards() {
        use BookingStatus::*;
        use LifecycleAction::*;

        assert!(Confirm.allowed_from(Pending));
        assert!(!Confirm.allowed_from(Confirmed));

        assert!(Cancel.allowed_from(Pending));
        assert!(Cancel.allowed_from(Confirmed));
        assert!(!Cancel.allowed_from(Cancelled));
        assert!(!Cancel.allowed_from(Completed));

        assert!(Complete.allowed_from(Confirmed));
        assert!(!Complete.allowed_from(Pending));

        assert!(Refund.allowed_from(Confirmed));
        assert!(!Refund.allowed_from(Pending));
        assert!(!Refund.allowed_from(Refunded));
    }

    #[test]
    fn only_cancel_and_refund_release_capacity() {
        assert!(LifecycleAction::Cancel.releases_capacity());
        assert!(LifecycleAction::Refund.releases_capacity());
        assert!(!LifecycleAction::Confirm.releases_capacity());
        assert!(!LifecycleAction::Complete.releases_capacity());
    }

    #[test]
    fn total_scales_with_participants_and_modifier() {
        let total = booking_total(
            Decimal::from_str("1200.00").unwrap(),
            Decimal::from_str("1.25").unwrap(),
            4,
            &[],
        );
        assert_eq!(total, Decimal::from_str("6000.00").unwrap());
    }

    #[test]
    fn total_includes_extra_line_items() {
        let extras = vec![extra(2, "75.00"), extra(1, "30.00")];
        let total = booking_total(Decimal::from_str("500.00").unwrap(), Decimal::ONE, 2, &extras);
        // 1000 base + 150 + 30 extras
        assert_eq!(total, Decimal::from_str("1180.00").unwrap());
    }

    #[test]
    fn backoff_grows_with_attempts() {
        let first = backoff_delay(1);
        let third = backoff_delay(3);
        assert!(first.as_millis() >= 100);
        assert!(third.as_millis() >= 400);
    }

    fn extra(quantity: i32, unit_price: &str) -> BookingExtra {
        let unit_price = Decimal::from_str(unit_price).unwrap();
        BookingExtra {
            id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            name: "Ngorongoro crater fee".to_string(),
            description: None,
            quantity,
            unit_price,
            total_price: BookingExtra::line_total(quantity, unit_price),
            created_at: chrono::Utc::now(),
        }
    }
}
