use crate::error::AppError;
use crate::middleware::auth::AuthenticatedUser;
use crate::services::booking::BookingService;
use actix_web::{web, HttpResponse};
use safari_booking_shared::{
    AddExtraRequest, CreateBookingRequest, PageQuery, QuickBookingRequest, RecordPaymentRequest,
    SetParticipantsRequest, UpdateExtraRequest,
};
use tracing::debug;
use uuid::Uuid;

pub async fn create_booking(
    user: AuthenticatedUser,
    request: web::Json<CreateBookingRequest>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    debug!(
        "Creating booking for user {} on window {}",
        user.user_id, request.availability_id
    );

    let response = booking_service
        .create(&user, request.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(response))
}

/// One-click booking against a tour slug: earliest open window, defaults
/// for everything not given.
pub async fn quick_booking(
    user: AuthenticatedUser,
    slug: web::Path<String>,
    request: web::Json<QuickBookingRequest>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    let response = booking_service
        .quick_create(&user, &slug, request.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(response))
}

pub async fn list_bookings(
    user: AuthenticatedUser,
    query: web::Query<PageQuery>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    let page = booking_service.list(user.user_id, &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn get_booking(
    user: AuthenticatedUser,
    reference: web::Path<String>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    let detail = booking_service.detail(&user, &reference).await?;
    Ok(HttpResponse::Ok().json(detail))
}

pub async fn cancel_booking(
    user: AuthenticatedUser,
    reference: web::Path<String>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    let detail = booking_service.cancel(&user, &reference).await?;
    Ok(HttpResponse::Ok().json(detail))
}

// Staff transitions. The service re-checks the role so these cannot be
// reached by route misconfiguration alone.

pub async fn confirm_booking(
    user: AuthenticatedUser,
    reference: web::Path<String>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    let detail = booking_service.confirm(&user, &reference).await?;
    Ok(HttpResponse::Ok().json(detail))
}

pub async fn complete_booking(
    user: AuthenticatedUser,
    reference: web::Path<String>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    let detail = booking_service.complete(&user, &reference).await?;
    Ok(HttpResponse::Ok().json(detail))
}

pub async fn refund_booking(
    user: AuthenticatedUser,
    reference: web::Path<String>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    let detail = booking_service.refund(&user, &reference).await?;
    Ok(HttpResponse::Ok().json(detail))
}

pub async fn set_participants(
    user: AuthenticatedUser,
    reference: web::Path<String>,
    request: web::Json<SetParticipantsRequest>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    let participants = booking_service
        .set_participants(&user, &reference, request.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(participants))
}

pub async fn add_extra(
    user: AuthenticatedUser,
    reference: web::Path<String>,
    request: web::Json<AddExtraRequest>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    let extra = booking_service
        .add_extra(&user, &reference, request.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(extra))
}

pub async fn update_extra(
    user: AuthenticatedUser,
    path: web::Path<(String, Uuid)>,
    request: web::Json<UpdateExtraRequest>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    let (reference, extra_id) = path.into_inner();
    let extra = booking_service
        .update_extra(&user, &reference, extra_id, request.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(extra))
}

pub async fn record_payment(
    user: AuthenticatedUser,
    reference: web::Path<String>,
    request: web::Json<RecordPaymentRequest>,
    booking_service: web::Data<BookingService>,
) -> Result<HttpResponse, AppError> {
    let payment = booking_service
        .record_payment(&user, &reference, request.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(payment))
}
