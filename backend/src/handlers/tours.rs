use crate::database::Database;
use crate::error::AppError;
use crate::models::availability::TourAvailability;
use crate::models::tour::TourPackage;
use crate::services::availability::AvailabilityService;
use actix_web::{web, HttpResponse};
use safari_booking_shared::{
    PageQuery, PaginatedResponse, TourDetailResponse, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use tracing::debug;
use validator::Validate;

/// List active tour packages.
pub async fn list_tours(
    query: web::Query<PageQuery>,
    db: web::Data<Database>,
) -> Result<HttpResponse, AppError> {
    query.validate()?;
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    let tours = TourPackage::list_active(db.pool(), limit, offset).await?;
    let total = TourPackage::count_active(db.pool()).await?;

    Ok(HttpResponse::Ok().json(PaginatedResponse {
        data: tours.iter().map(|t| t.to_summary()).collect::<Vec<_>>(),
        total,
        limit,
        offset,
        has_more: offset + limit < total,
    }))
}

/// Tour detail with its open departure windows.
pub async fn get_tour(
    slug: web::Path<String>,
    db: web::Data<Database>,
) -> Result<HttpResponse, AppError> {
    debug!("Getting tour {}", slug);

    let tour = TourPackage::find_active_by_slug(db.pool(), &slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Tour not found".to_string()))?;

    let windows = TourAvailability::find_open_for_tour(db.pool(), tour.id).await?;

    Ok(HttpResponse::Ok().json(TourDetailResponse {
        id: tour.id,
        slug: tour.slug.clone(),
        title: tour.title.clone(),
        description: tour.description.clone(),
        duration_days: tour.duration_days,
        duration_nights: tour.duration_nights,
        min_participants: tour.min_participants,
        max_participants: tour.max_participants,
        price_budget: tour.price_budget,
        price_standard: tour.price_standard,
        price_luxury: tour.price_luxury,
        availability: windows.iter().map(TourAvailability::to_response).collect(),
    }))
}

/// Open availability windows for a tour.
pub async fn get_tour_availability(
    slug: web::Path<String>,
    availability_service: web::Data<AvailabilityService>,
) -> Result<HttpResponse, AppError> {
    let windows = availability_service.windows_for_tour(&slug).await?;
    Ok(HttpResponse::Ok().json(windows))
}
