#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use safari_booking_backend::middleware::auth::AuthenticatedUser;
use safari_booking_backend::services::{BookingService, NotificationService};
use safari_booking_shared::{AccommodationTier, CreateBookingRequest, UserRole};
use sqlx::PgPool;
use uuid::Uuid;

/// Database-backed tests need a Postgres instance; they are `#[ignore]`d so
/// the suite passes without one. Run them with:
///
///   TEST_DATABASE_URL=postgres://... cargo test -- --ignored
pub async fn test_pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set for database-backed tests");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .expect("failed to connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations failed");
    pool
}

pub fn booking_service(pool: &PgPool) -> BookingService {
    BookingService::new(
        pool.clone(),
        NotificationService::new("bookings@test.example".to_string()),
    )
}

pub fn customer() -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: Uuid::new_v4(),
        name: "Asha Mushi".to_string(),
        email: "asha@example.com".to_string(),
        phone: "+255700000001".to_string(),
        role: UserRole::User,
    }
}

pub fn staff() -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: Uuid::new_v4(),
        name: "Ops Desk".to_string(),
        email: "ops@example.com".to_string(),
        phone: String::new(),
        role: UserRole::Staff,
    }
}

pub async fn seed_tour(pool: &PgPool) -> Uuid {
    let slug = format!("serengeti-classic-{}", Uuid::new_v4().simple());
    sqlx::query_scalar(
        r#"
        INSERT INTO tour_packages (
            slug, title, description, duration_days, duration_nights,
            min_participants, max_participants,
            price_budget, price_standard, price_luxury, is_active
        )
        VALUES ($1, 'Serengeti Classic', 'Five days across the plains', 5, 4,
                1, 20, 900.00, 1200.00, 2100.00, TRUE)
        RETURNING id
        "#,
    )
    .bind(slug)
    .fetch_one(pool)
    .await
    .expect("seed tour")
}

pub async fn seed_window(pool: &PgPool, tour_id: Uuid, max_participants: Option<i32>) -> Uuid {
    sqlx::query_scalar(
        r#"
        INSERT INTO tour_availability (
            tour_package_id, start_date, end_date, max_participants,
            price_modifier_budget, price_modifier_standard, price_modifier_luxury,
            accepting_bookings, notes
        )
        VALUES ($1, $2, $3, $4, 1.00, 1.00, 1.00, TRUE, '')
        RETURNING id
        "#,
    )
    .bind(tour_id)
    .bind(NaiveDate::from_ymd_opt(2027, 7, 1).unwrap())
    .bind(NaiveDate::from_ymd_opt(2027, 7, 6).unwrap())
    .bind(max_participants)
    .fetch_one(pool)
    .await
    .expect("seed window")
}

pub async fn booked_count(pool: &PgPool, window_id: Uuid) -> i32 {
    sqlx::query_scalar("SELECT booked_participants FROM tour_availability WHERE id = $1")
        .bind(window_id)
        .fetch_one(pool)
        .await
        .expect("read booked_participants")
}

pub fn booking_request(availability_id: Uuid, participants: i32) -> CreateBookingRequest {
    CreateBookingRequest {
        availability_id,
        number_of_participants: participants,
        accommodation_tier: AccommodationTier::Standard,
        contact_name: None,
        contact_email: None,
        contact_phone: None,
        special_requirements: None,
        dietary_requirements: None,
        participants: None,
    }
}

pub fn price(s: &str) -> Decimal {
    s.parse().expect("decimal literal")
}
