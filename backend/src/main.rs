use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use safari_booking_backend::config::AppConfig;
use safari_booking_backend::database::Database;
use safari_booking_backend::error::AppError;
use safari_booking_backend::handlers;
use safari_booking_backend::middleware::auth::AuthMiddleware;
use safari_booking_backend::services::{AvailabilityService, BookingService, NotificationService};
use safari_booking_backend::utils::jwt::JwtService;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;
    info!(
        "Starting Safari Booking Backend on {}:{}",
        config.host, config.port
    );

    let database = Database::new(&config.database_url).await?;
    database.migrate().await?;

    let jwt_service = JwtService::new(&config.jwt_secret)?;

    let notification_service = NotificationService::new(config.notification_from_email.clone());
    notification_service.start_background_tasks();

    let availability_service = AvailabilityService::new(database.pool().clone());
    let booking_service =
        BookingService::new(database.pool().clone(), notification_service.clone());

    let bind_addr = format!("{}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(web::Data::new(database.clone()))
            .app_data(web::Data::new(availability_service.clone()))
            .app_data(web::Data::new(booking_service.clone()))
            .service(
                web::scope("/api/v1")
                    .service(handlers::health::health_check)
                    .service(
                        web::scope("/tours")
                            // Public catalog
                            .route("", web::get().to(handlers::tours::list_tours))
                            .route("/{slug}", web::get().to(handlers::tours::get_tour))
                            .route(
                                "/{slug}/availability",
                                web::get().to(handlers::tours::get_tour_availability),
                            )
                            .service(
                                web::scope("")
                                    .wrap(AuthMiddleware::new(jwt_service.clone()))
                                    .route(
                                        "/{slug}/bookings/quick",
                                        web::post().to(handlers::bookings::quick_booking),
                                    ),
                            ),
                    )
                    .service(
                        web::scope("/bookings")
                            .wrap(AuthMiddleware::new(jwt_service.clone()))
                            .route("", web::post().to(handlers::bookings::create_booking))
                            .route("", web::get().to(handlers::bookings::list_bookings))
                            .route(
                                "/{reference}",
                                web::get().to(handlers::bookings::get_booking),
                            )
                            .route(
                                "/{reference}/cancel",
                                web::post().to(handlers::bookings::cancel_booking),
                            )
                            .route(
                                "/{reference}/confirm",
                                web::post().to(handlers::bookings::confirm_booking),
                            )
                            .route(
                                "/{reference}/complete",
                                web::post().to(handlers::bookings::complete_booking),
                            )
                            .route(
                                "/{reference}/refund",
                                web::post().to(handlers::bookings::refund_booking),
                            )
                            .route(
                                "/{reference}/participants",
                                web::put().to(handlers::bookings::set_participants),
                            )
                            .route(
                                "/{reference}/extras",
                                web::post().to(handlers::bookings::add_extra),
                            )
                            .route(
                                "/{reference}/extras/{extra_id}",
                                web::patch().to(handlers::bookings::update_extra),
                            )
                            .route(
                                "/{reference}/payments",
                                web::post().to(handlers::bookings::record_payment),
                            ),
                    ),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
    .map_err(AppError::from)
}
