pub mod availability;
pub mod booking;
pub mod notification;

pub use availability::AvailabilityService;
pub use booking::BookingService;
pub use notification::NotificationService;
