pub mod availability;
pub mod booking;
pub mod payment;
pub mod tour;

pub use availability::TourAvailability;
pub use booking::{Booking, BookingExtra, BookingParticipant};
pub use payment::BookingPayment;
pub use tour::TourPackage;
