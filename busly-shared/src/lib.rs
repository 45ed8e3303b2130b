pub mod models;
pub mod pii;

pub use models::{Booking, BookingSeat, BookingStatus, Bus, City, Otp, Seat, Trip, TripStatus, User};
pub use pii::Masked;
