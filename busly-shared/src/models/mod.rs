pub mod booking;
pub mod catalog;
pub mod user;

pub use booking::{Booking, BookingSeat, BookingStatus};
pub use catalog::{Bus, City, Seat, Trip, TripStatus};
pub use user::{Otp, User};
