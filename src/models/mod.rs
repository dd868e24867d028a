pub mod booking;

pub use booking::{NewBooking, StatusUpdate};
