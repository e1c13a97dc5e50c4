//! Domain definitions.

pub mod booking;
pub mod cinema;
pub mod movie;
pub mod promotion;
pub mod seat;
pub mod showtime;
pub mod user;

pub use self::{
    booking::Booking,
    promotion::Promotion,
    seat::{Seat, Seats},
    showtime::Showtime,
};
