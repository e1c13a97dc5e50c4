//! [`Command`] definition.

pub mod cancel_booking;
pub mod cancel_showtime;
pub mod confirm_booking;
pub mod create_promotion;
pub mod create_showtime;
pub mod redeem_booking;
pub mod reserve_seats;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    cancel_booking::CancelBooking, cancel_showtime::CancelShowtime,
    confirm_booking::ConfirmBooking, create_promotion::CreatePromotion,
    create_showtime::CreateShowtime, redeem_booking::RedeemBooking,
    reserve_seats::ReserveSeats,
};
