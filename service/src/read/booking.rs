//! [`Booking`] read model definitions.

use crate::domain::{booking, Booking, Showtime};

/// Wrapper around a pending [`Booking`] whose hold window has passed.
#[derive(Clone, Debug)]
pub struct Expired<T>(pub T);

/// Result of verifying a [`Booking`], e.g. by venue staff scanning tickets.
#[derive(Clone, Debug)]
pub struct Verification {
    /// The verified [`Booking`] itself, including its exact seats.
    pub booking: Booking,

    /// [`Showtime`] the [`Booking`] is for, unless already archived.
    pub showtime: Option<Showtime>,

    /// Current [`booking::Status`] of the [`Booking`].
    pub status: booking::Status,

    /// Whether the [`Booking`] was already redeemed at the venue.
    pub used: bool,
}
