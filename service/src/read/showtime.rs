//! [`Showtime`] read model definitions.

use crate::domain::Seats;
#[cfg(doc)]
use crate::domain::Showtime;

/// Seat availability snapshot of a [`Showtime`].
#[derive(Clone, Debug)]
pub struct Availability {
    /// [`Seats`] still free to claim.
    pub available: Seats,

    /// [`Seats`] held or booked.
    pub booked: Seats,
}
