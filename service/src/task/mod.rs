//! Background [`Task`]s definitions.

pub mod archive_past_showtimes;
mod background;
pub mod expire_pending_bookings;

pub use common::Handler as Task;

pub use self::{
    archive_past_showtimes::ArchivePastShowtimes, background::Background,
    expire_pending_bookings::ExpirePendingBookings,
};
