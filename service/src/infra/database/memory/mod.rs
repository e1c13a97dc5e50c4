//! In-memory [`Database`] implementation.
//!
//! Every entity family lives in a concurrent map keyed by its ID, and every
//! mutating operation performs its check-and-set under the map's per-key
//! shard lock: validation and mutation are a single atomic step, partitioned
//! by entity ID rather than guarded by a global lock.
//!
//! Code indexes are only ever touched while holding the owning entity's
//! shard lock, and lookups by code copy the ID out before reading the entity
//! map, keeping the lock order consistent.

mod impls;

use std::sync::Arc;

use dashmap::DashMap;
use derive_more::{Display, Error as StdError};

use crate::domain::{booking, promotion, showtime, Booking, Promotion, Showtime};
#[cfg(doc)]
use crate::infra::Database;

/// In-memory [`Database`].
///
/// Suitable for tests and single-process deployments: the data doesn't
/// survive a process restart.
#[derive(Clone, Debug, Default)]
pub struct Memory(Arc<Inner>);

/// Inner state of a [`Memory`] database.
#[derive(Debug, Default)]
struct Inner {
    /// [`Showtime`]s by their IDs.
    showtimes: DashMap<showtime::Id, Showtime>,

    /// [`Booking`]s by their IDs.
    bookings: DashMap<booking::Id, Booking>,

    /// [`booking::Code`] index of confirmed [`Booking`]s.
    booking_codes: DashMap<booking::Code, booking::Id>,

    /// [`Promotion`]s by their IDs.
    promotions: DashMap<promotion::Id, Promotion>,

    /// [`promotion::Code`] index of [`Promotion`]s.
    promotion_codes: DashMap<promotion::Code, promotion::Id>,
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Error of a [`Memory`] database operation.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Value under the same key exists already.
    #[display("value under the same key exists already")]
    AlreadyExists,
}
