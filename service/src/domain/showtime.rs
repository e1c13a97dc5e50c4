//! [`Showtime`] definitions.

use std::collections::HashMap;

use common::{define_kind, unit, DateTime, DateTimeOf, Money};
use derive_more::{Display, Error, From, FromStr, Into};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{cinema, movie, seat, Seats};
#[cfg(doc)]
use crate::domain::{Booking, Seat};

/// Screening of a movie in a cinema hall.
///
/// The `available_seats` and `booked_seats` sets are disjoint and their union
/// is the hall's full seat set at all times. They are mutated only through
/// the atomic claim/release operations of the storage.
#[derive(Clone, Debug)]
pub struct Showtime {
    /// ID of this [`Showtime`].
    pub id: Id,

    /// ID of the movie being screened.
    pub movie_id: movie::Id,

    /// ID of the cinema this [`Showtime`] takes place in.
    pub cinema_id: cinema::Id,

    /// [`DateTime`] when this [`Showtime`] starts.
    pub starts_at: StartDateTime,

    /// [`DateTime`] when this [`Showtime`] ends.
    pub ends_at: EndDateTime,

    /// Ticket [`Prices`] of this [`Showtime`], per [`seat::Class`].
    pub prices: Prices,

    /// [`seat::Class`] of each [`seat::Row`] of the hall.
    ///
    /// Rows not mentioned here are [`seat::Class::Regular`].
    pub classes: HashMap<seat::Row, seat::Class>,

    /// [`Seat`]s of the hall still free to claim.
    pub available_seats: Seats,

    /// [`Seat`]s of the hall held or booked by [`Booking`]s.
    pub booked_seats: Seats,

    /// [`DateTime`] when this [`Showtime`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Showtime`] was canceled, if it was.
    pub canceled_at: Option<CancellationDateTime>,
}

impl Showtime {
    /// Returns [`Status`] of this [`Showtime`].
    #[must_use]
    pub fn status(&self) -> Status {
        use Status as S;

        if self.canceled_at.is_some() {
            return S::Canceled;
        }

        if self.available_seats.is_empty() {
            return S::SoldOut;
        }

        S::Open
    }

    /// Returns whether this [`Showtime`] has started at the provided moment.
    #[must_use]
    pub fn has_started(&self, at: DateTime) -> bool {
        at >= self.starts_at.coerce()
    }

    /// Returns the [`seat::Class`] of the provided [`Seat`].
    #[must_use]
    pub fn class_of(&self, seat: seat::Seat) -> seat::Class {
        self.classes
            .get(&seat.row())
            .copied()
            .unwrap_or(seat::Class::Regular)
    }

    /// Returns the ticket price of the provided [`Seat`].
    #[must_use]
    pub fn price_of(&self, seat: seat::Seat) -> Money {
        self.prices.of(self.class_of(seat))
    }

    /// Returns the gross [`Money`] amount of booking all the provided
    /// [`Seats`].
    #[must_use]
    pub fn gross(&self, seats: &Seats) -> Money {
        let amount: Decimal =
            seats.iter().map(|s| self.price_of(*s).amount).sum();
        Money {
            amount,
            currency: self.prices.currency(),
        }
    }

    /// Returns the ticket prices of each of the provided [`Seats`].
    #[must_use]
    pub fn seat_prices(&self, seats: &Seats) -> Vec<Money> {
        seats.iter().map(|s| self.price_of(*s)).collect()
    }
}

/// ID of a [`Showtime`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Status of a [`Showtime`], derived from its state."]
    enum Status {
        #[doc = "The [`Showtime`] is open for booking."]
        Open = 1,

        #[doc = "The [`Showtime`] was canceled."]
        Canceled = 2,

        #[doc = "All seats of the [`Showtime`] are booked."]
        SoldOut = 3,
    }
}

/// Ticket [`Money`] prices of a [`Showtime`], per [`seat::Class`].
///
/// All the prices are denominated in a single currency.
#[derive(Clone, Copy, Debug)]
pub struct Prices {
    /// Price of a [`seat::Class::Regular`] seat.
    regular: Money,

    /// Price of a [`seat::Class::Vip`] seat, if such seats are sold
    /// separately.
    vip: Option<Money>,

    /// Price of a [`seat::Class::Student`] seat, if such seats are sold
    /// separately.
    student: Option<Money>,
}

impl Prices {
    /// Creates new [`Prices`] if all the provided prices share the same
    /// currency.
    #[must_use]
    pub fn new(
        regular: Money,
        vip: Option<Money>,
        student: Option<Money>,
    ) -> Option<Self> {
        let same_currency = [vip, student]
            .into_iter()
            .flatten()
            .all(|m| m.currency == regular.currency);
        same_currency.then_some(Self {
            regular,
            vip,
            student,
        })
    }

    /// Returns the price of the provided [`seat::Class`].
    ///
    /// Classes without a dedicated price cost as
    /// [`seat::Class::Regular`] ones.
    #[must_use]
    pub fn of(&self, class: seat::Class) -> Money {
        match class {
            seat::Class::Regular => self.regular,
            seat::Class::Vip => self.vip.unwrap_or(self.regular),
            seat::Class::Student => self.student.unwrap_or(self.regular),
        }
    }

    /// Returns the currency all these [`Prices`] are denominated in.
    #[must_use]
    pub fn currency(&self) -> common::money::Currency {
        self.regular.currency
    }
}

/// Request to atomically claim [`Seats`] of a [`Showtime`] on behalf of a
/// single booking attempt.
#[derive(Clone, Debug)]
pub struct SeatClaim {
    /// ID of the [`Showtime`] to claim the [`Seats`] of.
    pub showtime_id: Id,

    /// [`Seats`] to claim.
    pub seats: Seats,

    /// [`DateTime`] the claim is made at.
    pub at: DateTime,
}

/// Request to release previously claimed [`Seats`] of a [`Showtime`].
///
/// Releasing is idempotent: already available or unknown [`Seats`] (or a
/// missing [`Showtime`]) are not an error.
#[derive(Clone, Debug)]
pub struct SeatRelease {
    /// ID of the [`Showtime`] to release the [`Seats`] of.
    pub showtime_id: Id,

    /// [`Seats`] to release.
    pub seats: Seats,
}

/// Rejection of a [`SeatClaim`].
#[derive(Clone, Debug, Display, Error)]
pub enum ClaimError {
    /// [`Showtime`] with the provided ID does not exist.
    #[display("`Showtime(id: {_0})` does not exist")]
    NotFound(#[error(not(source))] Id),

    /// [`Showtime`] is not open for booking.
    #[display("`Showtime(id: {id})` is not open for booking: {status}")]
    Unavailable {
        /// ID of the [`Showtime`].
        id: Id,

        /// Current [`Status`] of the [`Showtime`].
        status: Status,
    },

    /// [`Showtime`] has already started.
    #[display("`Showtime(id: {_0})` has already started")]
    AlreadyStarted(#[error(not(source))] Id),

    /// Some of the requested [`Seats`] don't belong to the hall.
    #[display("seats not part of the hall: {_0}")]
    SeatsUnknown(#[error(not(source))] Seats),

    /// Some of the requested [`Seats`] are already taken.
    #[display("seats already taken: {_0}")]
    SeatsTaken(#[error(not(source))] Seats),
}

/// Request to atomically cancel a [`Showtime`].
#[derive(Clone, Copy, Debug)]
pub struct Cancellation {
    /// ID of the [`Showtime`] to cancel.
    pub id: Id,

    /// [`DateTime`] the cancellation happens at.
    pub at: DateTime,
}

/// Rejection of a [`Showtime`] [`Cancellation`].
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum CancelError {
    /// [`Showtime`] with the provided ID does not exist.
    #[display("`Showtime(id: {_0})` does not exist")]
    NotFound(#[error(not(source))] Id),

    /// [`Showtime`] is already canceled.
    #[display("`Showtime(id: {_0})` is already canceled")]
    AlreadyCanceled(#[error(not(source))] Id),
}

/// [`DateTime`] when a [`Showtime`] starts.
pub type StartDateTime = DateTimeOf<(Showtime, unit::Start)>;

/// [`DateTime`] when a [`Showtime`] ends.
pub type EndDateTime = DateTimeOf<(Showtime, unit::End)>;

/// [`DateTime`] when a [`Showtime`] was created.
pub type CreationDateTime = DateTimeOf<(Showtime, unit::Creation)>;

/// [`DateTime`] when a [`Showtime`] was canceled.
pub type CancellationDateTime = DateTimeOf<(Showtime, unit::Cancellation)>;

#[cfg(test)]
mod spec {
    use std::collections::HashMap;

    use common::{DateTime, Money};

    use crate::domain::{cinema, movie, seat, Seats};

    use super::{Id, Prices, Showtime, Status};

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn seats(ids: &[&str]) -> Seats {
        ids.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn showtime(available: Seats, booked: Seats) -> Showtime {
        let now = DateTime::now();
        Showtime {
            id: Id::new(),
            movie_id: movie::Id::new(),
            cinema_id: cinema::Id::new(),
            starts_at: (now + std::time::Duration::from_secs(3600)).coerce(),
            ends_at: (now + std::time::Duration::from_secs(3600 * 3)).coerce(),
            prices: Prices::new(
                money("50000IDR"),
                Some(money("100000IDR")),
                Some(money("35000IDR")),
            )
            .unwrap(),
            classes: HashMap::from([(
                "J1".parse::<seat::Seat>().unwrap().row(),
                seat::Class::Vip,
            )]),
            available_seats: available,
            booked_seats: booked,
            created_at: now.coerce(),
            canceled_at: None,
        }
    }

    #[test]
    fn status_is_derived() {
        let mut st = showtime(seats(&["A1", "A2"]), Seats::new());
        assert_eq!(st.status(), Status::Open);

        st.available_seats = Seats::new();
        st.booked_seats = seats(&["A1", "A2"]);
        assert_eq!(st.status(), Status::SoldOut);

        st.canceled_at = Some(DateTime::now().coerce());
        assert_eq!(st.status(), Status::Canceled);
    }

    #[test]
    fn prices_are_keyed_by_row_class() {
        let st = showtime(seats(&["A1", "J1"]), Seats::new());

        assert_eq!(
            st.price_of("A1".parse().unwrap()),
            money("50000IDR"),
        );
        assert_eq!(
            st.price_of("J1".parse().unwrap()),
            money("100000IDR"),
        );

        assert_eq!(st.gross(&seats(&["A1", "J1"])), money("150000IDR"));
    }

    #[test]
    fn prices_require_single_currency() {
        assert!(Prices::new(
            money("50000IDR"),
            Some(money("10USD")),
            None,
        )
        .is_none());
    }
}
