//! [`Showtime`] operations of the [`Memory`] database.

use common::operations::{By, Cancel, Claim, Delete, Insert, Release, Select};
use dashmap::mapref::entry::Entry;
use tracerr::Traced;

use crate::{
    domain::{showtime, Seats, Showtime},
    infra::database::{
        self,
        memory::{Error, Memory},
        Database,
    },
};

impl Database<Insert<Showtime>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(showtime): Insert<Showtime>,
    ) -> Result<Self::Ok, Self::Err> {
        match self.0.showtimes.entry(showtime.id) {
            Entry::Vacant(e) => {
                let _ = e.insert(showtime);
                Ok(())
            }
            Entry::Occupied(_) => Err(tracerr::new!(database::Error::from(
                Error::AlreadyExists
            ))),
        }
    }
}

impl Database<Select<By<Option<Showtime>, showtime::Id>>> for Memory {
    type Ok = Option<Showtime>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Showtime>, showtime::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.0.showtimes.get(&by.into_inner()).map(|s| s.value().clone()))
    }
}

impl Database<Claim<By<Showtime, showtime::SeatClaim>>> for Memory {
    type Ok = Result<Showtime, showtime::ClaimError>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Claim(by): Claim<By<Showtime, showtime::SeatClaim>>,
    ) -> Result<Self::Ok, Self::Err> {
        use showtime::ClaimError as E;

        let showtime::SeatClaim {
            showtime_id,
            seats,
            at,
        } = by.into_inner();

        let Some(mut entry) = self.0.showtimes.get_mut(&showtime_id) else {
            return Ok(Err(E::NotFound(showtime_id)));
        };
        let showtime = entry.value_mut();

        match showtime.status() {
            showtime::Status::Open => {}
            s @ (showtime::Status::Canceled | showtime::Status::SoldOut) => {
                return Ok(Err(E::Unavailable {
                    id: showtime_id,
                    status: s,
                }));
            }
        }
        if showtime.has_started(at) {
            return Ok(Err(E::AlreadyStarted(showtime_id)));
        }

        let unknown: Seats = seats
            .iter()
            .copied()
            .filter(|s| {
                !showtime.available_seats.contains(s)
                    && !showtime.booked_seats.contains(s)
            })
            .collect();
        if !unknown.is_empty() {
            return Ok(Err(E::SeatsUnknown(unknown)));
        }

        let taken: Seats = seats
            .iter()
            .copied()
            .filter(|s| showtime.booked_seats.contains(s))
            .collect();
        if !taken.is_empty() {
            return Ok(Err(E::SeatsTaken(taken)));
        }

        // All the requested seats are available: move them in one go, so no
        // partial claim is ever observable.
        for seat in &seats {
            let _ = showtime.available_seats.remove(seat);
            let _ = showtime.booked_seats.insert(*seat);
        }

        Ok(Ok(showtime.clone()))
    }
}

impl Database<Release<By<Showtime, showtime::SeatRelease>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Release(by): Release<By<Showtime, showtime::SeatRelease>>,
    ) -> Result<Self::Ok, Self::Err> {
        let showtime::SeatRelease { showtime_id, seats } = by.into_inner();

        // Releasing seats of a missing showtime (e.g. an archived one) is a
        // no-op.
        let Some(mut entry) = self.0.showtimes.get_mut(&showtime_id) else {
            return Ok(());
        };
        let showtime = entry.value_mut();

        for seat in &seats {
            if showtime.booked_seats.remove(seat) {
                let _ = showtime.available_seats.insert(*seat);
            }
        }

        Ok(())
    }
}

impl Database<Cancel<By<Showtime, showtime::Cancellation>>> for Memory {
    type Ok = Result<Showtime, showtime::CancelError>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Cancel(by): Cancel<By<Showtime, showtime::Cancellation>>,
    ) -> Result<Self::Ok, Self::Err> {
        use showtime::CancelError as E;

        let showtime::Cancellation { id, at } = by.into_inner();

        let Some(mut entry) = self.0.showtimes.get_mut(&id) else {
            return Ok(Err(E::NotFound(id)));
        };
        let showtime = entry.value_mut();

        if showtime.canceled_at.is_some() {
            return Ok(Err(E::AlreadyCanceled(id)));
        }

        showtime.canceled_at = Some(at.coerce());

        Ok(Ok(showtime.clone()))
    }
}

impl Database<Delete<By<Showtime, showtime::EndDateTime>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Showtime, showtime::EndDateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let deadline = by.into_inner();
        self.0.showtimes.retain(|_, s| s.ends_at > deadline);
        Ok(())
    }
}
