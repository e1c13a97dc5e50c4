//! [`Booking`] operations of the [`Memory`] database.

use common::operations::{By, Cancel, Confirm, Insert, Redeem, Select};
use dashmap::mapref::entry::Entry;
use tracerr::Traced;

use crate::{
    domain::{booking, Booking},
    infra::database::{
        self,
        memory::{Error, Memory},
        Database,
    },
    read::booking::Expired,
};

impl Database<Insert<Booking>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(booking): Insert<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        match self.0.bookings.entry(booking.id) {
            Entry::Vacant(e) => {
                let _ = e.insert(booking);
                Ok(())
            }
            Entry::Occupied(_) => Err(tracerr::new!(database::Error::from(
                Error::AlreadyExists
            ))),
        }
    }
}

impl Database<Select<By<Option<Booking>, booking::Id>>> for Memory {
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .0
            .bookings
            .get(&by.into_inner())
            .map(|b| b.value().clone()))
    }
}

impl Database<Select<By<Option<Booking>, booking::Code>>> for Memory {
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, booking::Code>>,
    ) -> Result<Self::Ok, Self::Err> {
        // The ID is copied out before reading the bookings map, so no two
        // shard locks are ever held at once here.
        let Some(id) = self.0.booking_codes.get(&by.into_inner()).map(|id| *id)
        else {
            return Ok(None);
        };
        Ok(self.0.bookings.get(&id).map(|b| b.value().clone()))
    }
}

impl Database<Select<By<Vec<Expired<Booking>>, booking::ExpirationDateTime>>>
    for Memory
{
    type Ok = Vec<Expired<Booking>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<Expired<Booking>>, booking::ExpirationDateTime>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let deadline = by.into_inner();
        Ok(self
            .0
            .bookings
            .iter()
            .filter(|b| {
                b.canceled_at.is_none()
                    && b.confirmed_at.is_none()
                    && b.expires_at <= deadline
            })
            .map(|b| Expired(b.value().clone()))
            .collect())
    }
}

impl Database<Confirm<By<Booking, booking::Confirmation>>> for Memory {
    type Ok = Result<Booking, booking::TransitionError>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Confirm(by): Confirm<By<Booking, booking::Confirmation>>,
    ) -> Result<Self::Ok, Self::Err> {
        use booking::TransitionError as E;

        let booking::Confirmation {
            id,
            payment,
            code,
            at,
        } = by.into_inner();

        let Some(mut entry) = self.0.bookings.get_mut(&id) else {
            return Ok(Err(E::NotFound(id)));
        };
        let booking = entry.value_mut();

        match booking.status(at) {
            booking::Status::Pending => {}
            s @ (booking::Status::Confirmed | booking::Status::Canceled) => {
                return Ok(Err(E::Invalid { id, from: s }));
            }
        }

        // Register the unique code index before mutating the booking.
        match self.0.booking_codes.entry(code.clone()) {
            Entry::Vacant(e) => {
                let _ = e.insert(id);
            }
            Entry::Occupied(_) => {
                return Err(tracerr::new!(database::Error::from(
                    Error::AlreadyExists
                )));
            }
        }

        booking.confirmed_at = Some(at.coerce());
        booking.payment = Some(payment);
        booking.code = Some(code);

        Ok(Ok(booking.clone()))
    }
}

impl Database<Cancel<By<Booking, booking::Cancellation>>> for Memory {
    type Ok = Result<Booking, booking::TransitionError>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Cancel(by): Cancel<By<Booking, booking::Cancellation>>,
    ) -> Result<Self::Ok, Self::Err> {
        use booking::TransitionError as E;

        let booking::Cancellation {
            id,
            include_confirmed,
            at,
        } = by.into_inner();

        let Some(mut entry) = self.0.bookings.get_mut(&id) else {
            return Ok(Err(E::NotFound(id)));
        };
        let booking = entry.value_mut();

        if booking.canceled_at.is_some() {
            return Ok(Err(E::Invalid {
                id,
                from: booking::Status::Canceled,
            }));
        }
        if booking.confirmed_at.is_some() && !include_confirmed {
            return Ok(Err(E::Invalid {
                id,
                from: booking::Status::Confirmed,
            }));
        }

        // The prior state is returned, so the caller knows which
        // compensations (seat release, coupon refund) to run.
        let prior = booking.clone();
        booking.canceled_at = Some(at.coerce());

        Ok(Ok(prior))
    }
}

impl Database<Redeem<By<Booking, booking::Redemption>>> for Memory {
    type Ok = Result<Booking, booking::RedemptionError>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Redeem(by): Redeem<By<Booking, booking::Redemption>>,
    ) -> Result<Self::Ok, Self::Err> {
        use booking::RedemptionError as E;

        let booking::Redemption { id, at } = by.into_inner();

        let Some(mut entry) = self.0.bookings.get_mut(&id) else {
            return Ok(Err(E::NotFound(id)));
        };
        let booking = entry.value_mut();

        match booking.status(at) {
            booking::Status::Confirmed => {}
            s @ (booking::Status::Pending | booking::Status::Canceled) => {
                return Ok(Err(E::NotConfirmed { id, from: s }));
            }
        }
        if booking.redeemed_at.is_some() {
            return Ok(Err(E::AlreadyRedeemed(id)));
        }

        booking.redeemed_at = Some(at.coerce());

        Ok(Ok(booking.clone()))
    }
}
