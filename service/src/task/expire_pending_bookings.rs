//! [`ExpirePendingBookings`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::{
    operations::{By, Cancel, Perform, Release, Select, Start},
    DateTime,
};
use futures::future;
use serde::Deserialize;
use smart_default::SmartDefault;
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{booking, showtime, Booking, Showtime},
    infra::{database, Database},
    read::booking::Expired,
    Service,
};

use super::Task;

/// Configuration for [`ExpirePendingBookings`] [`Task`].
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Config {
    /// Interval between expiry sweeps.
    #[default(time::Duration::from_secs(60))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,
}

/// [`Task`] canceling pending [`Booking`]s past their hold window and
/// releasing their seats.
///
/// Derived statuses make expiry visible lazily on every read (an expired
/// pending [`Booking`] can never confirm); this sweep performs the physical
/// compensation, so abandoned carts don't hold seats forever.
#[derive(Clone, Copy, Debug)]
pub struct ExpirePendingBookings<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<ExpirePendingBookings<Self>, Config>>> for Service<Db>
where
    ExpirePendingBookings<Service<Db>>:
        Task<Perform<()>, Ok = (), Err: Error> + Send + Sync + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ExpirePendingBookings<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = ExpirePendingBookings {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::ExpirePendingBookings` failed: {e}");
            });
        }
    }
}

impl<Db> Task<Perform<()>> for ExpirePendingBookings<Service<Db>>
where
    Db: Database<
            Select<By<Vec<Expired<Booking>>, booking::ExpirationDateTime>>,
            Ok = Vec<Expired<Booking>>,
            Err = Traced<database::Error>,
        > + Database<
            Cancel<By<Booking, booking::Cancellation>>,
            Ok = Result<Booking, booking::TransitionError>,
            Err = Traced<database::Error>,
        > + Database<
            Release<By<Showtime, showtime::SeatRelease>>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
{
    type Ok = ();
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let now = DateTime::now();

        let expired = self
            .service
            .database()
            .execute(Select(By::<Vec<Expired<Booking>>, _>::new(
                now.coerce(),
            )))
            .await
            .map_err(tracerr::wrap!())?;

        let results = future::join_all(
            expired
                .into_iter()
                .map(|Expired(booking)| sweep(&self.service, booking, now)),
        )
        .await;

        for result in results {
            result?;
        }
        Ok(())
    }
}

/// Cancels a single expired [`Booking`] and releases its seats.
async fn sweep<Db>(
    service: &Service<Db>,
    booking: Booking,
    at: DateTime,
) -> Result<(), Traced<database::Error>>
where
    Db: Database<
            Cancel<By<Booking, booking::Cancellation>>,
            Ok = Result<Booking, booking::TransitionError>,
            Err = Traced<database::Error>,
        > + Database<
            Release<By<Showtime, showtime::SeatRelease>>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
{
    let outcome = service
        .database()
        .execute(Cancel(By::new(booking::Cancellation {
            id: booking.id,
            include_confirmed: false,
            at,
        })))
        .await
        .map_err(tracerr::wrap!())?;

    // A lost race means an explicit cancellation got there first and its
    // compensations already ran.
    if outcome.is_err() {
        return Ok(());
    }

    service
        .database()
        .execute(Release(By::new(showtime::SeatRelease {
            showtime_id: booking.showtime_id,
            seats: booking.seats,
        })))
        .await
        .map_err(tracerr::wrap!())
}

/// Error of [`ExpirePendingBookings`] execution.
pub type ExecutionError = Traced<database::Error>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{operations::Perform, DateTime};

    use crate::{
        command::{Command as _, ReserveSeats},
        domain::{booking, user},
        query::{self, Query as _},
        task::Task as _,
        test_support::{create_showtime, seats, service_with},
        Config,
    };

    use super::ExpirePendingBookings;

    #[tokio::test]
    async fn sweeps_expired_bookings_and_releases_their_seats() {
        let (service, _bg) = service_with(Config {
            booking_hold: Duration::ZERO,
            ..Config::default()
        });

        let showtime = service
            .execute(create_showtime(&["A1", "A2"]))
            .await
            .unwrap();
        let booking = service
            .execute(ReserveSeats {
                user_id: user::Id::new(),
                showtime_id: showtime.id,
                seats: seats(&["A1", "A2"]),
                coupon_code: None,
            })
            .await
            .unwrap();

        // The booking reads as canceled lazily even before the sweep runs,
        // but its seats are still physically held.
        assert_eq!(
            booking.status(DateTime::now()),
            booking::Status::Canceled,
        );
        let held = service
            .execute(query::availability::OfShowtime(showtime.id))
            .await
            .unwrap();
        assert!(held.available.is_empty());

        let task = ExpirePendingBookings {
            config: service.config().expire_pending_bookings,
            service: service.clone(),
        };
        task.execute(Perform(())).await.unwrap();

        // The seats reappeared without any explicit client action.
        let released = service
            .execute(query::availability::OfShowtime(showtime.id))
            .await
            .unwrap();
        assert_eq!(released.available, seats(&["A1", "A2"]));
        assert!(released.booked.is_empty());

        let swept = service
            .execute(query::booking::ById::by(booking.id))
            .await
            .unwrap()
            .unwrap();
        assert!(swept.canceled_at.is_some());
    }

    #[tokio::test]
    async fn leaves_live_bookings_alone() {
        let (service, _bg) = service_with(Config::default());

        let showtime =
            service.execute(create_showtime(&["A1"])).await.unwrap();
        let _booking = service
            .execute(ReserveSeats {
                user_id: user::Id::new(),
                showtime_id: showtime.id,
                seats: seats(&["A1"]),
                coupon_code: None,
            })
            .await
            .unwrap();

        let task = ExpirePendingBookings {
            config: service.config().expire_pending_bookings,
            service: service.clone(),
        };
        task.execute(Perform(())).await.unwrap();

        let availability = service
            .execute(query::availability::OfShowtime(showtime.id))
            .await
            .unwrap();
        assert_eq!(availability.booked, seats(&["A1"]));
    }
}
