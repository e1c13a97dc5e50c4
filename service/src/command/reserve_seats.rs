//! [`Command`] for reserving [`Seats`] of a [`Showtime`].

use common::{
    operations::{By, Claim, Insert, Release, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        booking, promotion, showtime, user, Booking, Promotion, Seats,
        Showtime,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for reserving [`Seats`] of a [`Showtime`] on behalf of a
/// single booking attempt.
///
/// On success, a pending [`Booking`] holding the claimed [`Seats`] is
/// created. Every failure past the seat claim releases the claim before
/// returning: no partial state survives any exit path.
#[derive(Clone, Debug)]
pub struct ReserveSeats {
    /// ID of the user making the reservation.
    pub user_id: user::Id,

    /// ID of the [`Showtime`] to reserve [`Seats`] of.
    pub showtime_id: showtime::Id,

    /// [`Seats`] to reserve.
    pub seats: Seats,

    /// Coupon [`promotion::Code`] to apply, if any.
    pub coupon_code: Option<promotion::Code>,
}

impl<Db> Command<ReserveSeats> for Service<Db>
where
    Db: Database<
            Claim<By<Showtime, showtime::SeatClaim>>,
            Ok = Result<Showtime, showtime::ClaimError>,
            Err = Traced<database::Error>,
        > + Database<
            Release<By<Showtime, showtime::SeatRelease>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Promotion>, promotion::Code>>,
            Ok = Option<Promotion>,
            Err = Traced<database::Error>,
        > + Database<Insert<Booking>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: ReserveSeats) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ReserveSeats {
            user_id,
            showtime_id,
            seats,
            coupon_code,
        } = cmd;

        if seats.is_empty() {
            return Err(tracerr::new!(E::NoSeatsRequested));
        }

        let now = DateTime::now();

        let claimed = self
            .database()
            .execute(Claim(By::new(showtime::SeatClaim {
                showtime_id,
                seats: seats.clone(),
                at: now,
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let showtime = match claimed {
            Ok(showtime) => showtime,
            Err(showtime::ClaimError::NotFound(id)) => {
                return Err(tracerr::new!(E::ShowtimeNotFound(id)));
            }
            Err(showtime::ClaimError::Unavailable { id, status }) => {
                return Err(tracerr::new!(E::ShowtimeUnavailable {
                    id,
                    status,
                }));
            }
            Err(showtime::ClaimError::AlreadyStarted(id)) => {
                return Err(tracerr::new!(E::ShowtimeAlreadyStarted(id)));
            }
            Err(showtime::ClaimError::SeatsUnknown(seats)) => {
                return Err(tracerr::new!(E::SeatsUnknown(seats)));
            }
            Err(showtime::ClaimError::SeatsTaken(seats)) => {
                return Err(tracerr::new!(E::SeatsAlreadyTaken(seats)));
            }
        };

        let gross = showtime.gross(&seats);

        let mut discount = None;
        if let Some(code) = coupon_code {
            let promotion = match self
                .database()
                .execute(Select(By::<Option<Promotion>, _>::new(code.clone())))
                .await
            {
                Ok(Some(promotion)) => promotion,
                Ok(None) => {
                    release_seats(self, showtime_id, seats)
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?;
                    return Err(tracerr::new!(E::CouponNotFound(code)));
                }
                Err(e) => {
                    release_seats(self, showtime_id, seats)
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?;
                    return Err(tracerr::map_from_and_wrap!(=> E)(e));
                }
            };

            let order = promotion::Order {
                amount: gross,
                seat_prices: showtime.seat_prices(&seats),
                movie_id: showtime.movie_id,
                cinema_id: showtime.cinema_id,
                at: now,
            };
            match promotion.apply(&order) {
                Ok(amount) => {
                    discount = Some(booking::Discount {
                        promotion_id: promotion.id,
                        amount,
                    });
                }
                Err(e) => {
                    // No orphaned claims survive a failed promotion check.
                    release_seats(self, showtime_id, seats)
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?;
                    return Err(tracerr::new!(E::InvalidCoupon(e)));
                }
            }
        }

        let total = discount.as_ref().map_or(gross, |d| {
            gross.saturating_sub(d.amount).expect("same currency")
        });

        let booking = Booking {
            id: booking::Id::new(),
            user_id,
            showtime_id,
            seats: seats.clone(),
            gross,
            discount,
            total,
            payment: None,
            code: None,
            created_at: now.coerce(),
            expires_at: (now + self.config().booking_hold).coerce(),
            confirmed_at: None,
            canceled_at: None,
            redeemed_at: None,
        };

        if let Err(e) = self.database().execute(Insert(booking.clone())).await
        {
            release_seats(self, showtime_id, seats)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            return Err(tracerr::map_from_and_wrap!(=> E)(e));
        }

        Ok(booking)
    }
}

/// Releases the claimed `seats` back to the [`Showtime`] as a compensation
/// of a failed reservation.
async fn release_seats<Db>(
    service: &Service<Db>,
    showtime_id: showtime::Id,
    seats: Seats,
) -> Result<(), Traced<database::Error>>
where
    Db: Database<
        Release<By<Showtime, showtime::SeatRelease>>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    service
        .database()
        .execute(Release(By::new(showtime::SeatRelease {
            showtime_id,
            seats,
        })))
        .await
        .map_err(tracerr::wrap!())
}

/// Error of [`ReserveSeats`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// No [`Seats`] were requested.
    #[display("no seats requested")]
    NoSeatsRequested,

    /// [`Showtime`] with the provided ID does not exist.
    #[display("`Showtime(id: {_0})` does not exist")]
    ShowtimeNotFound(#[error(not(source))] showtime::Id),

    /// [`Showtime`] is not open for booking.
    #[display("`Showtime(id: {id})` is not open for booking: {status}")]
    ShowtimeUnavailable {
        /// ID of the [`Showtime`].
        id: showtime::Id,

        /// Current [`showtime::Status`] of the [`Showtime`].
        status: showtime::Status,
    },

    /// [`Showtime`] has already started.
    #[display("`Showtime(id: {_0})` has already started")]
    ShowtimeAlreadyStarted(#[error(not(source))] showtime::Id),

    /// Some of the requested [`Seats`] don't belong to the hall.
    #[display("seats not part of the hall: {_0}")]
    SeatsUnknown(#[error(not(source))] Seats),

    /// Some of the requested [`Seats`] are already taken.
    #[display("seats already taken: {_0}")]
    SeatsAlreadyTaken(#[error(not(source))] Seats),

    /// No [`Promotion`] exists under the provided coupon code.
    #[display("`Promotion(code: {_0})` does not exist")]
    CouponNotFound(#[error(not(source))] promotion::Code),

    /// Coupon cannot be applied to this reservation.
    #[display("coupon cannot be applied: {_0}")]
    InvalidCoupon(promotion::ApplyError),
}

#[cfg(test)]
mod spec {
    use std::sync::Arc;

    use common::Percent;
    use tokio::sync::Barrier;

    use crate::{
        command::{Command as _, ReserveSeats},
        domain::{booking, promotion, user},
        query::{self, Query as _},
        test_support::{
            create_promotion, create_showtime, money, seats, service,
        },
    };

    use super::ExecutionError;

    fn reserve(
        showtime_id: crate::domain::showtime::Id,
        seat_ids: &[&str],
    ) -> ReserveSeats {
        ReserveSeats {
            user_id: user::Id::new(),
            showtime_id,
            seats: seats(seat_ids),
            coupon_code: None,
        }
    }

    #[tokio::test]
    async fn creates_a_pending_booking_holding_the_seats() {
        let (service, _bg) = service();

        let showtime = service
            .execute(create_showtime(&["A1", "A2", "B1"]))
            .await
            .unwrap();

        let booking = service
            .execute(reserve(showtime.id, &["A1", "B1"]))
            .await
            .unwrap();

        assert_eq!(
            booking.status(common::DateTime::now()),
            booking::Status::Pending,
        );
        assert_eq!(booking.gross, money("300000IDR"));
        assert_eq!(booking.total, money("300000IDR"));
        assert!(booking.code.is_none());

        let availability = service
            .execute(query::availability::OfShowtime(showtime.id))
            .await
            .unwrap();
        assert_eq!(availability.available, seats(&["A2"]));
        assert_eq!(availability.booked, seats(&["A1", "B1"]));
    }

    #[tokio::test]
    async fn overlapping_reservations_conflict_all_or_nothing() {
        let (service, _bg) = service();

        let showtime = service
            .execute(create_showtime(&["A1", "A2", "A3"]))
            .await
            .unwrap();

        let _first = service
            .execute(reserve(showtime.id, &["A1"]))
            .await
            .unwrap();

        let err = service
            .execute(reserve(showtime.id, &["A1", "A2"]))
            .await
            .unwrap_err();
        let ExecutionError::SeatsAlreadyTaken(conflicting) = err.as_ref()
        else {
            panic!("expected `SeatsAlreadyTaken`, got: {err}");
        };
        assert_eq!(conflicting, &seats(&["A1"]));

        // The losing claim left no partial state behind.
        let availability = service
            .execute(query::availability::OfShowtime(showtime.id))
            .await
            .unwrap();
        assert_eq!(availability.available, seats(&["A2", "A3"]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_overlapping_reservations_have_one_winner() {
        let (service, _bg) = service();

        let showtime = service
            .execute(create_showtime(&["A1", "A2"]))
            .await
            .unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let mut tasks = Vec::new();
        for _ in 0..2 {
            let service = service.clone();
            let barrier = Arc::clone(&barrier);
            let showtime_id = showtime.id;
            tasks.push(tokio::spawn(async move {
                let _ = barrier.wait().await;
                service
                    .execute(reserve(showtime_id, &["A1"]))
                    .await
            }));
        }

        let mut won = 0;
        let mut lost = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => won += 1,
                Err(e) => {
                    assert!(matches!(
                        e.as_ref(),
                        ExecutionError::SeatsAlreadyTaken(_),
                    ));
                    lost += 1;
                }
            }
        }
        assert_eq!((won, lost), (1, 1));
    }

    #[tokio::test]
    async fn applies_a_percentage_coupon() {
        let (service, _bg) = service();

        let showtime = service
            .execute(create_showtime(&["A1", "A2"]))
            .await
            .unwrap();
        let _promotion = service
            .execute(create_promotion(
                "WEEKEND20",
                promotion::Benefit::Percentage {
                    percent: Percent::new(20.into()).unwrap(),
                    cap: Some(money("50000IDR")),
                },
            ))
            .await
            .unwrap();

        let mut cmd = reserve(showtime.id, &["A1", "A2"]);
        cmd.coupon_code = Some("WEEKEND20".parse().unwrap());
        let booking = service.execute(cmd).await.unwrap();

        assert_eq!(booking.gross, money("300000IDR"));
        assert_eq!(
            booking.discount.unwrap().amount,
            money("50000IDR"),
        );
        assert_eq!(booking.total, money("250000IDR"));
    }

    #[tokio::test]
    async fn rejected_coupon_releases_the_claim() {
        let (service, _bg) = service();

        let showtime = service
            .execute(create_showtime(&["A1", "A2"]))
            .await
            .unwrap();
        let mut promo = create_promotion(
            "BIGSPENDER",
            promotion::Benefit::FixedAmount(money("10000IDR")),
        );
        promo.min_purchase = Some(money("1000000IDR"));
        let _promotion = service.execute(promo).await.unwrap();

        let mut cmd = reserve(showtime.id, &["A1"]);
        cmd.coupon_code = Some("BIGSPENDER".parse().unwrap());
        let err = service.execute(cmd).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidCoupon(
                promotion::ApplyError::BelowMinPurchase(_),
            ),
        ));

        // The seats were released before the error propagated.
        let availability = service
            .execute(query::availability::OfShowtime(showtime.id))
            .await
            .unwrap();
        assert_eq!(availability.available, seats(&["A1", "A2"]));
        assert!(availability.booked.is_empty());
    }

    #[tokio::test]
    async fn unknown_coupon_releases_the_claim() {
        let (service, _bg) = service();

        let showtime =
            service.execute(create_showtime(&["A1"])).await.unwrap();

        let mut cmd = reserve(showtime.id, &["A1"]);
        cmd.coupon_code = Some("NOSUCHCODE".parse().unwrap());
        let err = service.execute(cmd).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::CouponNotFound(_)));

        let availability = service
            .execute(query::availability::OfShowtime(showtime.id))
            .await
            .unwrap();
        assert_eq!(availability.available, seats(&["A1"]));
    }

    #[tokio::test]
    async fn rejects_an_empty_seat_list() {
        let (service, _bg) = service();

        let showtime =
            service.execute(create_showtime(&["A1"])).await.unwrap();

        let err = service
            .execute(reserve(showtime.id, &[]))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NoSeatsRequested));
    }

    #[tokio::test]
    async fn rejects_seats_outside_the_hall() {
        let (service, _bg) = service();

        let showtime = service
            .execute(create_showtime(&["A1", "A2"]))
            .await
            .unwrap();

        let err = service
            .execute(reserve(showtime.id, &["A1", "Z9"]))
            .await
            .unwrap_err();
        let ExecutionError::SeatsUnknown(unknown) = err.as_ref() else {
            panic!("expected `SeatsUnknown`, got: {err}");
        };
        assert_eq!(unknown, &seats(&["Z9"]));
    }

    #[tokio::test]
    async fn rejects_a_canceled_showtime() {
        let (service, _bg) = service();

        let showtime =
            service.execute(create_showtime(&["A1"])).await.unwrap();
        let _canceled = service
            .execute(crate::command::CancelShowtime {
                showtime_id: showtime.id,
                initiator_role: user::Role::Manager,
            })
            .await
            .unwrap();

        let err = service
            .execute(reserve(showtime.id, &["A1"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::ShowtimeUnavailable { .. },
        ));
    }

    #[tokio::test]
    async fn sold_out_is_derived_from_the_last_claim() {
        let (service, _bg) = service();

        let showtime = service
            .execute(create_showtime(&["A1", "A2"]))
            .await
            .unwrap();

        let _booking = service
            .execute(reserve(showtime.id, &["A1", "A2"]))
            .await
            .unwrap();

        let sold_out = service
            .execute(query::showtime::ById::by(showtime.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            sold_out.status(),
            crate::domain::showtime::Status::SoldOut,
        );
    }
}
