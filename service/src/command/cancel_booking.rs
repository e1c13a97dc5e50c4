//! [`Command`] for canceling a [`Booking`].

use common::{
    operations::{By, Cancel, Refund, Release, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{booking, promotion, showtime, user, Booking, Promotion, Showtime},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for canceling a [`Booking`].
///
/// A customer may cancel their own pending [`Booking`]; canceling a
/// confirmed one requires a staff role. The held seats are released back to
/// the [`Showtime`], and a coupon redeemed on confirmation is refunded.
#[derive(Clone, Copy, Debug)]
pub struct CancelBooking {
    /// ID of the [`Booking`] to cancel.
    pub booking_id: booking::Id,

    /// ID of the user canceling the [`Booking`].
    pub initiator_id: user::Id,

    /// [`user::Role`] of the user canceling the [`Booking`].
    pub initiator_role: user::Role,
}

impl<Db> Command<CancelBooking> for Service<Db>
where
    Db: Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<
            Cancel<By<Booking, booking::Cancellation>>,
            Ok = Result<Booking, booking::TransitionError>,
            Err = Traced<database::Error>,
        > + Database<
            Release<By<Showtime, showtime::SeatRelease>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Refund<By<Promotion, promotion::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CancelBooking) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelBooking {
            booking_id,
            initiator_id,
            initiator_role,
        } = cmd;

        let booking = self
            .database()
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotFound(booking_id))
            .map_err(tracerr::wrap!())?;

        let staff = initiator_role.is_staff();
        if !staff && booking.user_id != initiator_id {
            return Err(tracerr::new!(E::Forbidden(initiator_role)));
        }

        let outcome = self
            .database()
            .execute(Cancel(By::new(booking::Cancellation {
                id: booking.id,
                include_confirmed: staff,
                at: DateTime::now(),
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let prior = match outcome {
            Ok(prior) => prior,
            Err(booking::TransitionError::NotFound(id)) => {
                return Err(tracerr::new!(E::BookingNotFound(id)));
            }
            Err(booking::TransitionError::Invalid { id, from }) => {
                // A non-staff initiator hitting a confirmed booking is a
                // permission problem, not a state machine one.
                return Err(match from {
                    booking::Status::Confirmed if !staff => {
                        tracerr::new!(E::Forbidden(initiator_role))
                    }
                    booking::Status::Pending
                    | booking::Status::Confirmed
                    | booking::Status::Canceled => {
                        tracerr::new!(E::InvalidTransition { id, from })
                    }
                });
            }
        };

        // Compensations: free the held seats, then refund the coupon if it
        // was actually redeemed (the booking reached a confirmed state with
        // a discount).
        self.database()
            .execute(Release(By::new(showtime::SeatRelease {
                showtime_id: prior.showtime_id,
                seats: prior.seats.clone(),
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        if prior.confirmed_at.is_some() {
            if let Some(discount) = prior.discount {
                self.database()
                    .execute(Refund(By::<Promotion, _>::new(
                        discount.promotion_id,
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
            }
        }

        Ok(())
    }
}

/// Error of [`CancelBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Booking`] with the provided ID does not exist.
    #[display("`Booking(id: {_0})` does not exist")]
    BookingNotFound(#[error(not(source))] booking::Id),

    /// Initiator is not allowed to cancel this [`Booking`].
    #[display("`{_0}` is not allowed to cancel this booking")]
    Forbidden(#[error(not(source))] user::Role),

    /// [`Booking`] cannot transition into a canceled state.
    #[display("`Booking(id: {id})` cannot be canceled out of `{from}`")]
    InvalidTransition {
        /// ID of the [`Booking`].
        id: booking::Id,

        /// [`booking::Status`] the [`Booking`] is in.
        from: booking::Status,
    },
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            CancelBooking, Command as _, ConfirmBooking, ReserveSeats,
        },
        domain::{booking, promotion, user},
        query::{self, Query as _},
        test_support::{
            create_promotion, create_showtime, money, seats, service,
        },
    };

    use super::ExecutionError;

    #[tokio::test]
    async fn restores_availability_exactly() {
        let (service, _bg) = service();

        let showtime = service
            .execute(create_showtime(&["A1", "A2", "B1"]))
            .await
            .unwrap();
        let before = service
            .execute(query::availability::OfShowtime(showtime.id))
            .await
            .unwrap();

        let user_id = user::Id::new();
        let booking = service
            .execute(ReserveSeats {
                user_id,
                showtime_id: showtime.id,
                seats: seats(&["A1", "B1"]),
                coupon_code: None,
            })
            .await
            .unwrap();

        service
            .execute(CancelBooking {
                booking_id: booking.id,
                initiator_id: user_id,
                initiator_role: user::Role::Customer,
            })
            .await
            .unwrap();

        let after = service
            .execute(query::availability::OfShowtime(showtime.id))
            .await
            .unwrap();
        assert_eq!(after.available, before.available);
        assert_eq!(after.booked, before.booked);
    }

    #[tokio::test]
    async fn customers_cannot_cancel_others_bookings() {
        let (service, _bg) = service();

        let showtime =
            service.execute(create_showtime(&["A1"])).await.unwrap();
        let booking = service
            .execute(ReserveSeats {
                user_id: user::Id::new(),
                showtime_id: showtime.id,
                seats: seats(&["A1"]),
                coupon_code: None,
            })
            .await
            .unwrap();

        let err = service
            .execute(CancelBooking {
                booking_id: booking.id,
                initiator_id: user::Id::new(),
                initiator_role: user::Role::Customer,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Forbidden(_)));
    }

    #[tokio::test]
    async fn confirmed_cancellation_is_staff_only_and_refunds_the_coupon() {
        let (service, _bg) = service();

        let showtime = service
            .execute(create_showtime(&["A1", "A2"]))
            .await
            .unwrap();
        let promotion = service
            .execute(create_promotion(
                "PAYDAY",
                promotion::Benefit::FixedAmount(money("10000IDR")),
            ))
            .await
            .unwrap();

        let user_id = user::Id::new();
        let booking = service
            .execute(ReserveSeats {
                user_id,
                showtime_id: showtime.id,
                seats: seats(&["A1"]),
                coupon_code: Some("PAYDAY".parse().unwrap()),
            })
            .await
            .unwrap();
        let _confirmed = service
            .execute(ConfirmBooking {
                booking_id: booking.id,
                payment: booking::Payment {
                    method: booking::payment::Method::Card,
                    id: "PAY-1".parse().unwrap(),
                },
            })
            .await
            .unwrap();

        // The owning customer cannot cancel a confirmed booking.
        let err = service
            .execute(CancelBooking {
                booking_id: booking.id,
                initiator_id: user_id,
                initiator_role: user::Role::Customer,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Forbidden(_)));

        // A manager can, and the coupon use comes back.
        service
            .execute(CancelBooking {
                booking_id: booking.id,
                initiator_id: user::Id::new(),
                initiator_role: user::Role::Manager,
            })
            .await
            .unwrap();

        let refunded = service
            .execute(query::promotion::ByCode::by(promotion.code))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(refunded.usage_count, 0);

        let availability = service
            .execute(query::availability::OfShowtime(showtime.id))
            .await
            .unwrap();
        assert_eq!(availability.available, seats(&["A1", "A2"]));
    }

    #[tokio::test]
    async fn rejects_a_double_cancellation() {
        let (service, _bg) = service();

        let showtime =
            service.execute(create_showtime(&["A1"])).await.unwrap();
        let user_id = user::Id::new();
        let booking = service
            .execute(ReserveSeats {
                user_id,
                showtime_id: showtime.id,
                seats: seats(&["A1"]),
                coupon_code: None,
            })
            .await
            .unwrap();

        let cmd = CancelBooking {
            booking_id: booking.id,
            initiator_id: user_id,
            initiator_role: user::Role::Customer,
        };
        service.execute(cmd).await.unwrap();

        let err = service.execute(cmd).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidTransition {
                from: booking::Status::Canceled,
                ..
            },
        ));
    }
}
