//! [`Command`] for marking a [`Booking`] as redeemed at the venue.

use common::{
    operations::{By, Redeem, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{booking, user, Booking},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for marking a confirmed [`Booking`] as redeemed at the venue,
/// invoked by staff scanning tickets.
///
/// Redemption is one-way: there is no reversal.
#[derive(Clone, Debug)]
pub struct RedeemBooking {
    /// [`booking::Code`] presented at the venue.
    pub code: booking::Code,

    /// [`user::Role`] of the staff member performing the redemption.
    pub initiator_role: user::Role,
}

impl<Db> Command<RedeemBooking> for Service<Db>
where
    Db: Database<
            Select<By<Option<Booking>, booking::Code>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<
            Redeem<By<Booking, booking::Redemption>>,
            Ok = Result<Booking, booking::RedemptionError>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RedeemBooking,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RedeemBooking {
            code,
            initiator_role,
        } = cmd;

        if !initiator_role.is_staff() {
            return Err(tracerr::new!(E::Forbidden(initiator_role)));
        }

        let booking = self
            .database()
            .execute(Select(By::<Option<Booking>, _>::new(code.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CodeNotFound(code))
            .map_err(tracerr::wrap!())?;

        self.database()
            .execute(Redeem(By::new(booking::Redemption {
                id: booking.id,
                at: DateTime::now(),
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .map_err(|e| match e {
                booking::RedemptionError::NotFound(id) => {
                    tracerr::new!(E::BookingNotFound(id))
                }
                booking::RedemptionError::NotConfirmed { id, from } => {
                    tracerr::new!(E::NotConfirmed { id, from })
                }
                booking::RedemptionError::AlreadyRedeemed(id) => {
                    tracerr::new!(E::AlreadyRedeemed(id))
                }
            })
    }
}

/// Error of [`RedeemBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Initiator is not allowed to redeem [`Booking`]s.
    #[display("`{_0}` is not allowed to redeem bookings")]
    Forbidden(#[error(not(source))] user::Role),

    /// No [`Booking`] exists under the provided [`booking::Code`].
    #[display("`Booking(code: {_0})` does not exist")]
    CodeNotFound(#[error(not(source))] booking::Code),

    /// [`Booking`] with the provided ID does not exist.
    #[display("`Booking(id: {_0})` does not exist")]
    BookingNotFound(#[error(not(source))] booking::Id),

    /// Only confirmed [`Booking`]s may be redeemed.
    #[display("`Booking(id: {id})` is not confirmed: {from}")]
    NotConfirmed {
        /// ID of the [`Booking`].
        id: booking::Id,

        /// [`booking::Status`] the [`Booking`] is in.
        from: booking::Status,
    },

    /// [`Booking`] was already redeemed.
    #[display("`Booking(id: {_0})` was already redeemed")]
    AlreadyRedeemed(#[error(not(source))] booking::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            Command as _, ConfirmBooking, RedeemBooking, ReserveSeats,
        },
        domain::{booking, user},
        query::{Query as _, VerifyBooking},
        test_support::{create_showtime, seats, service},
    };

    use super::ExecutionError;

    async fn confirmed_booking(
        service: &crate::Service<crate::infra::Memory>,
    ) -> booking::Booking {
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
        service
            .execute(ConfirmBooking {
                booking_id: booking.id,
                payment: booking::Payment {
                    method: booking::payment::Method::Cash,
                    id: "PAY-1".parse().unwrap(),
                },
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn redemption_is_one_way() {
        let (service, _bg) = service();

        let confirmed = confirmed_booking(&service).await;
        let code = confirmed.code.clone().unwrap();

        let cmd = RedeemBooking {
            code: code.clone(),
            initiator_role: user::Role::Manager,
        };
        let redeemed = service.execute(cmd.clone()).await.unwrap();
        assert!(redeemed.is_used());

        let err = service.execute(cmd).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::AlreadyRedeemed(_),
        ));

        // Verification reflects the usage without mutating anything.
        let verification = service
            .execute(VerifyBooking::ByCode(code))
            .await
            .unwrap();
        assert!(verification.used);
        assert_eq!(verification.status, booking::Status::Confirmed);
    }

    #[tokio::test]
    async fn pending_bookings_cannot_be_redeemed() {
        let (service, _bg) = service();

        let showtime =
            service.execute(create_showtime(&["A1"])).await.unwrap();
        let _pending = service
            .execute(ReserveSeats {
                user_id: user::Id::new(),
                showtime_id: showtime.id,
                seats: seats(&["A1"]),
                coupon_code: None,
            })
            .await
            .unwrap();

        // A pending booking has no code yet, so scanning any code misses.
        let err = service
            .execute(RedeemBooking {
                code: "TKT-ABCD2345".parse().unwrap(),
                initiator_role: user::Role::Manager,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::CodeNotFound(_)));
    }

    #[tokio::test]
    async fn requires_a_staff_role() {
        let (service, _bg) = service();

        let confirmed = confirmed_booking(&service).await;

        let err = service
            .execute(RedeemBooking {
                code: confirmed.code.unwrap(),
                initiator_role: user::Role::Customer,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Forbidden(_)));
    }
}
