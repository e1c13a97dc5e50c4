//! [`Command`] for confirming a pending [`Booking`].

use common::{
    operations::{By, Confirm, Redeem, Refund, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{booking, promotion, Booking, Promotion},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for confirming a pending [`Booking`] once its payment is
/// collected.
///
/// Invoked by the payment-flow collaborator, which is trusted to report
/// payments truthfully.
#[derive(Clone, Debug)]
pub struct ConfirmBooking {
    /// ID of the [`Booking`] to confirm.
    pub booking_id: booking::Id,

    /// [`booking::Payment`] record reported by the gateway.
    pub payment: booking::Payment,
}

impl<Db> Command<ConfirmBooking> for Service<Db>
where
    Db: Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<
            Redeem<By<Promotion, promotion::Id>>,
            Ok = Result<Promotion, promotion::RedeemError>,
            Err = Traced<database::Error>,
        > + Database<
            Refund<By<Promotion, promotion::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Confirm<By<Booking, booking::Confirmation>>,
            Ok = Result<Booking, booking::TransitionError>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ConfirmBooking,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ConfirmBooking {
            booking_id,
            payment,
        } = cmd;

        let now = DateTime::now();

        let booking = self
            .database()
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotFound(booking_id))
            .map_err(tracerr::wrap!())?;

        // Commit the coupon redemption first: a coupon exhausted mid-flight
        // must fail the confirmation before the booking transitions.
        let redeemed = if let Some(discount) = &booking.discount {
            let outcome = self
                .database()
                .execute(Redeem(By::<Promotion, _>::new(discount.promotion_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            match outcome {
                Ok(_) => Some(discount.promotion_id),
                Err(promotion::RedeemError::NotFound(id)) => {
                    return Err(tracerr::new!(E::PromotionNotFound(id)));
                }
                Err(promotion::RedeemError::UsageLimitReached(id)) => {
                    return Err(tracerr::new!(E::CouponExhausted(id)));
                }
            }
        } else {
            None
        };

        let outcome = self
            .database()
            .execute(Confirm(By::new(booking::Confirmation {
                id: booking.id,
                payment,
                code: booking::Code::generate(),
                at: now,
            })))
            .await;
        match outcome {
            Ok(Ok(confirmed)) => Ok(confirmed),
            Ok(Err(e)) => {
                // The booking didn't transition: the redemption committed
                // above must be rolled back.
                refund(self, redeemed)
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                match e {
                    booking::TransitionError::NotFound(id) => {
                        Err(tracerr::new!(E::BookingNotFound(id)))
                    }
                    booking::TransitionError::Invalid { id, from } => {
                        Err(tracerr::new!(E::InvalidTransition { id, from }))
                    }
                }
            }
            Err(e) => {
                refund(self, redeemed)
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                Err(tracerr::map_from_and_wrap!(=> E)(e))
            }
        }
    }
}

/// Rolls a committed coupon redemption back, if any.
async fn refund<Db>(
    service: &Service<Db>,
    promotion_id: Option<promotion::Id>,
) -> Result<(), Traced<database::Error>>
where
    Db: Database<
        Refund<By<Promotion, promotion::Id>>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    if let Some(id) = promotion_id {
        service
            .database()
            .execute(Refund(By::<Promotion, _>::new(id)))
            .await
            .map_err(tracerr::wrap!())?;
    }
    Ok(())
}

/// Error of [`ConfirmBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Booking`] with the provided ID does not exist.
    #[display("`Booking(id: {_0})` does not exist")]
    BookingNotFound(#[error(not(source))] booking::Id),

    /// [`Promotion`] applied to the [`Booking`] no longer exists.
    #[display("`Promotion(id: {_0})` does not exist")]
    PromotionNotFound(#[error(not(source))] promotion::Id),

    /// [`Promotion`] applied to the [`Booking`] got exhausted mid-flight.
    #[display("`Promotion(id: {_0})` usage limit is reached")]
    CouponExhausted(#[error(not(source))] promotion::Id),

    /// [`Booking`] cannot transition into a confirmed state.
    #[display("`Booking(id: {id})` cannot be confirmed out of `{from}`")]
    InvalidTransition {
        /// ID of the [`Booking`].
        id: booking::Id,

        /// [`booking::Status`] the [`Booking`] is in.
        from: booking::Status,
    },
}
