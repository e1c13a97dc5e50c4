//! [`Query`] verifying a [`Booking`] at the venue.

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{booking, showtime, Booking, Showtime},
    infra::{database, Database},
    read::booking::Verification,
    Service,
};

use super::Query;

/// [`Query`] verifying a [`Booking`] by its ID or its human-readable
/// [`booking::Code`].
///
/// Verification is read-only: marking a booking as redeemed at the venue is
/// a separate explicit action.
#[derive(Clone, Debug)]
pub enum VerifyBooking {
    /// Verify a [`Booking`] by its [`booking::Id`].
    ById(booking::Id),

    /// Verify a [`Booking`] by its [`booking::Code`].
    ByCode(booking::Code),
}

impl<Db> Query<VerifyBooking> for Service<Db>
where
    Db: Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Booking>, booking::Code>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Showtime>, showtime::Id>>,
            Ok = Option<Showtime>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Verification;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: VerifyBooking,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let booking = match query {
            VerifyBooking::ById(id) => self
                .database()
                .execute(Select(By::<Option<Booking>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::IdNotFound(id))
                .map_err(tracerr::wrap!())?,
            VerifyBooking::ByCode(code) => self
                .database()
                .execute(Select(By::<Option<Booking>, _>::new(code.clone())))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::CodeNotFound(code))
                .map_err(tracerr::wrap!())?,
        };

        let showtime = self
            .database()
            .execute(Select(By::<Option<Showtime>, _>::new(
                booking.showtime_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(Verification {
            status: booking.status(DateTime::now()),
            used: booking.is_used(),
            showtime,
            booking,
        })
    }
}

/// Error of [`VerifyBooking`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Booking`] with the provided ID does not exist.
    #[display("`Booking(id: {_0})` does not exist")]
    IdNotFound(#[error(not(source))] booking::Id),

    /// [`Booking`] with the provided [`booking::Code`] does not exist.
    #[display("`Booking(code: {_0})` does not exist")]
    CodeNotFound(#[error(not(source))] booking::Code),
}
