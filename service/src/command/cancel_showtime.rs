//! [`Command`] for canceling a [`Showtime`].

use common::{
    operations::{By, Cancel},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{showtime, user, Showtime},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for canceling a [`Showtime`].
///
/// A canceled [`Showtime`] accepts no further seat claims. Refunding its
/// already confirmed bookings is driven by the payment-flow collaborator
/// through [`CancelBooking`].
///
/// [`CancelBooking`]: super::CancelBooking
#[derive(Clone, Copy, Debug)]
pub struct CancelShowtime {
    /// ID of the [`Showtime`] to cancel.
    pub showtime_id: showtime::Id,

    /// [`user::Role`] of the user canceling the [`Showtime`].
    pub initiator_role: user::Role,
}

impl<Db> Command<CancelShowtime> for Service<Db>
where
    Db: Database<
        Cancel<By<Showtime, showtime::Cancellation>>,
        Ok = Result<Showtime, showtime::CancelError>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Showtime;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CancelShowtime,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelShowtime {
            showtime_id,
            initiator_role,
        } = cmd;

        if !initiator_role.is_staff() {
            return Err(tracerr::new!(E::Forbidden(initiator_role)));
        }

        self.database()
            .execute(Cancel(By::new(showtime::Cancellation {
                id: showtime_id,
                at: DateTime::now(),
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .map_err(|e| match e {
                showtime::CancelError::NotFound(id) => {
                    tracerr::new!(E::ShowtimeNotFound(id))
                }
                showtime::CancelError::AlreadyCanceled(id) => {
                    tracerr::new!(E::AlreadyCanceled(id))
                }
            })
    }
}

/// Error of [`CancelShowtime`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Initiator is not allowed to cancel [`Showtime`]s.
    #[display("`{_0}` is not allowed to cancel showtimes")]
    Forbidden(#[error(not(source))] user::Role),

    /// [`Showtime`] with the provided ID does not exist.
    #[display("`Showtime(id: {_0})` does not exist")]
    ShowtimeNotFound(#[error(not(source))] showtime::Id),

    /// [`Showtime`] is already canceled.
    #[display("`Showtime(id: {_0})` is already canceled")]
    AlreadyCanceled(#[error(not(source))] showtime::Id),
}
