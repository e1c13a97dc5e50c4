//! [`Query`] of the seat [`Availability`] of a [`Showtime`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{showtime, Showtime},
    infra::{database, Database},
    read::showtime::Availability,
    Service,
};

use super::Query;

/// [`Query`] of the seat [`Availability`] of a single [`Showtime`].
#[derive(Clone, Copy, Debug)]
pub struct OfShowtime(pub showtime::Id);

impl<Db> Query<OfShowtime> for Service<Db>
where
    Db: Database<
        Select<By<Option<Showtime>, showtime::Id>>,
        Ok = Option<Showtime>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Availability;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        OfShowtime(showtime_id): OfShowtime,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let showtime = self
            .database()
            .execute(Select(By::<Option<Showtime>, _>::new(showtime_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ShowtimeNotFound(showtime_id))
            .map_err(tracerr::wrap!())?;

        Ok(Availability {
            available: showtime.available_seats,
            booked: showtime.booked_seats,
        })
    }
}

/// Error of [`OfShowtime`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Showtime`] with the provided ID does not exist.
    #[display("`Showtime(id: {_0})` does not exist")]
    ShowtimeNotFound(#[error(not(source))] showtime::Id),
}
