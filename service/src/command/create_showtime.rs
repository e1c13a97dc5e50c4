//! [`Command`] for scheduling a new [`Showtime`].

use std::collections::HashMap;

use common::{operations::Insert, DateTime};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{cinema, movie, seat, showtime, user, Seats, Showtime},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for scheduling a new [`Showtime`].
///
/// The new [`Showtime`] is created open, with the full hall seat set
/// available.
#[derive(Clone, Debug)]
pub struct CreateShowtime {
    /// ID of the movie to screen.
    pub movie_id: movie::Id,

    /// ID of the cinema the [`Showtime`] takes place in.
    pub cinema_id: cinema::Id,

    /// [`DateTime`] when the [`Showtime`] starts.
    pub starts_at: showtime::StartDateTime,

    /// [`DateTime`] when the [`Showtime`] ends.
    pub ends_at: showtime::EndDateTime,

    /// Ticket [`showtime::Prices`], per [`seat::Class`].
    pub prices: showtime::Prices,

    /// [`seat::Class`] of each [`seat::Row`] of the hall.
    pub classes: HashMap<seat::Row, seat::Class>,

    /// Full seat set of the hall.
    pub seats: Seats,

    /// [`user::Role`] of the user scheduling the [`Showtime`].
    pub initiator_role: user::Role,
}

impl<Db> Command<CreateShowtime> for Service<Db>
where
    Db: Database<Insert<Showtime>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Showtime;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateShowtime,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateShowtime {
            movie_id,
            cinema_id,
            starts_at,
            ends_at,
            prices,
            classes,
            seats,
            initiator_role,
        } = cmd;

        if !initiator_role.is_staff() {
            return Err(tracerr::new!(E::Forbidden(initiator_role)));
        }
        if seats.is_empty() {
            return Err(tracerr::new!(E::NoSeats));
        }

        let now = DateTime::now();
        if starts_at.coerce() <= now {
            return Err(tracerr::new!(E::StartsInPast));
        }
        if ends_at.coerce::<()>() <= starts_at.coerce() {
            return Err(tracerr::new!(E::InvalidTimeWindow));
        }

        let showtime = Showtime {
            id: showtime::Id::new(),
            movie_id,
            cinema_id,
            starts_at,
            ends_at,
            prices,
            classes,
            available_seats: seats,
            booked_seats: Seats::new(),
            created_at: now.coerce(),
            canceled_at: None,
        };

        self.database()
            .execute(Insert(showtime.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(showtime)
    }
}

/// Error of [`CreateShowtime`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Initiator is not allowed to schedule [`Showtime`]s.
    #[display("`{_0}` is not allowed to schedule showtimes")]
    Forbidden(#[error(not(source))] user::Role),

    /// Hall seat set is empty.
    #[display("hall seat set cannot be empty")]
    NoSeats,

    /// [`Showtime`] would start in the past.
    #[display("showtime cannot start in the past")]
    StartsInPast,

    /// [`Showtime`] would end before it starts.
    #[display("showtime cannot end before it starts")]
    InvalidTimeWindow,
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;

    use crate::{
        command::Command as _,
        domain::{showtime, user},
        test_support::{create_showtime, service},
    };

    use super::ExecutionError;

    #[tokio::test]
    async fn schedules_an_open_showtime() {
        let (service, _bg) = service();

        let showtime = service
            .execute(create_showtime(&["A1", "A2", "B1"]))
            .await
            .unwrap();

        assert_eq!(showtime.status(), showtime::Status::Open);
        assert_eq!(showtime.available_seats.len(), 3);
        assert!(showtime.booked_seats.is_empty());
    }

    #[tokio::test]
    async fn requires_a_staff_role() {
        let (service, _bg) = service();

        let mut cmd = create_showtime(&["A1"]);
        cmd.initiator_role = user::Role::Customer;

        let err = service.execute(cmd).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Forbidden(user::Role::Customer),
        ));
    }

    #[tokio::test]
    async fn rejects_an_inverted_time_window() {
        let (service, _bg) = service();

        let mut cmd = create_showtime(&["A1"]);
        cmd.ends_at = (DateTime::now() + Duration::from_secs(60)).coerce();

        let err = service.execute(cmd).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvalidTimeWindow));
    }
}
