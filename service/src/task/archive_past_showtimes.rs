//! [`ArchivePastShowtimes`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{By, Delete, Perform, Start};
use serde::Deserialize;
use smart_default::SmartDefault;
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{showtime, Showtime},
    infra::{database, Database},
    Service,
};

use super::Task;

/// Configuration for [`ArchivePastShowtimes`] [`Task`].
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Config {
    /// Interval between [`Showtime`] archival runs.
    #[default(time::Duration::from_secs(60 * 60))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,

    /// Duration a [`Showtime`] is kept after its end.
    #[default(time::Duration::from_secs(60 * 60 * 24))]
    #[serde(with = "humantime_serde")]
    pub retention: time::Duration,
}

/// [`Task`] for archiving [`Showtime`]s whose screenings have long passed.
#[derive(Clone, Copy, Debug)]
pub struct ArchivePastShowtimes<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<ArchivePastShowtimes<Self>, Config>>> for Service<Db>
where
    ArchivePastShowtimes<Service<Db>>:
        Task<Perform<()>, Ok = (), Err: Error> + Send + Sync + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ArchivePastShowtimes<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = ArchivePastShowtimes {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::ArchivePastShowtimes` failed: {e}");
            });
        }
    }
}

impl<Db> Task<Perform<()>> for ArchivePastShowtimes<Service<Db>>
where
    Db: Database<
        Delete<By<Showtime, showtime::EndDateTime>>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let deadline = showtime::EndDateTime::now() - self.config.retention;
        self.service
            .database()
            .execute(Delete(By::new(deadline)))
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`ArchivePastShowtimes`] execution.
pub type ExecutionError = Traced<database::Error>;
