//! Service contains the business logic of the cinema ticketing platform:
//! seat reservation, booking lifecycle and promotions.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;
#[cfg(test)]
mod test_support;

use std::{error::Error, time};

use common::operations::{By, Start};
use serde::Deserialize;
use smart_default::SmartDefault;

#[cfg(doc)]
use domain::Booking;
#[cfg(doc)]
use infra::Database;

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Config {
    /// Duration a pending [`Booking`] holds its seats for before expiring.
    #[default(time::Duration::from_secs(60 * 15))]
    #[serde(with = "humantime_serde")]
    pub booking_hold: time::Duration,

    /// [`task::ExpirePendingBookings`] configuration.
    pub expire_pending_bookings: task::expire_pending_bookings::Config,

    /// [`task::ArchivePastShowtimes`] configuration.
    pub archive_past_showtimes: task::archive_past_showtimes::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters, along with
    /// the [`task::Background`] environment driving its periodic [`Task`]s.
    pub fn new(config: Config, database: Db) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::ExpirePendingBookings<Self>,
                        task::expire_pending_bookings::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Task<
                Start<
                    By<
                        task::ArchivePastShowtimes<Self>,
                        task::archive_past_showtimes::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let this = Service { config, database };

        let mut bg = task::Background::default();

        let svc = this.clone();
        bg.spawn(async move {
            svc.execute(Start(By::new(svc.config().expire_pending_bookings)))
                .await
        });

        let svc = this.clone();
        bg.spawn(async move {
            svc.execute(Start(By::new(svc.config().archive_past_showtimes)))
                .await
        });

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }
}
