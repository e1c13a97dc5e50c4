//! [`Query`] collection related to a single [`Showtime`].

use common::operations::By;

use crate::domain::{showtime, Showtime};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Showtime`] by its [`showtime::Id`].
pub type ById = DatabaseQuery<By<Option<Showtime>, showtime::Id>>;
