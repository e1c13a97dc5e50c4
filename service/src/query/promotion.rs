//! [`Query`] collection related to a single [`Promotion`].

use common::operations::By;

use crate::domain::{promotion, Promotion};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Promotion`] by its [`promotion::Code`].
pub type ByCode = DatabaseQuery<By<Option<Promotion>, promotion::Code>>;
