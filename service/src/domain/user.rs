//! User identity definitions.
//!
//! Authentication is an external collaborator: the identity and role of a
//! user are supplied by it and trusted here without re-validation.

use common::define_kind;
use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ID of a user.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Role of a user."]
    enum Role {
        #[doc = "Regular customer booking tickets."]
        Customer = 1,

        #[doc = "Cinema manager."]
        Manager = 2,

        #[doc = "Platform administrator."]
        Admin = 3,
    }
}

impl Role {
    /// Returns whether this [`Role`] is a staff one.
    #[must_use]
    pub fn is_staff(self) -> bool {
        match self {
            Self::Manager | Self::Admin => true,
            Self::Customer => false,
        }
    }
}
