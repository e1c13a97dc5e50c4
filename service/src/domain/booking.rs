//! [`Booking`] definitions.

use common::{define_kind, unit, DateTime, DateTimeOf, Money};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
use rand::Rng as _;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{promotion, showtime, user, Seats};
#[cfg(doc)]
use crate::domain::{Promotion, Showtime};

/// Outcome of a single reservation attempt.
///
/// A [`Booking`] exclusively owns its claimed [`Seats`]: no two live
/// [`Booking`]s reference overlapping seats of the same [`Showtime`].
#[derive(Clone, Debug)]
pub struct Booking {
    /// ID of this [`Booking`].
    pub id: Id,

    /// ID of the user owning this [`Booking`].
    pub user_id: user::Id,

    /// ID of the [`Showtime`] this [`Booking`] is for.
    pub showtime_id: showtime::Id,

    /// Exact [`Seats`] claimed by this [`Booking`].
    pub seats: Seats,

    /// Gross [`Money`] amount of this [`Booking`] before any discount.
    pub gross: Money,

    /// [`Discount`] applied to this [`Booking`], if any.
    pub discount: Option<Discount>,

    /// Final [`Money`] amount of this [`Booking`].
    pub total: Money,

    /// [`Payment`] record of this [`Booking`], set on confirmation.
    pub payment: Option<Payment>,

    /// Human-readable [`Code`] of this [`Booking`], issued on confirmation.
    pub code: Option<Code>,

    /// [`DateTime`] when this [`Booking`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Booking`] stops holding its [`Seats`] unless
    /// confirmed.
    pub expires_at: ExpirationDateTime,

    /// [`DateTime`] when this [`Booking`] was confirmed, if it was.
    pub confirmed_at: Option<ConfirmationDateTime>,

    /// [`DateTime`] when this [`Booking`] was canceled, if it was.
    pub canceled_at: Option<CancellationDateTime>,

    /// [`DateTime`] when this [`Booking`] was redeemed at the venue, if it
    /// was.
    pub redeemed_at: Option<RedemptionDateTime>,
}

impl Booking {
    /// Returns [`Status`] of this [`Booking`] as of the provided moment.
    ///
    /// A pending [`Booking`] past its expiration reads as
    /// [`Status::Canceled`], even before the expiry sweep has released its
    /// [`Seats`].
    #[must_use]
    pub fn status(&self, at: DateTime) -> Status {
        use Status as S;

        if self.canceled_at.is_some() {
            return S::Canceled;
        }

        if self.confirmed_at.is_some() {
            return S::Confirmed;
        }

        if at >= self.expires_at.coerce() {
            return S::Canceled;
        }

        S::Pending
    }

    /// Returns whether this [`Booking`] was already redeemed at the venue.
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.redeemed_at.is_some()
    }
}

/// ID of a [`Booking`].
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
    #[doc = "Status of a [`Booking`], derived from its state."]
    enum Status {
        #[doc = "The [`Booking`] holds its seats awaiting payment."]
        Pending = 1,

        #[doc = "The [`Booking`] is paid and confirmed."]
        Confirmed = 2,

        #[doc = "The [`Booking`] was canceled or expired."]
        Canceled = 3,
    }
}

/// Discount applied to a [`Booking`] by a [`Promotion`].
#[derive(Clone, Copy, Debug)]
pub struct Discount {
    /// ID of the applied [`Promotion`].
    pub promotion_id: promotion::Id,

    /// Discounted [`Money`] amount.
    pub amount: Money,
}

/// Payment record of a confirmed [`Booking`].
///
/// Issued by the external payment gateway collaborator and trusted here.
#[derive(Clone, Debug)]
pub struct Payment {
    /// [`payment::Method`] the [`Booking`] was paid with.
    pub method: payment::Method,

    /// [`payment::Id`] of the gateway transaction.
    pub id: payment::Id,
}

pub mod payment {
    //! [`Payment`]-related definitions.

    use common::define_kind;
    use derive_more::{AsRef, Display};

    #[cfg(doc)]
    use super::Payment;

    define_kind! {
        #[doc = "Method of a [`Payment`]."]
        enum Method {
            #[doc = "Bank card."]
            Card = 1,

            #[doc = "Electronic wallet."]
            EWallet = 2,

            #[doc = "Bank transfer."]
            BankTransfer = 3,

            #[doc = "Cash at the box office."]
            Cash = 4,
        }
    }

    /// ID of a [`Payment`] transaction, issued by the gateway.
    #[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
    #[as_ref(str, String)]
    pub struct Id(String);

    impl Id {
        /// Creates a new [`Id`] if the given `id` is valid.
        #[must_use]
        pub fn new(id: impl Into<String>) -> Option<Self> {
            let id = id.into();
            Self::check(&id).then_some(Self(id))
        }

        /// Checks whether the given `id` is a valid [`Id`].
        fn check(id: impl AsRef<str>) -> bool {
            let id = id.as_ref();
            id.trim() == id && !id.is_empty() && id.len() <= 256
        }
    }

    impl std::str::FromStr for Id {
        type Err = &'static str;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            Self::new(s).ok_or("invalid payment `Id`")
        }
    }
}

/// Human-readable code of a confirmed [`Booking`], presented at the venue.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
pub struct Code(String);

impl Code {
    /// Alphabet the random part of a [`Code`] is drawn from.
    ///
    /// Visually ambiguous characters (`0`/`O`, `1`/`I`) are excluded.
    const ALPHABET: &'static [u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

    /// Length of the random part of a [`Code`].
    const LENGTH: usize = 8;

    /// Prefix of every [`Code`].
    const PREFIX: &'static str = "TKT-";

    /// Generates a new random [`Code`].
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut code = String::with_capacity(Self::PREFIX.len() + Self::LENGTH);
        code.push_str(Self::PREFIX);
        for _ in 0..Self::LENGTH {
            let i = rng.gen_range(0..Self::ALPHABET.len());
            code.push(char::from(Self::ALPHABET[i]));
        }
        Self(code)
    }

    /// Creates a new [`Code`] if the given `code` is valid.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Option<Self> {
        let code = code.into();
        Self::check(&code).then_some(Self(code))
    }

    /// Checks whether the given `code` is a valid [`Code`].
    fn check(code: impl AsRef<str>) -> bool {
        let code = code.as_ref();
        code.strip_prefix(Self::PREFIX).is_some_and(|rest| {
            rest.len() == Self::LENGTH
                && rest.bytes().all(|b| Self::ALPHABET.contains(&b))
        })
    }
}

impl FromStr for Code {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Code`")
    }
}

/// Request to atomically confirm a pending [`Booking`].
#[derive(Clone, Debug)]
pub struct Confirmation {
    /// ID of the [`Booking`] to confirm.
    pub id: Id,

    /// [`Payment`] record reported by the gateway.
    pub payment: Payment,

    /// [`Code`] to issue to the confirmed [`Booking`].
    pub code: Code,

    /// [`DateTime`] the confirmation happens at.
    pub at: DateTime,
}

/// Request to atomically cancel a [`Booking`].
#[derive(Clone, Copy, Debug)]
pub struct Cancellation {
    /// ID of the [`Booking`] to cancel.
    pub id: Id,

    /// Whether a confirmed [`Booking`] may be canceled too.
    pub include_confirmed: bool,

    /// [`DateTime`] the cancellation happens at.
    pub at: DateTime,
}

/// Request to atomically mark a confirmed [`Booking`] as redeemed at the
/// venue.
#[derive(Clone, Copy, Debug)]
pub struct Redemption {
    /// ID of the [`Booking`] to redeem.
    pub id: Id,

    /// [`DateTime`] the redemption happens at.
    pub at: DateTime,
}

/// Rejection of a [`Booking`] state transition.
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum TransitionError {
    /// [`Booking`] with the provided ID does not exist.
    #[display("`Booking(id: {_0})` does not exist")]
    NotFound(#[error(not(source))] Id),

    /// The transition is not defined for the current [`Status`].
    #[display("`Booking(id: {id})` cannot transition out of `{from}`")]
    Invalid {
        /// ID of the [`Booking`].
        id: Id,

        /// [`Status`] the [`Booking`] is in.
        from: Status,
    },
}

/// Rejection of a [`Booking`] [`Redemption`].
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum RedemptionError {
    /// [`Booking`] with the provided ID does not exist.
    #[display("`Booking(id: {_0})` does not exist")]
    NotFound(#[error(not(source))] Id),

    /// Only confirmed [`Booking`]s may be redeemed.
    #[display("`Booking(id: {id})` is not confirmed: {from}")]
    NotConfirmed {
        /// ID of the [`Booking`].
        id: Id,

        /// [`Status`] the [`Booking`] is in.
        from: Status,
    },

    /// [`Booking`] was already redeemed.
    #[display("`Booking(id: {_0})` was already redeemed")]
    AlreadyRedeemed(#[error(not(source))] Id),
}

/// [`DateTime`] when a [`Booking`] was created.
pub type CreationDateTime = DateTimeOf<(Booking, unit::Creation)>;

/// [`DateTime`] when a pending [`Booking`] expires.
pub type ExpirationDateTime = DateTimeOf<(Booking, unit::Expiration)>;

/// [`DateTime`] when a [`Booking`] was confirmed.
pub type ConfirmationDateTime = DateTimeOf<(Booking, unit::Confirmation)>;

/// [`DateTime`] when a [`Booking`] was canceled.
pub type CancellationDateTime = DateTimeOf<(Booking, unit::Cancellation)>;

/// [`DateTime`] when a [`Booking`] was redeemed at the venue.
pub type RedemptionDateTime = DateTimeOf<(Booking, unit::Redemption)>;
