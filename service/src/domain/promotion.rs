//! [`Promotion`] definitions.

use std::{collections::HashSet, hash::Hash};

use common::{
    datetime::Weekday, define_kind, unit, DateTime, DateTimeOf, Money, Percent,
};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
use itertools::Itertools as _;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{cinema, movie};
#[cfg(doc)]
use crate::domain::{Booking, Seat};

/// Coupon definition.
///
/// The `usage_count` moves only through the atomic redeem/refund operations
/// of the storage, and only on [`Booking`] confirmation: a coupon is never
/// consumed by a reservation that is later abandoned.
#[derive(Clone, Debug)]
pub struct Promotion {
    /// ID of this [`Promotion`].
    pub id: Id,

    /// Unique [`Code`] customers redeem this [`Promotion`] by.
    pub code: Code,

    /// [`Benefit`] granted by this [`Promotion`].
    pub benefit: Benefit,

    /// Minimum order amount this [`Promotion`] applies from, if any.
    pub min_purchase: Option<Money>,

    /// Movies this [`Promotion`] applies to.
    pub movies: Filter<movie::Id>,

    /// Cinemas this [`Promotion`] applies to.
    pub cinemas: Filter<cinema::Id>,

    /// Days of the week this [`Promotion`] applies on.
    pub weekdays: Filter<Weekday>,

    /// [`DateTime`] this [`Promotion`] is valid from.
    pub starts_at: StartDateTime,

    /// [`DateTime`] this [`Promotion`] is valid until.
    pub ends_at: EndDateTime,

    /// Maximum number of redemptions of this [`Promotion`].
    pub usage_limit: UsageLimit,

    /// Number of redemptions of this [`Promotion`] so far.
    ///
    /// Invariant: `usage_count <= usage_limit`.
    pub usage_count: UsageCount,

    /// [`DateTime`] when this [`Promotion`] was created.
    pub created_at: CreationDateTime,
}

impl Promotion {
    /// Returns [`Status`] of this [`Promotion`] as of the provided moment.
    #[must_use]
    pub fn status(&self, at: DateTime) -> Status {
        use Status as S;

        if at < self.starts_at.coerce() {
            return S::Upcoming;
        }

        if at > self.ends_at.coerce() || self.usage_count >= self.usage_limit
        {
            return S::Expired;
        }

        S::Active
    }

    /// Validates this [`Promotion`] against the provided [`Order`] and
    /// computes the discounted [`Money`] amount.
    ///
    /// This check doesn't consume a use of this [`Promotion`]: redemption
    /// happens on [`Booking`] confirmation only.
    ///
    /// # Errors
    ///
    /// Returns an [`ApplyError`] if this [`Promotion`] is not applicable to
    /// the provided [`Order`].
    pub fn apply(&self, order: &Order) -> Result<Money, ApplyError> {
        use ApplyError as E;

        if order.at < self.starts_at.coerce() {
            return Err(E::NotStarted);
        }
        if order.at > self.ends_at.coerce() {
            return Err(E::Expired);
        }
        if self.usage_count >= self.usage_limit {
            return Err(E::UsageLimitReached);
        }

        let currency = order.amount.currency;

        if let Some(min) = self.min_purchase {
            if min.currency != currency {
                return Err(E::CurrencyMismatch);
            }
            if order.amount.amount < min.amount {
                return Err(E::BelowMinPurchase(min));
            }
        }

        if !self.movies.matches(&order.movie_id) {
            return Err(E::MovieNotEligible);
        }
        if !self.cinemas.matches(&order.cinema_id) {
            return Err(E::CinemaNotEligible);
        }
        if !self.weekdays.matches(&order.at.weekday()) {
            return Err(E::WeekdayNotEligible);
        }

        let discount = match &self.benefit {
            Benefit::Percentage { percent, cap } => {
                let mut amount = percent.of(order.amount.amount);
                if let Some(cap) = cap {
                    if cap.currency != currency {
                        return Err(E::CurrencyMismatch);
                    }
                    amount = amount.min(cap.amount);
                }
                amount
            }

            Benefit::FixedAmount(value) => {
                if value.currency != currency {
                    return Err(E::CurrencyMismatch);
                }
                value.amount
            }

            Benefit::BuyOneGetOne => {
                if order.seat_prices.iter().any(|p| p.currency != currency) {
                    return Err(E::CurrencyMismatch);
                }
                // For `n` seats, the `n / 2` lowest-priced ones come for
                // free. Sorting the prices keeps the eligible subset
                // deterministic across heterogeneous seat prices.
                order
                    .seat_prices
                    .iter()
                    .map(|p| p.amount)
                    .sorted()
                    .take(order.seat_prices.len() / 2)
                    .sum()
            }
        };

        // The final amount is floored at zero, so a discount never exceeds
        // the order amount.
        Ok(Money {
            amount: discount.min(order.amount.amount),
            currency,
        })
    }
}

/// ID of a [`Promotion`].
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

/// Coupon code of a [`Promotion`], unique among all [`Promotion`]s.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
pub struct Code(String);

impl Code {
    /// Creates a new [`Code`] if the given `code` is valid.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Option<Self> {
        let code = code.into();
        Self::check(&code).then_some(Self(code))
    }

    /// Checks whether the given `code` is a valid [`Code`].
    fn check(code: impl AsRef<str>) -> bool {
        let code = code.as_ref();
        (3..=32).contains(&code.len())
            && code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
    }
}

impl FromStr for Code {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Code`")
    }
}

/// Benefit granted by a [`Promotion`].
#[derive(Clone, Copy, Debug)]
pub enum Benefit {
    /// Percentage of the order amount, optionally capped.
    Percentage {
        /// [`Percent`] of the order amount to discount.
        percent: Percent,

        /// Maximum [`Money`] amount the discount is capped at.
        cap: Option<Money>,
    },

    /// Fixed [`Money`] amount off the order.
    FixedAmount(Money),

    /// Buy-one-get-one: the cheapest half of the ordered seats is free.
    BuyOneGetOne,
}

/// Applicability filter of a [`Promotion`].
#[derive(Clone, Debug)]
pub enum Filter<T> {
    /// Any value matches.
    Unrestricted,

    /// Only the listed values match.
    RestrictedTo(HashSet<T>),
}

impl<T: Eq + Hash> Filter<T> {
    /// Returns whether the provided value passes this [`Filter`].
    #[must_use]
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::RestrictedTo(values) => values.contains(value),
        }
    }
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self::Unrestricted
    }
}

impl<T: Eq + Hash> FromIterator<T> for Filter<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::RestrictedTo(iter.into_iter().collect())
    }
}

define_kind! {
    #[doc = "Status of a [`Promotion`], derived from its validity window \
             and usage limit."]
    enum Status {
        #[doc = "The [`Promotion`] can be applied."]
        Active = 1,

        #[doc = "The [`Promotion`] validity window hasn't started yet."]
        Upcoming = 2,

        #[doc = "The [`Promotion`] validity window has passed, or its usage \
                 limit is reached."]
        Expired = 3,
    }
}

/// Candidate order a [`Promotion`] is applied to.
#[derive(Clone, Debug)]
pub struct Order {
    /// Gross [`Money`] amount of the order.
    pub amount: Money,

    /// Price of each [`Seat`] of the order.
    pub seat_prices: Vec<Money>,

    /// ID of the movie the order is for.
    pub movie_id: movie::Id,

    /// ID of the cinema the order is placed in.
    pub cinema_id: cinema::Id,

    /// [`DateTime`] the order is placed at.
    pub at: DateTime,
}

/// Rejection of applying a [`Promotion`] to an [`Order`].
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum ApplyError {
    /// [`Promotion`] validity window hasn't started yet.
    #[display("promotion is not active yet")]
    NotStarted,

    /// [`Promotion`] validity window has passed.
    #[display("promotion has expired")]
    Expired,

    /// [`Promotion`] usage limit is reached.
    #[display("promotion usage limit is reached")]
    UsageLimitReached,

    /// Order amount is below the [`Promotion`]'s minimum purchase.
    #[display("order amount is below the minimum purchase of {_0}")]
    BelowMinPurchase(#[error(not(source))] Money),

    /// Order's movie doesn't pass the [`Promotion`]'s filter.
    #[display("promotion doesn't apply to this movie")]
    MovieNotEligible,

    /// Order's cinema doesn't pass the [`Promotion`]'s filter.
    #[display("promotion doesn't apply to this cinema")]
    CinemaNotEligible,

    /// Order's day of the week doesn't pass the [`Promotion`]'s filter.
    #[display("promotion doesn't apply on this day of the week")]
    WeekdayNotEligible,

    /// [`Promotion`] and order amounts are in different currencies.
    #[display("promotion currency doesn't match the order")]
    CurrencyMismatch,
}

/// Rejection of an atomic [`Promotion`] redemption.
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum RedeemError {
    /// [`Promotion`] with the provided ID does not exist.
    #[display("`Promotion(id: {_0})` does not exist")]
    NotFound(#[error(not(source))] Id),

    /// [`Promotion`] usage limit is reached.
    #[display("`Promotion(id: {_0})` usage limit is reached")]
    UsageLimitReached(#[error(not(source))] Id),
}

/// Maximum number of redemptions of a [`Promotion`].
pub type UsageLimit = u32;

/// Number of redemptions of a [`Promotion`] so far.
pub type UsageCount = u32;

/// [`DateTime`] a [`Promotion`] is valid from.
pub type StartDateTime = DateTimeOf<(Promotion, unit::Start)>;

/// [`DateTime`] a [`Promotion`] is valid until.
pub type EndDateTime = DateTimeOf<(Promotion, unit::End)>;

/// [`DateTime`] when a [`Promotion`] was created.
pub type CreationDateTime = DateTimeOf<(Promotion, unit::Creation)>;
