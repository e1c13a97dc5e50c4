//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal};

use crate::define_kind;

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Creates a new zero [`Money`] amount in the provided [`Currency`].
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Adds the `other` amount to this one.
    ///
    /// [`None`] is returned if the [`Currency`]ies don't match.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        (self.currency == other.currency).then(|| Self {
            amount: self.amount + other.amount,
            currency: self.currency,
        })
    }

    /// Subtracts the `other` amount from this one, flooring the result at
    /// zero.
    ///
    /// [`None`] is returned if the [`Currency`]ies don't match.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Option<Self> {
        (self.currency == other.currency).then(|| Self {
            amount: (self.amount - other.amount).max(Decimal::ZERO),
            currency: self.currency,
        })
    }

    /// Returns the lesser of this and the `other` amount.
    ///
    /// [`None`] is returned if the [`Currency`]ies don't match.
    #[must_use]
    pub fn min(self, other: Self) -> Option<Self> {
        (self.currency == other.currency).then(|| Self {
            amount: self.amount.min(other.amount),
            currency: self.currency,
        })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        if amount.is_integer() {
            write!(f, "{}{currency}", amount.to_i128().expect("integer"))
        } else {
            write!(f, "{amount}{currency}")
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "US Dollar."]
        Usd = 1,

        #[doc = "Euro."]
        Eur = 2,

        #[doc = "Indonesian Rupiah."]
        Idr = 3,
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn idr(s: &str) -> Money {
        Money {
            amount: decimal(s),
            currency: Currency::Idr,
        }
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("123.45USD").unwrap(),
            Money {
                amount: decimal("123.45"),
                currency: Currency::Usd,
            },
        );

        assert_eq!(
            Money::from_str("50000IDR").unwrap(),
            Money {
                amount: decimal("50000"),
                currency: Currency::Idr,
            },
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Us").is_err());
        assert!(Money::from_str("123.45Usdollar").is_err());

        assert!(Money::from_str("123.00USD").is_ok());
        assert!(Money::from_str("123.0EUR").is_ok());
        assert!(Money::from_str("123USD").is_ok());
    }

    #[test]
    fn to_string() {
        assert_eq!(
            Money {
                amount: decimal("123.45"),
                currency: Currency::Usd,
            }
            .to_string(),
            "123.45USD",
        );

        assert_eq!(idr("50000").to_string(), "50000IDR");
        assert_eq!(idr("50000.0").to_string(), "50000IDR");
    }

    #[test]
    fn checked_add() {
        assert_eq!(
            idr("100").checked_add(idr("23")).unwrap(),
            idr("123"),
        );
        assert_eq!(
            idr("100").checked_add(Money {
                amount: decimal("1"),
                currency: Currency::Usd,
            }),
            None,
        );
    }

    #[test]
    fn saturating_sub_floors_at_zero() {
        assert_eq!(
            idr("100").saturating_sub(idr("30")).unwrap(),
            idr("70"),
        );
        assert_eq!(
            idr("100").saturating_sub(idr("150")).unwrap(),
            idr("0"),
        );
        assert_eq!(
            idr("100").saturating_sub(Money {
                amount: decimal("1"),
                currency: Currency::Eur,
            }),
            None,
        );
    }

    #[test]
    fn min() {
        assert_eq!(idr("60000").min(idr("50000")).unwrap(), idr("50000"));
        assert_eq!(idr("40000").min(idr("50000")).unwrap(), idr("40000"));
    }
}
