//! [`Seat`] definitions.

use std::{collections::BTreeSet, fmt, str::FromStr, sync::LazyLock};

use common::define_kind;
use derive_more::{Display, From, Into};
use regex::Regex;

/// Single seat of a cinema hall, identified by its [`Row`] letter and its
/// number within the row (e.g. `A1`).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Seat {
    /// [`Row`] this [`Seat`] is placed in.
    row: Row,

    /// [`Number`] of this [`Seat`] within its [`Row`].
    number: Number,
}

impl Seat {
    /// Creates a new [`Seat`] if the given `number` is valid.
    #[must_use]
    pub fn new(row: Row, number: Number) -> Option<Self> {
        (number > 0).then_some(Self { row, number })
    }

    /// Returns the [`Row`] of this [`Seat`].
    #[must_use]
    pub fn row(&self) -> Row {
        self.row
    }

    /// Returns the [`Number`] of this [`Seat`] within its [`Row`].
    #[must_use]
    pub fn number(&self) -> Number {
        self.number
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.number)
    }
}

impl FromStr for Seat {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        /// Regular expression checking a [`Seat`] identifier format: a single
        /// uppercase row letter followed by a 1- or 2-digit number without a
        /// leading zero.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^([A-Z])([1-9][0-9]?)$").expect("valid regex")
        });

        let captures = REGEX.captures(s).ok_or("invalid `Seat`")?;
        let row = captures[1]
            .chars()
            .next()
            .and_then(Row::new)
            .ok_or("invalid `Seat` row")?;
        let number =
            captures[2].parse().map_err(|_| "invalid `Seat` number")?;

        Self::new(row, number).ok_or("invalid `Seat`")
    }
}

/// Row letter of a [`Seat`] (`A`..=`Z`).
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Row(char);

impl Row {
    /// Creates a new [`Row`] if the given `letter` is an ASCII uppercase one.
    #[must_use]
    pub fn new(letter: char) -> Option<Self> {
        letter.is_ascii_uppercase().then_some(Self(letter))
    }
}

/// Number of a [`Seat`] within its [`Row`].
pub type Number = u8;

define_kind! {
    #[doc = "Pricing class of a [`Seat`]."]
    enum Class {
        #[doc = "Regular seat."]
        Regular = 1,

        #[doc = "VIP seat."]
        Vip = 2,

        #[doc = "Student seat."]
        Student = 3,
    }
}

/// Ordered set of [`Seat`]s.
#[derive(Clone, Debug, Default, Eq, From, Into, PartialEq)]
pub struct Seats(BTreeSet<Seat>);

impl Seats {
    /// Creates a new empty [`Seats`] set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether this [`Seats`] set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of [`Seat`]s in this set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether this set contains the given [`Seat`].
    #[must_use]
    pub fn contains(&self, seat: &Seat) -> bool {
        self.0.contains(seat)
    }

    /// Inserts the given [`Seat`] into this set, returning whether it was
    /// absent before.
    pub fn insert(&mut self, seat: Seat) -> bool {
        self.0.insert(seat)
    }

    /// Removes the given [`Seat`] from this set, returning whether it was
    /// present before.
    pub fn remove(&mut self, seat: &Seat) -> bool {
        self.0.remove(seat)
    }

    /// Returns an [`Iterator`] over the [`Seat`]s of this set, in their
    /// natural order.
    pub fn iter(&self) -> impl Iterator<Item = &Seat> {
        self.0.iter()
    }

    /// Returns whether this set intersects with the `other` one.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        !self.0.is_disjoint(&other.0)
    }
}

impl fmt::Display for Seats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for seat in &self.0 {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{seat}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromIterator<Seat> for Seats {
    fn from_iter<I: IntoIterator<Item = Seat>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Seats {
    type Item = Seat;
    type IntoIter = <BTreeSet<Seat> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Seats {
    type Item = &'a Seat;
    type IntoIter = <&'a BTreeSet<Seat> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use super::{Seat, Seats};

    #[test]
    fn from_str() {
        let seat = Seat::from_str("A1").unwrap();
        assert_eq!(seat.row().to_string(), "A");
        assert_eq!(seat.number(), 1);

        let seat = Seat::from_str("K42").unwrap();
        assert_eq!(seat.to_string(), "K42");

        assert!(Seat::from_str("a1").is_err());
        assert!(Seat::from_str("A0").is_err());
        assert!(Seat::from_str("A01").is_err());
        assert!(Seat::from_str("A100").is_err());
        assert!(Seat::from_str("AA1").is_err());
        assert!(Seat::from_str("1A").is_err());
        assert!(Seat::from_str("").is_err());
    }

    #[test]
    fn ordering_is_row_then_number() {
        let seats: Seats = ["B1", "A10", "A2", "B3"]
            .into_iter()
            .map(|s| s.parse().unwrap())
            .collect();

        assert_eq!(seats.to_string(), "A2, A10, B1, B3");
    }
}
