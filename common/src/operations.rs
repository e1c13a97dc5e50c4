//! Abstract operations.
//!
//! Mutating operations upon shared keyed resources ([`Claim`], [`Release`],
//! [`Cancel`], [`Confirm`], [`Redeem`], [`Refund`]) are conditional
//! check-and-set operations: the implementor validates and mutates in a
//! single atomic step, never as a read-then-write sequence.

use std::marker::PhantomData;

/// Operation to insert a value.
#[derive(Clone, Copy, Debug)]
pub struct Insert<T>(pub T);

/// Operation to delete a value.
#[derive(Clone, Copy, Debug)]
pub struct Delete<T>(pub T);

/// Operation to select a value.
#[derive(Clone, Copy, Debug)]
pub struct Select<T>(pub T);

/// Operation to claim a part of a value exclusively.
#[derive(Clone, Copy, Debug)]
pub struct Claim<T>(pub T);

/// Operation to release a previously [`Claim`]ed part of a value.
#[derive(Clone, Copy, Debug)]
pub struct Release<T>(pub T);

/// Operation to cancel a value.
#[derive(Clone, Copy, Debug)]
pub struct Cancel<T>(pub T);

/// Operation to confirm a value.
#[derive(Clone, Copy, Debug)]
pub struct Confirm<T>(pub T);

/// Operation to redeem a value, consuming one use of it.
#[derive(Clone, Copy, Debug)]
pub struct Redeem<T>(pub T);

/// Operation to refund a previously [`Redeem`]ed use of a value.
#[derive(Clone, Copy, Debug)]
pub struct Refund<T>(pub T);

/// Operation to start a value.
#[derive(Clone, Copy, Debug)]
pub struct Start<T>(pub T);

/// Operation to perform a value.
#[derive(Clone, Copy, Debug)]
pub struct Perform<T>(pub T);

/// Selector of `W` by `B`.
#[derive(Clone, Copy, Debug)]
pub struct By<W, B> {
    /// Type of the value to select.
    _what: PhantomData<W>,

    /// Value to select by.
    by: B,
}

impl<W, B> By<W, B> {
    /// Creates a new [`By`] with the given value.
    #[must_use]
    pub fn new(by: B) -> Self {
        Self {
            _what: PhantomData,
            by,
        }
    }

    /// Consumes this [`By`] and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.by
    }
}
