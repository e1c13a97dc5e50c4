//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing an entity cancellation.
#[derive(Clone, Copy, Debug)]
pub struct Cancellation;

/// Marker type describing an entity confirmation.
#[derive(Clone, Copy, Debug)]
pub struct Confirmation;

/// Marker type describing an entity expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;

/// Marker type describing an entity redemption.
#[derive(Clone, Copy, Debug)]
pub struct Redemption;

/// Marker type describing an entity start.
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// Marker type describing an entity end.
#[derive(Clone, Copy, Debug)]
pub struct End;
