/// Router Module Index
///
/// Routes are grouped by the capability tier they require. Each group gets its
/// access check as a `route_layer` in `create_router`, so a handler can never be
/// mounted without the check for its tier.

/// Routes accessible without credentials (banner, API document).
pub mod public;

/// Routes behind the read-tier check.
pub mod read;

/// Routes behind the write-tier check.
pub mod write;
