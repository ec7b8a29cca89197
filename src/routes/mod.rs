/// Router Module Index
///
/// Organizes the application's routing into access-segregated modules so the
/// gates are applied explicitly at the module boundary: the session gate wraps
/// everything in `authenticated`, and the admin router additionally passes
/// through the role gate.

/// Routes accessible to all callers, anonymous included. Content handlers in
/// this module only ever surface published rows.
pub mod public;

/// Routes behind the session gate. An unauthenticated request never reaches
/// these handlers; it is redirected to the login path by the gate.
pub mod authenticated;

/// Routes behind both gates, restricted to callers whose role set intersects
/// the admin allow-list.
pub mod admin;
