//! Platform permission collaborators.
//!
//! Permission checks and requests are owned by the host platform; core only
//! sees them through [`PermissionGate`]. [`PermissionGuard`] adds the
//! API-level rules so callers never prompt for a grant the platform does not
//! gate.

pub mod gate;
pub mod kind;
