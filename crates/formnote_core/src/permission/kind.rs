//! Platform permission kinds used by the app.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Platform API level from which notifications need a runtime grant.
pub const NOTIFICATION_RUNTIME_GRANT_API_LEVEL: u32 = 33;

/// Permission the app may ask the platform for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionKind {
    Notification,
    Camera,
}

impl PermissionKind {
    /// Stable string id used across the FFI boundary.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Notification => PERMISSION_NOTIFICATION,
            Self::Camera => PERMISSION_CAMERA,
        }
    }

    /// Whether the platform at `api_level` gates this kind behind a runtime
    /// grant. Kinds that are not gated count as granted.
    pub fn requires_runtime_grant(self, api_level: u32) -> bool {
        match self {
            Self::Notification => api_level >= NOTIFICATION_RUNTIME_GRANT_API_LEVEL,
            Self::Camera => true,
        }
    }
}

impl Display for PermissionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String id for the notification permission.
pub const PERMISSION_NOTIFICATION: &str = "notification";
/// String id for the camera permission.
pub const PERMISSION_CAMERA: &str = "camera";

/// Parses a permission kind from its string id.
pub fn parse_permission_kind(value: &str) -> Result<PermissionKind, PermissionKindError> {
    match value.trim() {
        "" => Err(PermissionKindError::EmptyKind),
        PERMISSION_NOTIFICATION => Ok(PermissionKind::Notification),
        PERMISSION_CAMERA => Ok(PermissionKind::Camera),
        other => Err(PermissionKindError::UnsupportedKind(other.to_string())),
    }
}

/// Permission kind parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionKindError {
    EmptyKind,
    UnsupportedKind(String),
}

impl Display for PermissionKindError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyKind => write!(f, "permission kind must not be empty"),
            Self::UnsupportedKind(value) => write!(f, "permission kind is unsupported: {value}"),
        }
    }
}

impl Error for PermissionKindError {}
