//! Permission gate contract, API-level guard and in-memory gate.

use crate::config::CoreConfig;
use crate::permission::kind::PermissionKind;
use log::{debug, info};
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Callback receiving whether a requested permission was granted.
pub type PermissionCallback = Box<dyn FnOnce(bool) + Send>;

/// Capability-check interface implemented by the host platform.
pub trait PermissionGate {
    fn has_permission(&self, kind: PermissionKind) -> bool;
    /// Asks the platform for `kind`; `on_result` runs once with the outcome.
    fn request_permission(&self, kind: PermissionKind, on_result: PermissionCallback);
}

/// Gate wrapper applying platform API-level rules.
pub struct PermissionGuard<G> {
    gate: G,
    api_level: u32,
}

impl<G: PermissionGate> PermissionGuard<G> {
    pub fn new(gate: G, api_level: u32) -> Self {
        Self { gate, api_level }
    }

    /// Applies the rules of the platform level configured for this host.
    pub fn from_config(gate: G, config: &CoreConfig) -> Self {
        Self::new(gate, config.platform_api_level)
    }

    pub fn inner(&self) -> &G {
        &self.gate
    }
}

impl<G: PermissionGate> PermissionGate for PermissionGuard<G> {
    fn has_permission(&self, kind: PermissionKind) -> bool {
        !kind.requires_runtime_grant(self.api_level) || self.gate.has_permission(kind)
    }

    /// Forwards to the platform only when a grant is actually missing;
    /// otherwise answers `true` immediately.
    fn request_permission(&self, kind: PermissionKind, on_result: PermissionCallback) {
        if self.has_permission(kind) {
            debug!(
                "event=permission_request module=permission status=skipped kind={kind} api_level={}",
                self.api_level
            );
            on_result(true);
            return;
        }

        info!(
            "event=permission_request module=permission status=start kind={kind} api_level={}",
            self.api_level
        );
        self.gate.request_permission(
            kind,
            Box::new(move |granted| {
                info!(
                    "event=permission_request module=permission status=ok kind={kind} granted={granted}"
                );
                on_result(granted);
            }),
        );
    }
}

/// In-process gate for hosts without a platform permission system.
///
/// Requests resolve synchronously to a fixed answer; a positive answer is
/// remembered as a grant.
#[derive(Debug)]
pub struct MemoryPermissionGate {
    granted: Mutex<BTreeSet<PermissionKind>>,
    requested: Mutex<Vec<PermissionKind>>,
    answer: bool,
}

impl MemoryPermissionGate {
    pub fn new(answer: bool) -> Self {
        Self {
            granted: Mutex::new(BTreeSet::new()),
            requested: Mutex::new(Vec::new()),
            answer,
        }
    }

    /// Creates a gate with `kinds` already granted.
    pub fn with_granted(answer: bool, kinds: impl IntoIterator<Item = PermissionKind>) -> Self {
        let gate = Self::new(answer);
        lock(&gate.granted).extend(kinds);
        gate
    }

    pub fn grant(&self, kind: PermissionKind) {
        lock(&self.granted).insert(kind);
    }

    pub fn revoke(&self, kind: PermissionKind) {
        lock(&self.granted).remove(&kind);
    }

    /// Kinds forwarded to `request_permission`, in call order.
    pub fn requested(&self) -> Vec<PermissionKind> {
        lock(&self.requested).clone()
    }
}

impl PermissionGate for MemoryPermissionGate {
    fn has_permission(&self, kind: PermissionKind) -> bool {
        lock(&self.granted).contains(&kind)
    }

    fn request_permission(&self, kind: PermissionKind, on_result: PermissionCallback) {
        lock(&self.requested).push(kind);
        if self.answer {
            self.grant(kind);
        }
        on_result(self.answer);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
