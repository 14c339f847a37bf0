//! Single-fire event channel.
//!
//! # Responsibility
//! - Deliver each published value to one observer exactly once.
//! - Survive observer detach/re-attach (UI scope torn down and recreated)
//!   without redelivering stale values and without losing values published
//!   while nobody was attached.
//!
//! # Invariants
//! - At most one observer is attached at a time. A second attach is a
//!   programming error and fails fast.
//! - Every notification from the underlying [`LiveValue`] goes through one
//!   atomic `pending: true -> false` swap; only the winner reaches the
//!   observer. Replays of an already consumed value are swallowed.
//! - Publishing twice before delivery keeps only the latest value.

use crate::event::live_value::{Lifecycle, LiveValue, ObserverId};
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Attach-time failures of a [`SingleFireEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventChannelError {
    /// Another observer is still attached.
    ObserverAlreadyAttached,
    /// The lifecycle was destroyed before attaching.
    LifecycleDestroyed,
}

impl Display for EventChannelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ObserverAlreadyAttached => write!(
                f,
                "multiple observers registered but only one will be notified of changes"
            ),
            Self::LifecycleDestroyed => {
                write!(f, "cannot attach an observer to a destroyed lifecycle")
            }
        }
    }
}

impl Error for EventChannelError {}

/// Event holder notifying a single observer once per publication.
///
/// A `None` payload is the "no data" signal produced by
/// [`SingleFireEvent::publish_empty`].
pub struct SingleFireEvent<T> {
    live: LiveValue<Option<T>>,
    pending: Arc<AtomicBool>,
    attached: Mutex<Option<ObserverId>>,
}

impl<T> Default for SingleFireEvent<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SingleFireEvent<T> {
    pub fn new() -> Self {
        Self {
            live: LiveValue::new(),
            pending: Arc::new(AtomicBool::new(false)),
            attached: Mutex::new(None),
        }
    }

    /// Returns whether a publication still awaits delivery.
    pub fn has_pending_event(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Cancels a pending delivery without notifying anyone.
    pub fn clear_pending(&self) {
        self.pending.store(false, Ordering::Release);
    }

    /// Returns whether an observer with a live lifecycle is attached.
    pub fn has_observer(&self) -> bool {
        self.live.has_observers()
    }

    /// Detaches the current observer, if any.
    pub fn detach_observer(&self) {
        if let Some(id) = self.attached_slot().take() {
            self.live.remove_observer(id);
        }
    }

    fn attached_slot(&self) -> MutexGuard<'_, Option<ObserverId>> {
        self.attached.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Send + 'static> SingleFireEvent<T> {
    /// Publishes `value` and arms exactly one future delivery.
    pub fn publish(&self, value: T) {
        self.publish_inner(Some(value));
    }

    /// Publishes the payload-less signal.
    pub fn publish_empty(&self) {
        self.publish_inner(None);
    }

    /// Attaches the single observer for this channel.
    ///
    /// Returns `None` when `lifecycle` is already destroyed.
    ///
    /// # Panics
    /// Panics when another observer is still attached. Fan-out of
    /// single-fire events is a bug in the caller.
    pub fn attach_observer<F>(&self, lifecycle: &Lifecycle, observer: F) -> Option<ObserverId>
    where
        F: FnMut(Option<&T>) + Send + 'static,
    {
        match self.try_attach_observer(lifecycle, observer) {
            Ok(id) => Some(id),
            Err(EventChannelError::LifecycleDestroyed) => None,
            Err(err @ EventChannelError::ObserverAlreadyAttached) => panic!("{err}"),
        }
    }

    /// Non-panicking variant of [`SingleFireEvent::attach_observer`] for
    /// boundaries that must never unwind.
    pub fn try_attach_observer<F>(
        &self,
        lifecycle: &Lifecycle,
        mut observer: F,
    ) -> Result<ObserverId, EventChannelError>
    where
        F: FnMut(Option<&T>) + Send + 'static,
    {
        if self.live.has_observers() {
            warn!(
                "event=observer_attach module=event status=error error_code=observer_already_attached"
            );
            return Err(EventChannelError::ObserverAlreadyAttached);
        }

        let pending = Arc::clone(&self.pending);
        let id = self
            .live
            .observe(lifecycle, move |value: &Option<T>| {
                if pending
                    .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    observer(value.as_ref());
                }
            })
            .ok_or(EventChannelError::LifecycleDestroyed)?;

        *self.attached_slot() = Some(id);
        debug!("event=observer_attach module=event status=ok observer_id={id}");
        Ok(id)
    }

    /// Delivers a pending value after the observer's lifecycle resumed.
    pub fn dispatch_pending(&self) {
        self.live.dispatch_pending();
    }

    fn publish_inner(&self, value: Option<T>) {
        self.pending.store(true, Ordering::Release);
        self.live.set_value(value);
    }
}
