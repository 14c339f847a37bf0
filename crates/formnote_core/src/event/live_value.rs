//! Lifecycle-aware observable value.
//!
//! # Responsibility
//! - Hold the latest value and notify observers bound to a `Lifecycle`.
//! - Replay the last value to an observer that has not seen it yet, the same
//!   way a UI observation mechanism does after re-subscription.
//! - Deliver values that arrived while a scope was not started as soon as
//!   the scope starts.
//!
//! # Invariants
//! - Observers bound to a destroyed lifecycle are dropped, never notified.
//! - Each observer sees a given version at most once.
//! - Callbacks and resume hooks run without any internal lock held.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Identifier returned by [`LiveValue::observe`].
pub type ObserverId = u64;

type Callback<T> = Box<dyn FnMut(&T) + Send>;

/// Runs when a lifecycle (re)starts. Returns `false` once its target is gone.
type ResumeHook = Arc<dyn Fn() -> bool + Send + Sync>;

/// Observable lifecycle state of a UI scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Created but not yet visible.
    Initialized,
    /// Visible; observers bound to this scope receive values.
    Started,
    /// Temporarily hidden; deliveries are deferred.
    Stopped,
    /// Torn down. Terminal.
    Destroyed,
}

struct LifecycleInner {
    state: Mutex<LifecycleState>,
    // Keyed by the observed value slot, one hook per slot.
    resume_hooks: Mutex<Vec<(usize, ResumeHook)>>,
}

/// Shared handle to one UI scope's lifecycle.
///
/// Clones refer to the same scope. Starting the scope delivers pending
/// values to every observer bound to it.
#[derive(Clone)]
pub struct Lifecycle {
    inner: Arc<LifecycleInner>,
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("state", &self.state())
            .finish()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// Creates a lifecycle in `Initialized` state.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(LifecycleInner {
                state: Mutex::new(LifecycleState::Initialized),
                resume_hooks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Creates a lifecycle that is already started.
    pub fn started() -> Self {
        let lifecycle = Self::new();
        lifecycle.start();
        lifecycle
    }

    pub fn state(&self) -> LifecycleState {
        *lock(&self.inner.state)
    }

    /// Moves to `Started` unless destroyed, then delivers values observers
    /// of this scope missed while it was not started.
    pub fn start(&self) {
        let resumed = {
            let mut state = lock(&self.inner.state);
            match *state {
                LifecycleState::Destroyed | LifecycleState::Started => false,
                LifecycleState::Initialized | LifecycleState::Stopped => {
                    *state = LifecycleState::Started;
                    true
                }
            }
        };
        if resumed {
            self.run_resume_hooks();
        }
    }

    /// Moves to `Stopped` unless destroyed.
    pub fn stop(&self) {
        let mut state = lock(&self.inner.state);
        if *state != LifecycleState::Destroyed {
            *state = LifecycleState::Stopped;
        }
    }

    /// Moves to `Destroyed`. Later transitions are ignored.
    pub fn destroy(&self) {
        *lock(&self.inner.state) = LifecycleState::Destroyed;
        lock(&self.inner.resume_hooks).clear();
    }

    pub fn is_active(&self) -> bool {
        self.state() == LifecycleState::Started
    }

    pub fn is_destroyed(&self) -> bool {
        self.state() == LifecycleState::Destroyed
    }

    fn register_resume_hook(&self, key: usize, hook: ResumeHook) {
        if self.is_destroyed() {
            return;
        }
        let mut hooks = lock(&self.inner.resume_hooks);
        match hooks.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = hook,
            None => hooks.push((key, hook)),
        }
    }

    fn run_resume_hooks(&self) {
        let hooks = lock(&self.inner.resume_hooks).clone();
        let stale = hooks
            .into_iter()
            .filter(|(_, hook)| !hook())
            .map(|(key, _)| key)
            .collect::<Vec<_>>();
        if !stale.is_empty() {
            lock(&self.inner.resume_hooks).retain(|(key, _)| !stale.contains(key));
        }
    }
}

struct ObserverSlot<T> {
    id: ObserverId,
    lifecycle: Lifecycle,
    last_version: u64,
    // `None` while the callback is running outside the lock.
    callback: Option<Callback<T>>,
}

struct LiveState<T> {
    value: Option<T>,
    version: u64,
    next_observer_id: ObserverId,
    observers: Vec<ObserverSlot<T>>,
}

impl<T> LiveState<T> {
    fn prune_destroyed(&mut self) {
        self.observers.retain(|slot| !slot.lifecycle.is_destroyed());
    }
}

/// Observable value slot with lifecycle-bound observers.
pub struct LiveValue<T> {
    state: Arc<Mutex<LiveState<T>>>,
}

impl<T> Default for LiveValue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LiveValue<T> {
    /// Creates an empty value slot.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LiveState {
                value: None,
                version: 0,
                next_observer_id: 1,
                observers: Vec::new(),
            })),
        }
    }

    /// Returns whether any observer with a live lifecycle is registered.
    pub fn has_observers(&self) -> bool {
        let mut state = lock(&self.state);
        state.prune_destroyed();
        !state.observers.is_empty()
    }

    /// Removes one observer. Returns `false` when it was already gone.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut state = lock(&self.state);
        let before = state.observers.len();
        state.observers.retain(|slot| slot.id != id);
        state.observers.len() != before
    }
}

impl<T: Clone + Send + 'static> LiveValue<T> {
    /// Returns a copy of the latest value.
    pub fn value(&self) -> Option<T> {
        lock(&self.state).value.clone()
    }

    /// Stores a new value and notifies every started observer.
    pub fn set_value(&self, value: T) {
        {
            let mut state = lock(&self.state);
            state.value = Some(value);
            state.version += 1;
        }
        dispatch(&self.state, None);
    }

    /// Registers `callback` for values while `lifecycle` is started.
    ///
    /// Returns `None` and registers nothing when the lifecycle is already
    /// destroyed. When started and a value exists that this observer has not
    /// seen, the value is replayed before this call returns; otherwise it is
    /// delivered when the lifecycle starts.
    pub fn observe<F>(&self, lifecycle: &Lifecycle, callback: F) -> Option<ObserverId>
    where
        F: FnMut(&T) + Send + 'static,
    {
        if lifecycle.is_destroyed() {
            return None;
        }

        let id = {
            let mut state = lock(&self.state);
            let id = state.next_observer_id;
            state.next_observer_id += 1;
            state.observers.push(ObserverSlot {
                id,
                lifecycle: lifecycle.clone(),
                last_version: 0,
                callback: Some(Box::new(callback)),
            });
            id
        };

        let slot = Arc::downgrade(&self.state);
        lifecycle.register_resume_hook(
            Arc::as_ptr(&self.state) as usize,
            Arc::new(move || match slot.upgrade() {
                Some(state) => {
                    dispatch(&state, None);
                    true
                }
                None => false,
            }),
        );

        dispatch(&self.state, Some(id));
        Some(id)
    }

    /// Delivers the latest value to started observers that missed it.
    pub fn dispatch_pending(&self) {
        dispatch(&self.state, None);
    }
}

fn dispatch<T: Clone>(live: &Mutex<LiveState<T>>, target: Option<ObserverId>) {
    loop {
        let (value, mut due) = {
            let mut state = lock(live);
            state.prune_destroyed();
            let Some(value) = state.value.clone() else {
                return;
            };
            let version = state.version;

            let mut due = Vec::new();
            for slot in state.observers.iter_mut() {
                if target.is_some_and(|id| id != slot.id) {
                    continue;
                }
                if slot.last_version >= version || !slot.lifecycle.is_active() {
                    continue;
                }
                if let Some(callback) = slot.callback.take() {
                    slot.last_version = version;
                    due.push((slot.id, callback));
                }
            }
            (value, due)
        };

        if due.is_empty() {
            return;
        }

        for (_, callback) in due.iter_mut() {
            callback(&value);
        }

        let mut state = lock(live);
        for (id, callback) in due {
            if let Some(slot) = state.observers.iter_mut().find(|slot| slot.id == id) {
                slot.callback = Some(callback);
            }
        }
        // Loop again: a callback may have published a newer version.
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::{Lifecycle, LifecycleState, LiveValue};
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<i32>>>, impl FnMut(&i32) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |value: &i32| sink.lock().unwrap().push(*value))
    }

    #[test]
    fn destroyed_lifecycle_is_terminal() {
        let lifecycle = Lifecycle::started();
        lifecycle.destroy();
        lifecycle.start();
        assert_eq!(lifecycle.state(), LifecycleState::Destroyed);
    }

    #[test]
    fn replays_last_value_to_new_observer() {
        let live = LiveValue::new();
        live.set_value(1);
        live.set_value(2);

        let (seen, callback) = recorder();
        live.observe(&Lifecycle::started(), callback)
            .expect("observer registered");
        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn stopped_observer_catches_up_after_restart() {
        let live = LiveValue::new();
        let lifecycle = Lifecycle::started();
        let (seen, callback) = recorder();
        live.observe(&lifecycle, callback).expect("observer registered");

        lifecycle.stop();
        live.set_value(7);
        assert!(seen.lock().unwrap().is_empty());

        lifecycle.start();
        assert_eq!(*seen.lock().unwrap(), vec![7]);

        live.dispatch_pending();
        lifecycle.start();
        assert_eq!(*seen.lock().unwrap(), vec![7]);
    }

    #[test]
    fn starting_initialized_scope_delivers_earlier_value() {
        let live = LiveValue::new();
        let lifecycle = Lifecycle::new();
        let (seen, callback) = recorder();
        live.observe(&lifecycle, callback).expect("observer registered");

        live.set_value(5);
        assert!(seen.lock().unwrap().is_empty());

        lifecycle.start();
        assert_eq!(*seen.lock().unwrap(), vec![5]);
    }

    #[test]
    fn dropped_value_slot_does_not_block_start() {
        let lifecycle = Lifecycle::new();
        {
            let live = LiveValue::<i32>::new();
            live.observe(&lifecycle, |_| {}).expect("observer registered");
        }
        lifecycle.start();
        assert!(lifecycle.is_active());
    }

    #[test]
    fn destroyed_observers_are_pruned() {
        let live = LiveValue::<i32>::new();
        let lifecycle = Lifecycle::started();
        live.observe(&lifecycle, |_| {}).expect("observer registered");
        assert!(live.has_observers());

        lifecycle.destroy();
        assert!(!live.has_observers());
        assert!(live.observe(&lifecycle, |_| {}).is_none());
    }

    #[test]
    fn callback_may_set_value_reentrantly() {
        let live = Arc::new(LiveValue::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let inner = Arc::clone(&live);
        live.observe(&Lifecycle::started(), move |value: &i32| {
            sink.lock().unwrap().push(*value);
            if *value < 3 {
                inner.set_value(*value + 1);
            }
        })
        .expect("observer registered");

        live.set_value(1);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(live.value(), Some(3));
    }
}
