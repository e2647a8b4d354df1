//! Singleton slots with exactly-once construction.
//!
//! Every singleton registration owns a [`SingletonSlot`]. A Ready slot is read
//! through its `OnceCell` without taking a lock. The first request moves the
//! slot to `Building(thread)` and constructs outside the lock; concurrent first
//! requests park on the slot's condition variable and observe the same
//! instance. A failed or panicking build puts the slot back to `Unbuilt`.
//!
//! Parking on a slot another thread is building can deadlock when that thread
//! transitively waits for a slot the parker is building itself. The
//! [`BuildCoordinator`] keeps the wait-for graph (slot -> owner thread -> slot
//! that thread waits on ...) and refuses to park when the walk leads back to
//! the caller, reporting `CircularDependency` instead.
//!
//! Lock order: a slot's state mutex, then the coordinator graph. The graph
//! lock is never held while acquiring a slot lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, ThreadId};

use once_cell::sync::OnceCell;
use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::registration::AnyArc;

static NEXT_SLOT_ID: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Unbuilt,
    Building(ThreadId),
}

/// Cache entry for one singleton registration.
pub(crate) struct SingletonSlot {
    id: usize,
    value: OnceCell<AnyArc>,
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl SingletonSlot {
    pub(crate) fn new() -> Self {
        Self {
            id: NEXT_SLOT_ID.fetch_add(1, Ordering::Relaxed),
            value: OnceCell::new(),
            state: Mutex::new(SlotState::Unbuilt),
            ready: Condvar::new(),
        }
    }

    /// The cached instance, if the slot is Ready.
    #[inline(always)]
    pub(crate) fn get(&self) -> Option<&AnyArc> {
        self.value.get()
    }

    /// Returns the cached instance or runs `build` exactly once to produce it.
    ///
    /// `key` names the slot in cycle reports.
    pub(crate) fn get_or_build<F>(&self, key: &Key, coordinator: &BuildCoordinator, build: F) -> DiResult<AnyArc>
    where
        F: FnOnce() -> DiResult<AnyArc>,
    {
        // Fast path: no lock once Ready
        if let Some(value) = self.value.get() {
            return Ok(value.clone());
        }

        let me = thread::current().id();
        let mut state = self.state.lock();
        loop {
            if let Some(value) = self.value.get() {
                return Ok(value.clone());
            }
            match *state {
                SlotState::Unbuilt => {
                    *state = SlotState::Building(me);
                    coordinator.claim(self.id, me, key);
                    break;
                }
                SlotState::Building(owner) if owner == me => {
                    // Re-entered through a resolver that lost the frame chain
                    return Err(DiError::CircularDependency(vec![key.clone(), key.clone()]));
                }
                SlotState::Building(owner) => {
                    coordinator.park(me, self.id, owner, key)?;
                    trace!(service = %key, "waiting for singleton built on another thread");
                    self.ready.wait(&mut state);
                    coordinator.unpark(me);
                }
            }
        }
        drop(state);

        let guard = BuildGuard {
            slot: self,
            coordinator,
        };
        let value = build()?;
        let stored = self.value.get_or_init(|| value).clone();
        drop(guard);
        Ok(stored)
    }
}

/// Releases the Building claim whether the build succeeded, failed or panicked.
struct BuildGuard<'a> {
    slot: &'a SingletonSlot,
    coordinator: &'a BuildCoordinator,
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.slot.state.lock();
        *state = SlotState::Unbuilt;
        self.coordinator.release(self.slot.id);
        drop(state);
        self.slot.ready.notify_all();
    }
}

#[derive(Default)]
struct WaitGraph {
    // slot id -> thread building it, with the slot's key for reports
    owners: HashMap<usize, (ThreadId, Key)>,
    // thread -> slot id it is parked on
    waiting: HashMap<ThreadId, usize>,
}

/// Wait-for graph shared by all slots of one provider.
#[derive(Default)]
pub(crate) struct BuildCoordinator {
    graph: Mutex<WaitGraph>,
}

impl BuildCoordinator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn claim(&self, slot: usize, thread: ThreadId, key: &Key) {
        self.graph.lock().owners.insert(slot, (thread, key.clone()));
    }

    fn release(&self, slot: usize) {
        self.graph.lock().owners.remove(&slot);
    }

    /// Records that `me` is about to park on `slot` owned by `owner`, unless
    /// doing so closes a cycle.
    fn park(&self, me: ThreadId, slot: usize, owner: ThreadId, key: &Key) -> DiResult<()> {
        let mut graph = self.graph.lock();
        let mut chain = vec![key.clone()];
        let mut current = owner;
        // Each thread parks on at most one slot, so the walk visits each thread once
        for _ in 0..=graph.waiting.len() {
            if current == me {
                chain.push(key.clone());
                return Err(DiError::CircularDependency(chain));
            }
            let Some(next_slot) = graph.waiting.get(&current).copied() else {
                break;
            };
            let Some((next_owner, next_key)) = graph.owners.get(&next_slot) else {
                break;
            };
            chain.push(next_key.clone());
            current = *next_owner;
        }
        graph.waiting.insert(me, slot);
        Ok(())
    }

    fn unpark(&self, me: ThreadId) {
        self.graph.lock().waiting.remove(&me);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    #[test]
    fn builds_once_and_caches() {
        let slot = SingletonSlot::new();
        let coordinator = BuildCoordinator::new();
        let key = Key::of::<u32>();
        let calls = AtomicUsize::new(0);
        let build = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(7u32) as AnyArc)
        };
        let a = slot.get_or_build(&key, &coordinator, build).unwrap();
        let b = slot
            .get_or_build(&key, &coordinator, || Ok(Arc::new(8u32) as AnyArc))
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_build_leaves_slot_unbuilt() {
        let slot = SingletonSlot::new();
        let coordinator = BuildCoordinator::new();
        let key = Key::of::<u32>();
        let err = slot
            .get_or_build(&key, &coordinator, || Err(DiError::construction(key.clone(), "boom")))
            .unwrap_err();
        assert!(matches!(err, DiError::Construction { .. }));
        assert!(slot.get().is_none());
        assert_eq!(*slot.state.lock(), SlotState::Unbuilt);

        let value = slot
            .get_or_build(&key, &coordinator, || Ok(Arc::new(1u32) as AnyArc))
            .unwrap();
        assert_eq!(*value.downcast::<u32>().unwrap(), 1);
    }

    #[test]
    fn panicking_build_resets_slot() {
        let slot = SingletonSlot::new();
        let coordinator = BuildCoordinator::new();
        let key = Key::of::<u32>();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = slot.get_or_build(&key, &coordinator, || panic!("factory panicked"));
        }));
        assert!(result.is_err());
        assert_eq!(*slot.state.lock(), SlotState::Unbuilt);
        assert!(coordinator.graph.lock().owners.is_empty());
    }

    #[test]
    fn same_thread_reentry_is_circular() {
        let slot = SingletonSlot::new();
        let coordinator = BuildCoordinator::new();
        let key = Key::of::<u32>();
        let err = slot
            .get_or_build(&key, &coordinator, || {
                slot.get_or_build(&key, &coordinator, || Ok(Arc::new(0u32) as AnyArc))
            })
            .unwrap_err();
        assert!(matches!(err, DiError::CircularDependency(chain) if chain.len() == 2));
    }

    #[test]
    fn concurrent_waiters_share_one_build() {
        let slot = Arc::new(SingletonSlot::new());
        let coordinator = Arc::new(BuildCoordinator::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let (slot, coordinator, calls, barrier) =
                    (slot.clone(), coordinator.clone(), calls.clone(), barrier.clone());
                thread::spawn(move || {
                    barrier.wait();
                    slot.get_or_build(&Key::of::<u64>(), &coordinator, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(20));
                        Ok(Arc::new(42u64) as AnyArc)
                    })
                    .unwrap()
                })
            })
            .collect();

        let values: Vec<AnyArc> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(values.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert!(coordinator.graph.lock().waiting.is_empty());
    }
}
