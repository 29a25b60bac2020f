// ABOUTME: FIFO concurrency gate bounding how many logical requests are in flight.
// ABOUTME: Slots are held by RAII permits; release hands the slot to the oldest waiter.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

#[derive(Debug)]
struct Waiter {
    id: u64,
    grant: oneshot::Sender<()>,
}

#[derive(Debug)]
struct GateState {
    active: usize,
    limit: usize,
    queue: VecDeque<Waiter>,
    next_waiter_id: u64,
}

impl GateState {
    /// Grant slots to queued waiters, oldest first, while capacity remains.
    fn dispatch(&mut self) {
        while self.active < self.limit {
            let Some(waiter) = self.queue.pop_front() else {
                break;
            };
            // A closed receiver means the waiter already gave up; skip it.
            if waiter.grant.send(()).is_ok() {
                self.active += 1;
            }
        }
    }

    fn release(&mut self) {
        self.active = self.active.saturating_sub(1);
        self.dispatch();
    }
}

/// Bounded gate with strictly FIFO waiters.
///
/// The limit is supplied on every [`acquire`](Self::acquire) and the latest
/// value wins for everyone. Lowering it never revokes held slots; it only
/// stops new grants until enough permits are dropped.
///
/// The state lock is a synchronous mutex held only for short bookkeeping, so
/// permits can release from `Drop` on every exit path, including panics and
/// cancelled futures.
#[derive(Clone)]
pub struct ConcurrencyGate {
    state: Arc<Mutex<GateState>>,
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ConcurrencyGate {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(GateState {
                active: 0,
                limit: 1,
                queue: VecDeque::new(),
                next_waiter_id: 0,
            })),
        }
    }

    /// Wait for a slot under a limit of `max_concurrency` (at least 1).
    pub async fn acquire(&self, max_concurrency: usize) -> GatePermit {
        let (id, granted) = {
            let mut state = self.state.lock();
            state.limit = max_concurrency.max(1);

            if state.queue.is_empty() && state.active < state.limit {
                state.active += 1;
                return self.permit();
            }

            let id = state.next_waiter_id;
            state.next_waiter_id += 1;
            let (grant, granted) = oneshot::channel();
            state.queue.push_back(Waiter { id, grant });
            // A raised limit may leave room for the waiters already queued.
            state.dispatch();
            (id, granted)
        };

        let mut pending = PendingWaiter {
            state: Arc::clone(&self.state),
            id,
            granted,
            armed: true,
        };
        // The sender lives in the queue until it is used, and the queue is
        // kept alive by our Arc, so the channel cannot close unsent.
        let _ = (&mut pending.granted).await;
        pending.armed = false;

        self.permit()
    }

    /// Number of slots currently held.
    pub fn active(&self) -> usize {
        self.state.lock().active
    }

    /// Number of callers waiting for a slot.
    pub fn queued(&self) -> usize {
        self.state.lock().queue.len()
    }

    fn permit(&self) -> GatePermit {
        GatePermit {
            state: Arc::clone(&self.state),
        }
    }
}

/// A held slot. Dropping it releases the slot.
#[derive(Debug)]
pub struct GatePermit {
    state: Arc<Mutex<GateState>>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.state.lock().release();
    }
}

/// Cleans up after an `acquire` future dropped while waiting.
///
/// Owns the receiver so that it outlives the check in `drop`: a waiter that
/// is no longer queued was therefore granted a slot.
struct PendingWaiter {
    state: Arc<Mutex<GateState>>,
    id: u64,
    granted: oneshot::Receiver<()>,
    armed: bool,
}

impl Drop for PendingWaiter {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock();
        if let Some(pos) = state.queue.iter().position(|w| w.id == self.id) {
            state.queue.remove(pos);
        } else {
            // Granted but never observed: hand the slot on.
            state.release();
        }
    }
}
