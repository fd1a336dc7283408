//! Listener presence counter
//!
//! Counts connected SSE listeners. Each connection holds a guard for its
//! lifetime; the guard's drop deregisters, so an aborted stream can never
//! leak a count. Every change is announced as `ListenerCountChanged`.

use onair_common::clock;
use onair_common::events::{EventBus, RadioEvent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Shared presence counter
pub struct PresenceCounter {
    count: AtomicUsize,
    bus: Arc<EventBus>,
}

impl PresenceCounter {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            count: AtomicUsize::new(0),
            bus,
        }
    }

    /// Register one listener; the returned guard deregisters on drop
    pub fn register(self: &Arc<Self>) -> PresenceGuard {
        let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Listener connected; {} now present", count);
        self.announce(count);
        PresenceGuard {
            counter: Arc::clone(self),
        }
    }

    /// Current listener count
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    fn announce(&self, count: usize) {
        self.bus.emit_lossy(RadioEvent::ListenerCountChanged {
            count,
            timestamp: clock::now(),
        });
    }
}

/// RAII registration for one connected listener
pub struct PresenceGuard {
    counter: Arc<PresenceCounter>,
}

impl Drop for PresenceGuard {
    fn drop(&mut self) {
        let count = self.counter.count.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!("Listener disconnected; {} now present", count);
        self.counter.announce(count);
    }
}
