//! Deferred finalization queue for collector-scheduled hosts.
//!
//! ## Problem
//!
//! A tracing collector does not finalize an object the instant it becomes
//! unreachable. It finalizes later, at a time of its own choosing, and
//! finalizers must cope with running whenever that is.
//!
//! ## Solution
//!
//! Objects whose last reference dropped are queued instead of finalized. The
//! host drains the queue from `run_gc()`. Draining may queue more objects
//! (a finalizer releasing the last reference to something else); those are
//! picked up by the same drain.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::gc::DeferredFinalizationQueue;
//!
//! let queue = DeferredFinalizationQueue::new();
//!
//! // Refcount hit zero while in deferred mode
//! queue.defer(object_id);
//!
//! // Later, from the collector
//! let finalized = queue.process_all(|id| heap.finalize(id));
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

/// Single-threaded FIFO of objects awaiting finalization.
pub struct DeferredFinalizationQueue<T> {
    /// Queue of objects pending finalization
    queue: RefCell<VecDeque<T>>,

    /// Fast check for pending items (avoids borrowing the queue on hot path)
    pending_count: Cell<u64>,
}

impl<T> Default for DeferredFinalizationQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DeferredFinalizationQueue<T> {
    /// Create a new empty queue.
    pub fn new() -> Self {
        Self {
            queue: RefCell::new(VecDeque::with_capacity(8)),
            pending_count: Cell::new(0),
        }
    }

    /// Queue an object for finalization on the next drain.
    pub fn defer(&self, item: T) {
        self.queue.borrow_mut().push_back(item);
        self.pending_count.set(self.pending_count.get() + 1);

        log::trace!("Deferred finalization (pending: {})", self.len());
    }

    #[inline]
    pub fn has_pending(&self) -> bool {
        self.pending_count.get() > 0
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.pending_count.get()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.has_pending()
    }

    /// Finalize everything pending, including items queued while draining.
    ///
    /// `finalize` runs with no borrow of the queue held, so it may call
    /// [`defer`](Self::defer). Returns the number of items processed.
    pub fn process_all(&self, mut finalize: impl FnMut(T)) -> u64 {
        // Fast path: nothing pending
        if !self.has_pending() {
            return 0;
        }

        let mut processed = 0u64;

        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(item) = next else {
                break;
            };

            self.pending_count.set(self.pending_count.get() - 1);
            finalize(item);
            processed += 1;
        }

        if processed > 0 {
            log::trace!("Processed {} deferred finalizations", processed);
        }

        processed
    }
}

impl<T> fmt::Debug for DeferredFinalizationQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredFinalizationQueue")
            .field("pending_count", &self.len())
            .finish()
    }
}
