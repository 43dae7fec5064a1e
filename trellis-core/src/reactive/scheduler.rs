//! Effect Scheduler
//!
//! The scheduler batches re-runs of invalidated effects and orders them so
//! that ancestors settle their structure before descendants re-run.
//!
//! # Ordering
//!
//! Queued effects are drained in ascending block-depth order; effects at
//! the same depth run in the order they were scheduled. An effect already
//! in the queue is not queued twice.
//!
//! # Re-entrancy
//!
//! State written from inside a running effect body must not re-enter that
//! body. Every body run is bracketed by a run guard; while any run is in
//! progress on this thread, `flush` is a no-op and newly invalidated
//! effects stay queued until the outermost run completes.

use std::cell::{Cell, RefCell};

use tracing::trace;

use crate::reactive::effect::Effect;

thread_local! {
    static QUEUE: RefCell<Vec<(u64, Effect)>> = const { RefCell::new(Vec::new()) };
    static NEXT_SEQ: Cell<u64> = const { Cell::new(0) };
    static RUN_DEPTH: Cell<usize> = const { Cell::new(0) };
    static FLUSHING: Cell<bool> = const { Cell::new(false) };
}

/// Queue an effect for re-run.
///
/// Duplicate scheduling of an effect already in the queue is a no-op.
pub fn schedule(effect: Effect) {
    QUEUE.with(|queue| {
        let mut queue = queue.borrow_mut();
        if queue.iter().any(|(_, queued)| queued.id() == effect.id()) {
            return;
        }
        let seq = NEXT_SEQ.with(|seq| {
            let value = seq.get();
            seq.set(value + 1);
            value
        });
        trace!(effect = effect.id().raw(), "effect scheduled");
        queue.push((seq, effect));
    });
}

/// Drain the queue, re-running stale effects in ancestor-first order.
///
/// Does nothing while an effect body is running or a flush is already in
/// progress on this thread; the pending work is picked up when the
/// outermost run completes. A panic unwinding out of a body aborts the
/// drain; effects still queued are served by the next flush.
pub fn flush() {
    if RUN_DEPTH.with(Cell::get) > 0 {
        return;
    }
    if FLUSHING.with(|flushing| flushing.replace(true)) {
        return;
    }

    // Cleared on drop so a panic unwinding out of a body leaves the
    // scheduler able to serve later flushes.
    struct FlushGuard;

    impl Drop for FlushGuard {
        fn drop(&mut self) {
            FLUSHING.with(|flushing| flushing.set(false));
        }
    }

    let _guard = FlushGuard;

    loop {
        let next = QUEUE.with(|queue| {
            let mut queue = queue.borrow_mut();
            if queue.is_empty() {
                return None;
            }
            let mut best = 0;
            for index in 1..queue.len() {
                let (seq, effect) = &queue[index];
                let (best_seq, best_effect) = &queue[best];
                if (effect.depth(), *seq) < (best_effect.depth(), *best_seq) {
                    best = index;
                }
            }
            Some(queue.remove(best).1)
        });

        match next {
            Some(effect) => effect.rerun(),
            None => break,
        }
    }
}

/// Bracket an effect body run.
///
/// Nested runs stack; when the outermost run completes, any work that was
/// deferred during it is flushed. The depth counter is restored on unwind
/// so a panicking body does not wedge the scheduler.
pub(crate) fn with_run_guard<R>(f: impl FnOnce() -> R) -> R {
    struct Guard;

    impl Drop for Guard {
        fn drop(&mut self) {
            RUN_DEPTH.with(|depth| depth.set(depth.get() - 1));
        }
    }

    RUN_DEPTH.with(|depth| depth.set(depth.get() + 1));
    let guard = Guard;
    let out = f();
    drop(guard);

    if RUN_DEPTH.with(Cell::get) == 0 {
        flush();
    }

    out
}
