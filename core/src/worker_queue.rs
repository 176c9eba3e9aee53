//! Time-budgeted FIFO queues for deferred work.
//!
//! A [`WorkerQueue`] holds deferred actions and runs them strictly in enqueue
//! order, stopping once a time budget is spent. Whatever did not run stays
//! queued for the next invocation; nothing is ever dropped or reordered. This
//! keeps bulk work (entity teardown, GPU uploads, asset finalization) from
//! stalling the fixed logical tick.
//!
//! The queue is generic over a context type passed `&mut` to every action, so
//! one implementation serves plain cleanup actions (`Ctx = ()`), world-mutating
//! setup actions, and GL-thread upload actions.
//!
//! # Example
//!
//! ```
//! use silkweed_core::worker_queue::WorkerQueue;
//! use std::time::Duration;
//!
//! let queue: WorkerQueue<Vec<u32>> = WorkerQueue::new("setup");
//! queue.push(|v: &mut Vec<u32>| v.push(1));
//! queue.push(|v: &mut Vec<u32>| v.push(2));
//!
//! let mut ctx = Vec::new();
//! queue.run_for(&mut ctx, Duration::from_secs(1));
//! assert_eq!(ctx, vec![1, 2]);
//! assert!(queue.is_empty());
//! ```

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A deferred action taking the queue's context.
pub type QueueAction<Ctx> = Box<dyn FnOnce(&mut Ctx) + Send>;

/// FIFO queue of deferred actions with budgeted draining.
///
/// `Ctx` may be unsized, so a queue can be keyed to a trait object context
/// such as a render device.
pub struct WorkerQueue<Ctx: ?Sized = ()> {
    label: &'static str,
    actions: Mutex<VecDeque<QueueAction<Ctx>>>,
}

impl<Ctx: ?Sized> WorkerQueue<Ctx> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            actions: Mutex::new(VecDeque::new()),
        }
    }

    /// Name used in log messages.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Append an action to the back of the queue.
    pub fn push(&self, action: impl FnOnce(&mut Ctx) + Send + 'static) {
        self.actions.lock().unwrap().push_back(Box::new(action));
    }

    /// Run queued actions in FIFO order until the budget is spent.
    ///
    /// Elapsed time is checked after each action, so a non-empty queue always
    /// makes progress even with a zero budget. Returns the time actually
    /// spent. A panicking action is caught and logged; siblings still run and
    /// the queue stays usable.
    pub fn run_for(&self, ctx: &mut Ctx, budget: Duration) -> Duration {
        let started = Instant::now();
        loop {
            // The lock is not held while an action runs, so actions may push
            // further work onto this same queue.
            let action = self.actions.lock().unwrap().pop_front();
            let Some(action) = action else { break };
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| action(ctx))) {
                log::error!(
                    "deferred action in '{}' queue panicked: {}",
                    self.label,
                    panic_message(payload.as_ref())
                );
            }
            if started.elapsed() > budget {
                break;
            }
        }
        started.elapsed()
    }

    pub fn len(&self) -> usize {
        self.actions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.lock().unwrap().is_empty()
    }
}

impl WorkerQueue<()> {
    /// Run actions that take no context.
    pub fn run(&self, budget: Duration) -> Duration {
        self.run_for(&mut (), budget)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
