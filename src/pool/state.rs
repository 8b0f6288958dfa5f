// src/pool/state.rs

//! Pure pool state.
//!
//! Everything in here is synchronous bookkeeping: the waiting queue, the
//! running set, the admission step and the various flags and counters the
//! async shell in [`scheduler`](super::scheduler) consults. Nothing in this
//! module suspends or spawns, which keeps the admission arithmetic trivially
//! unit-testable.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::time::Duration;

use crate::pool::{PoolOptions, PoolStats};
use crate::task::{BoxTaskFactory, TaskId};

/// Mutable state shared between the pool handle, the run loop, and the
/// settlement watchers. Always accessed under the pool's mutex.
pub(crate) struct PoolState {
    /// Factories not yet started, in enqueue order.
    pub(crate) waiting: VecDeque<BoxTaskFactory>,
    /// Admission keys of tasks that have started but not settled.
    pub(crate) running: HashSet<TaskId>,
    /// Maximum size of `running` enforced at the next admission step.
    pub(crate) concurrency: usize,
    /// Optional bound on a tick's suspension phase; `None` is unbounded.
    pub(crate) tick_timeout: Option<Duration>,
    /// Set on the first run request and never cleared. Once set, enqueueing
    /// implicitly reactivates the loop.
    pub(crate) started: bool,
    /// True between a tick's admission step starting and its suspension
    /// ending; read by `wait_for_tick`.
    pub(crate) tick_in_flight: bool,
    /// Generation of the run loop currently in flight, if any. At most one
    /// loop exists at a time; run requests while this is `Some` coalesce
    /// onto it.
    pub(crate) active_run: Option<u64>,
    /// Loops ever started; the next loop gets generation `runs_started + 1`.
    pub(crate) runs_started: u64,
    /// Next admission key. Strictly increasing, never reused.
    next_task_id: TaskId,
}

// Factories are opaque, so only the counters are worth printing.
impl fmt::Debug for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolState")
            .field("waiting", &self.waiting.len())
            .field("running", &self.running.len())
            .field("concurrency", &self.concurrency)
            .field("tick_timeout", &self.tick_timeout)
            .field("started", &self.started)
            .field("active_run", &self.active_run)
            .finish_non_exhaustive()
    }
}

impl PoolState {
    pub(crate) fn new(options: PoolOptions) -> Self {
        Self {
            waiting: VecDeque::new(),
            running: HashSet::new(),
            concurrency: options.concurrency,
            tick_timeout: options.tick_timeout,
            started: false,
            tick_in_flight: false,
            active_run: None,
            runs_started: 0,
            next_task_id: 0,
        }
    }

    /// Waiting queue and running set both empty. This is the run loop's
    /// termination condition.
    pub(crate) fn is_empty(&self) -> bool {
        self.waiting.is_empty() && self.running.is_empty()
    }

    /// How many more tasks the current limit allows to be admitted.
    ///
    /// Saturating: a limit below the current running count (possible after
    /// `set_concurrency` lowered it mid-flight) yields 0 rather than evicting
    /// anything; running tasks are never pre-empted.
    pub(crate) fn admission_budget(&self) -> usize {
        self.concurrency.saturating_sub(self.running.len())
    }

    /// The admission step of a tick: move up to `admission_budget()`
    /// factories from the front of the waiting queue into the running set,
    /// assigning each a fresh admission key.
    ///
    /// The returned factories have *not* been invoked yet; the caller starts
    /// them outside the state lock. Their keys are already in `running`, so a
    /// stats snapshot taken between admission and invocation is consistent.
    pub(crate) fn admit_batch(&mut self) -> Vec<(TaskId, BoxTaskFactory)> {
        let count = self.admission_budget().min(self.waiting.len());
        let mut batch = Vec::with_capacity(count);

        while batch.len() < count {
            let Some(factory) = self.waiting.pop_front() else {
                break;
            };
            let id = self.next_task_id;
            self.next_task_id += 1;
            self.running.insert(id);
            batch.push((id, factory));
        }

        batch
    }

    pub(crate) fn stats(&self) -> PoolStats {
        PoolStats {
            concurrency: self.concurrency,
            waiting: self.waiting.len(),
            running: self.running.len(),
        }
    }
}
