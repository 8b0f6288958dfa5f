// src/pool/scheduler.rs

//! The async shell around the pool state: the run loop, the tick, run
//! coalescing, and the observation surface.
//!
//! One run loop drives the pool at a time. A *tick* is one admission step
//! (promote waiting factories up to the concurrency budget) followed by one
//! suspension step (wait for a settlement or the optional tick timeout,
//! whichever is first). The loop repeats ticks until the waiting queue and
//! running set are both empty, then clears its "active" marker (on every
//! exit path, via a drop guard) so run requests and implicit restarts can
//! start a fresh loop later.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::{Notify, watch};
use tracing::{debug, warn};

use crate::errors::Result;
use crate::pool::state::PoolState;
use crate::pool::{PoolOptions, PoolStats};
use crate::task::{BoxTaskFactory, TaskFactory, TaskId};

/// Bounded-concurrency task pool.
///
/// `Pool` is a cheap-clone handle; clones share the same queue, running set
/// and run loop. All methods take `&self`, so a pool can be enqueued into and
/// observed from anywhere, including from inside its own tasks.
///
/// Methods that (re)activate the run loop ([`Pool::run`], and
/// [`Pool::enqueue`] once the pool has been started) spawn onto the ambient
/// tokio runtime and must be called from within one.
#[derive(Debug, Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    state: Mutex<PoolState>,
    /// Fired by settlement watchers. `notify_one` buffers a permit, so a
    /// settlement that lands between admission and the suspension `await` is
    /// not lost.
    settled: Notify,
    /// Count of run loops that have finished. A [`RunHandle`] for loop
    /// generation `g` resolves once this reaches `g`.
    runs_done: watch::Sender<u64>,
    /// Count of ticks that have finished; lets `wait_for_tick` observe the
    /// in-flight tick passively.
    ticks_done: watch::Sender<u64>,
}

/// Handle to an in-flight (or already finished) run loop.
///
/// Resolves when the loop it was issued for has terminated, i.e. when the
/// waiting queue and running set were simultaneously empty. It does not carry
/// task outcomes: a failing task settles like a succeeding one as far as the
/// loop is concerned.
#[derive(Debug)]
pub struct RunHandle {
    runs_done: watch::Receiver<u64>,
    target: u64,
}

impl RunHandle {
    /// Wait for the run loop to terminate.
    ///
    /// Only errs if the pool itself was dropped while the loop was still in
    /// flight; individual task failures never surface here.
    pub async fn wait(mut self) -> Result<()> {
        self.runs_done
            .wait_for(|done| *done >= self.target)
            .await
            .map_err(|_| anyhow!("pool dropped before its run loop finished"))?;
        Ok(())
    }
}

impl Pool {
    pub fn new(options: PoolOptions) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                state: Mutex::new(PoolState::new(options)),
                settled: Notify::new(),
                runs_done: watch::Sender::new(0),
                ticks_done: watch::Sender::new(0),
            }),
        }
    }

    /// Append one factory to the tail of the waiting queue.
    ///
    /// If the pool has been started at least once (even if the loop has since
    /// finished), this implicitly reactivates the run loop; callers never
    /// need to invoke [`Pool::run`] a second time.
    pub fn enqueue<F, Fut>(&self, factory: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.enqueue_all([Box::new(factory) as BoxTaskFactory]);
    }

    /// Append a sequence of factories, preserving their relative order.
    ///
    /// An empty sequence changes nothing (the implicit-restart check still
    /// runs, and is itself a no-op on an empty pool).
    pub fn enqueue_all<I>(&self, factories: I)
    where
        I: IntoIterator<Item = BoxTaskFactory>,
    {
        let mut st = self.inner.lock_state();
        let before = st.waiting.len();
        st.waiting.extend(factories);
        debug!(
            added = st.waiting.len() - before,
            waiting = st.waiting.len(),
            "factories enqueued"
        );

        if st.started && !st.is_empty() {
            PoolInner::ensure_loop(&self.inner, &mut st);
        }
    }

    /// Request that the run loop be active.
    ///
    /// Idempotent: if a loop is already in flight, the returned handle
    /// observes that same loop; two loops never run concurrently. Otherwise
    /// a fresh loop is spawned (and the pool is marked as started, which
    /// arms the implicit restart on enqueue).
    pub fn run(&self) -> RunHandle {
        let mut st = self.inner.lock_state();
        st.started = true;
        let generation = PoolInner::ensure_loop(&self.inner, &mut st);
        RunHandle {
            runs_done: self.inner.runs_done.subscribe(),
            target: generation,
        }
    }

    /// Suspend until the tick currently in flight (if any) completes.
    ///
    /// Returns immediately when no tick is in flight. Purely observational:
    /// used to synchronise with the loop's cadence, never to influence it.
    pub async fn wait_for_tick(&self) {
        let target = {
            let st = self.inner.lock_state();
            if !st.tick_in_flight {
                return;
            }
            *self.inner.ticks_done.borrow() + 1
        };

        let mut ticks = self.inner.ticks_done.subscribe();
        // The sender lives inside our own Arc, so this cannot err while
        // `self` is alive.
        let _ = ticks.wait_for(|done| *done >= target).await;
    }

    /// Change the concurrency limit. Takes effect at the next tick's
    /// admission step; a tick already suspended is not re-evaluated.
    ///
    /// A limit of 0 admits nothing: if no tasks are currently running, the
    /// loop makes no further progress until the limit is raised again. The
    /// pool does not reject 0; keeping the limit meaningful is the caller's
    /// responsibility.
    pub fn set_concurrency(&self, concurrency: usize) {
        let mut st = self.inner.lock_state();
        debug!(from = st.concurrency, to = concurrency, "concurrency changed");
        st.concurrency = concurrency;
    }

    /// Change the tick timeout (`None` = unbounded). Takes effect at the
    /// next tick's suspension step.
    pub fn set_tick_timeout(&self, timeout: Option<Duration>) {
        let mut st = self.inner.lock_state();
        debug!(?timeout, "tick timeout changed");
        st.tick_timeout = timeout;
    }

    /// Whether a run has ever been requested. Never reset.
    pub fn started(&self) -> bool {
        self.inner.lock_state().started
    }

    /// True iff a positive, finite tick timeout is configured.
    pub fn has_tick_timeout(&self) -> bool {
        matches!(
            self.inner.lock_state().tick_timeout,
            Some(t) if t > Duration::ZERO
        )
    }

    /// True while a run loop is in flight.
    pub fn is_running(&self) -> bool {
        self.inner.lock_state().active_run.is_some()
    }

    /// Waiting queue and running set both empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock_state().is_empty()
    }

    /// Empty and no run loop in flight.
    pub fn is_done(&self) -> bool {
        let st = self.inner.lock_state();
        st.active_run.is_none() && st.is_empty()
    }

    /// Consistent snapshot of the pool's counters.
    pub fn stats(&self) -> PoolStats {
        self.inner.lock_state().stats()
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new(PoolOptions::default())
    }
}

/// Clears the active-run marker and publishes loop completion on every exit
/// path of [`PoolInner::run_loop`], including unwind.
struct RunGuard {
    inner: Arc<PoolInner>,
    generation: u64,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut st = self.inner.lock_state();
        st.active_run = None;

        // An enqueue may have landed between the loop's final emptiness
        // check and this guard running. The enqueue saw an active loop and
        // did not respawn, so the hand-off is on us.
        if st.started && !st.is_empty() {
            PoolInner::ensure_loop(&self.inner, &mut st);
        }

        self.inner
            .runs_done
            .send_modify(|done| *done = self.generation);
        debug!(run = self.generation, "run loop finished");
    }
}

impl PoolInner {
    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap()
    }

    /// Spawn the run loop if none is in flight; either way, return the
    /// generation of the loop now active. Callers hold the state lock.
    fn ensure_loop(inner: &Arc<Self>, st: &mut PoolState) -> u64 {
        if let Some(generation) = st.active_run {
            return generation;
        }

        st.runs_started += 1;
        let generation = st.runs_started;
        st.active_run = Some(generation);

        let inner = Arc::clone(inner);
        tokio::spawn(async move {
            inner.run_loop(generation).await;
        });

        generation
    }

    async fn run_loop(self: Arc<Self>, generation: u64) {
        debug!(run = generation, "run loop started");
        let _guard = RunGuard {
            inner: Arc::clone(&self),
            generation,
        };

        while !self.lock_state().is_empty() {
            Self::tick(&self).await;
        }
    }

    /// One admission-plus-suspension step.
    async fn tick(inner: &Arc<Self>) {
        let (batch, timeout) = {
            let mut st = inner.lock_state();
            st.tick_in_flight = true;
            (st.admit_batch(), st.tick_timeout)
        };

        if !batch.is_empty() {
            debug!(admitted = batch.len(), "tick admitted tasks");
        }
        for (id, factory) in batch {
            Self::start_task(inner, id, factory);
        }

        inner.suspend(timeout).await;

        let mut st = inner.lock_state();
        st.tick_in_flight = false;
        inner.ticks_done.send_modify(|done| *done += 1);
    }

    /// The suspension step: a race between "some running task settled" and
    /// the tick timeout, if one is configured.
    ///
    /// A timeout firing removes nothing from the running set; it only
    /// unblocks the tick so the loop can observe mutated limits or stats
    /// sooner than the next natural settlement.
    async fn suspend(&self, timeout: Option<Duration>) {
        let running_empty = self.lock_state().running.is_empty();

        match timeout {
            // Nothing can settle and nothing bounds the wait: vacuous, but
            // yield so the stall stays cooperative.
            None if running_empty => tokio::task::yield_now().await,
            None => self.settled.notified().await,
            Some(t) => {
                let _ = tokio::time::timeout(t, self.settled.notified()).await;
            }
        }
    }

    /// Invoke an admitted factory and watch its settlement.
    ///
    /// The watcher removes the admission key the moment the task settles
    /// (success, failure, or panic) and fires the settlement notify. The
    /// outcome itself is logged and dropped; the pool never propagates it.
    fn start_task(inner: &Arc<Self>, id: TaskId, factory: BoxTaskFactory) {
        debug!(task = id, "task admitted");
        let task = tokio::spawn(factory.start());

        let inner = Arc::clone(inner);
        tokio::spawn(async move {
            match task.await {
                Ok(Ok(())) => debug!(task = id, "task settled successfully"),
                Ok(Err(error)) => {
                    warn!(task = id, error = %error, "task settled with failure");
                }
                Err(join_error) => {
                    warn!(task = id, error = %join_error, "task panicked");
                }
            }

            {
                let mut st = inner.lock_state();
                st.running.remove(&id);
            }
            inner.settled.notify_one();
        });
    }
}
