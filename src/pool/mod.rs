// src/pool/mod.rs

//! The bounded-concurrency pool.
//!
//! This module ties together:
//! - the pure queue/running-set state in `state`
//! - the async tick loop, run coalescing, and observation surface in
//!   [`scheduler`]
//!
//! The split mirrors the rest of the crate's philosophy: all bookkeeping that
//! can be expressed without an executor lives in `state` and is driven by the
//! async shell in `scheduler`, which owns the suspension points.

use std::time::Duration;

use serde::Deserialize;

pub mod scheduler;
pub(crate) mod state;

pub use scheduler::{Pool, RunHandle};

fn default_concurrency() -> usize {
    1
}

/// Configuration recognised by [`Pool::new`].
///
/// Both fields can be changed later through [`Pool::set_concurrency`] and
/// [`Pool::set_tick_timeout`]; changes take effect at the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolOptions {
    /// Maximum number of simultaneously running tasks. Defaults to 1.
    pub concurrency: usize,

    /// Upper bound on how long a tick's suspension phase waits for a
    /// settlement before unblocking anyway. `None` (the default) means a tick
    /// waits indefinitely for the next settlement.
    pub tick_timeout: Option<Duration>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            tick_timeout: None,
        }
    }
}

/// Point-in-time counters observed from a pool.
///
/// A snapshot is taken under the pool's state lock, so `waiting` and
/// `running` are mutually consistent, but the pool may have moved on by the
/// time the caller looks at them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Current concurrency limit.
    pub concurrency: usize,
    /// Factories still in the waiting queue.
    pub waiting: usize,
    /// Tasks admitted and not yet settled.
    pub running: usize,
}
