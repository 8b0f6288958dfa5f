// src/lib.rs

//! Bounded-concurrency task runner.
//!
//! `taskpool` holds a FIFO queue of deferred units of work ("task factories")
//! and runs at most N of them at any instant, where N is adjustable while the
//! pool is running. Its purpose is resource control (bounding the peak
//! concurrent memory/CPU/IO of work that would otherwise all be launched at
//! once), not raw throughput.
//!
//! The heart of the crate is the tick loop in [`pool::Pool`]:
//! - **admission**: promote as many waiting factories as the current
//!   concurrency budget allows, in enqueue order;
//! - **suspension**: wait until some running task settles, or an optional
//!   tick timeout elapses, whichever comes first;
//! - repeat until both the waiting queue and the running set are empty.
//!
//! Task bodies are opaque to the pool: a factory is any `FnOnce` producing a
//! future, and the pool only cares that the future eventually settles. Both
//! success and failure count as settlement; failures are logged and forgotten
//! (propagating them is the caller's concern, via whatever the factory wraps).
//!
//! The pool does not cancel started tasks, and only admission order is FIFO;
//! completion order is whatever the tasks' own timing produces.

pub mod errors;
pub mod pool;
pub mod task;

pub use pool::{Pool, PoolOptions, PoolStats, RunHandle};
pub use task::{BoxTaskFactory, TaskFactory, TaskFuture, TaskId};
