// src/task.rs

//! The task contract shared between the pool and its callers.
//!
//! A *task factory* is a consume-once nullary operation that, when invoked,
//! begins an asynchronous unit of work and returns its in-flight future. The
//! pool owns a factory exclusively from the moment it is admitted until the
//! future settles; it never inspects the settlement value beyond logging it.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;

/// Admission key assigned to a task when it is promoted into the running set.
///
/// Keys are assigned from a per-pool counter that only ever increases, so a
/// key uniquely identifies one admission and is never reused.
pub type TaskId = u64;

/// In-flight future produced by invoking a task factory.
///
/// `Ok(())` and `Err(_)` are both just "settled" from the pool's point of
/// view; an `Err` is logged and otherwise treated the same as success.
pub type TaskFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// A deferred unit of work.
///
/// Implementations are free to do anything inside the returned future; the
/// only obligation is that it settles exactly once. Any `FnOnce` closure
/// returning a suitable future is a factory via the blanket impl, so callers
/// normally never implement this trait by hand:
///
/// ```no_run
/// use taskpool::{Pool, PoolOptions};
///
/// let pool = Pool::new(PoolOptions::default());
/// pool.enqueue(|| async {
///     // ... some bounded piece of work ...
///     Ok(())
/// });
/// ```
pub trait TaskFactory: Send + 'static {
    /// Invoke the factory, starting its unit of work.
    fn start(self: Box<Self>) -> TaskFuture;
}

impl<F, Fut> TaskFactory for F
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn start(self: Box<Self>) -> TaskFuture {
        Box::pin((self)())
    }
}

/// Boxed factory as stored in the waiting queue.
pub type BoxTaskFactory = Box<dyn TaskFactory>;
