//! Externally controlled task completion.
//!
//! A deferred task is a factory whose settlement is driven from the outside:
//! the test holds a [`Deferred`] and decides exactly when, and how, the
//! task settles. This is what makes scheduling assertions deterministic:
//! admit three tasks, settle exactly one, observe the next tick.
//!
//! This helper is test tooling only; it is not part of the pool's scheduling
//! contract.

use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use tokio::sync::oneshot;

use taskpool::BoxTaskFactory;
use taskpool::errors::Result;

/// The controlling side of a deferred task.
///
/// Dropping it without settling makes the task settle with a failure (the
/// pool treats that the same as any other settlement).
pub struct Deferred {
    tx: oneshot::Sender<Result<()>>,
}

impl Deferred {
    /// Settle the task successfully.
    pub fn resolve(self) {
        let _ = self.tx.send(Ok(()));
    }

    /// Settle the task with a failure.
    pub fn reject(self, reason: &str) {
        let _ = self.tx.send(Err(anyhow!("{reason}")));
    }
}

/// A factory whose future settles only when the returned [`Deferred`] says
/// so.
pub fn deferred_task() -> (Deferred, BoxTaskFactory) {
    let (tx, rx) = oneshot::channel::<Result<()>>();

    let factory = Box::new(move || async move {
        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(anyhow!("deferred task dropped without settling")),
        }
    }) as BoxTaskFactory;

    (Deferred { tx }, factory)
}

/// Like [`deferred_task`], but records `label` into `log` at the moment the
/// pool invokes the factory, i.e. at admission. Lets tests assert admission
/// order independently of settlement order.
pub fn tracked_deferred_task(
    label: &str,
    log: Arc<Mutex<Vec<String>>>,
) -> (Deferred, BoxTaskFactory) {
    let (tx, rx) = oneshot::channel::<Result<()>>();
    let label = label.to_string();

    let factory = Box::new(move || {
        log.lock().unwrap().push(label);
        async move {
            match rx.await {
                Ok(outcome) => outcome,
                Err(_) => Err(anyhow!("deferred task dropped without settling")),
            }
        }
    }) as BoxTaskFactory;

    (Deferred { tx }, factory)
}
