// tests/loop_termination.rs

use std::error::Error;

use anyhow::anyhow;
use taskpool::{Pool, PoolOptions};
use taskpool_test_utils::deferred::deferred_task;
use taskpool_test_utils::{init_tracing, wait_until, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn loop_ends_exactly_when_waiting_and_running_are_empty() -> TestResult {
    init_tracing();

    let pool = Pool::new(PoolOptions {
        concurrency: 2,
        tick_timeout: None,
    });

    let (d1, f1) = deferred_task();
    let (d2, f2) = deferred_task();
    pool.enqueue_all([f1, f2]);

    let handle = pool.run();

    let observer = pool.clone();
    wait_until("both tasks running", move || observer.stats().running == 2).await;

    // One settlement is not termination.
    d1.resolve();
    let observer = pool.clone();
    wait_until("one task left", move || observer.stats().running == 1).await;
    assert!(pool.is_running());
    assert!(!pool.is_done());

    d2.resolve();
    with_timeout(handle.wait()).await?;
    assert!(pool.is_done());
    assert!(!pool.is_running());

    Ok(())
}

#[tokio::test]
async fn enqueue_after_completion_reactivates_without_another_run() -> TestResult {
    init_tracing();

    let pool = Pool::default();
    with_timeout(pool.run().wait()).await?;
    assert!(pool.started());
    assert!(pool.is_done());

    // No further run() call: enqueue alone must restart the loop and drain
    // the task.
    let (d, f) = deferred_task();
    pool.enqueue_all([f]);

    let observer = pool.clone();
    wait_until("task running", move || observer.stats().running == 1).await;
    assert!(pool.is_running());

    d.resolve();
    let observer = pool.clone();
    wait_until("pool drained", move || observer.is_done()).await;

    Ok(())
}

#[tokio::test]
async fn failing_tasks_do_not_fail_the_run_loop() -> TestResult {
    init_tracing();

    let pool = Pool::new(PoolOptions {
        concurrency: 2,
        tick_timeout: None,
    });

    pool.enqueue(|| async { Err(anyhow!("task blew up")) });
    pool.enqueue(|| async { Ok(()) });

    let handle = pool.run();
    with_timeout(handle.wait()).await?;

    assert!(pool.is_done());

    Ok(())
}

#[tokio::test]
async fn rejected_deferred_settles_like_any_other_task() -> TestResult {
    init_tracing();

    let pool = Pool::new(PoolOptions {
        concurrency: 1,
        tick_timeout: None,
    });

    let (d1, f1) = deferred_task();
    let (d2, f2) = deferred_task();
    pool.enqueue_all([f1, f2]);

    let handle = pool.run();

    let observer = pool.clone();
    wait_until("first task running", move || observer.stats().running == 1).await;

    // Failure frees the slot for the next waiting task just like success.
    d1.reject("deliberate failure");
    let observer = pool.clone();
    wait_until("second task admitted", move || {
        let stats = observer.stats();
        stats.waiting == 0 && stats.running == 1
    })
    .await;

    d2.resolve();
    with_timeout(handle.wait()).await?;
    assert!(pool.is_done());

    Ok(())
}
