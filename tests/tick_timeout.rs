// tests/tick_timeout.rs

use std::error::Error;
use std::time::{Duration, Instant};

use taskpool::{Pool, PoolOptions};
use taskpool_test_utils::deferred::deferred_task;
use taskpool_test_utils::{init_tracing, wait_until, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn tick_timeout_unblocks_the_tick_without_settlement() -> TestResult {
    init_tracing();

    let pool = Pool::new(PoolOptions {
        concurrency: 1,
        tick_timeout: Some(Duration::from_millis(50)),
    });

    let (d, f) = deferred_task();
    pool.enqueue_all([f]);

    let started_at = Instant::now();
    let handle = pool.run();

    let observer = pool.clone();
    wait_until("task running", move || observer.stats().running == 1).await;

    // The first tick is now suspended; with no settlement coming, only the
    // timeout can end it.
    pool.wait_for_tick().await;
    assert!(started_at.elapsed() >= Duration::from_millis(50));

    // The timeout removed nothing: the task is still running, the loop still
    // active.
    let stats = pool.stats();
    assert_eq!(stats.running, 1);
    assert_eq!(stats.waiting, 0);
    assert!(pool.is_running());
    assert!(!pool.is_done());

    d.resolve();
    with_timeout(handle.wait()).await?;

    Ok(())
}

#[tokio::test]
async fn wait_for_tick_returns_immediately_when_idle() -> TestResult {
    init_tracing();

    let pool = Pool::default();

    // No loop, no tick in flight.
    let before = Instant::now();
    pool.wait_for_tick().await;
    assert!(before.elapsed() < Duration::from_millis(20));

    Ok(())
}

#[tokio::test]
async fn finite_timeout_accessor_tracks_mutation() -> TestResult {
    init_tracing();

    let pool = Pool::default();
    assert!(!pool.has_tick_timeout());

    pool.set_tick_timeout(Some(Duration::from_millis(10)));
    assert!(pool.has_tick_timeout());

    pool.set_tick_timeout(Some(Duration::ZERO));
    assert!(!pool.has_tick_timeout());

    pool.set_tick_timeout(None);
    assert!(!pool.has_tick_timeout());

    Ok(())
}
