// tests/options_from_toml.rs

use std::error::Error;
use std::time::Duration;

use taskpool::{Pool, PoolOptions};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn options_deserialize_with_defaults() -> TestResult {
    let options: PoolOptions = toml::from_str("")?;
    assert_eq!(options, PoolOptions::default());
    assert_eq!(options.concurrency, 1);
    assert_eq!(options.tick_timeout, None);

    Ok(())
}

#[test]
fn options_deserialize_from_toml() -> TestResult {
    let options: PoolOptions = toml::from_str(
        r#"
        concurrency = 4

        [tick_timeout]
        secs = 0
        nanos = 50000000
        "#,
    )?;

    assert_eq!(options.concurrency, 4);
    assert_eq!(options.tick_timeout, Some(Duration::from_millis(50)));

    Ok(())
}

#[tokio::test]
async fn options_drive_the_pool() -> TestResult {
    let options: PoolOptions = toml::from_str(
        r#"
        concurrency = 4

        [tick_timeout]
        secs = 1
        nanos = 0
        "#,
    )?;

    let pool = Pool::new(options);
    assert_eq!(pool.stats().concurrency, 4);
    assert!(pool.has_tick_timeout());

    Ok(())
}
