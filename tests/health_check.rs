//! Active health probing against real sockets.

use std::time::Duration;

use axum::http::StatusCode;

mod common;

#[tokio::test]
async fn test_health_check_updates_liveness() {
    let dead = common::closed_port().await;
    let live = common::start_mock_backend("live").await;

    let mut config = common::config_for(&[dead, live]);
    config.health_check.enabled = true;
    config.health_check.interval_secs = 1;
    config.health_check.timeout_secs = 1;

    let proxy = common::start_proxy(config).await;
    // Pretend an earlier failure took the live backend out of rotation.
    proxy.pool.backends()[1].set_alive(false);

    tokio::time::sleep(Duration::from_millis(1600)).await;

    assert!(!proxy.pool.backends()[0].is_alive(), "unreachable backend marked down");
    assert!(proxy.pool.backends()[1].is_alive(), "reachable backend brought back");

    let client = common::client();
    for _ in 0..4 {
        let res = client.get(proxy.url("/")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.text().await.unwrap(), "live");
    }

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_probed_down_pool_refuses_immediately() {
    let dead = common::closed_port().await;

    let mut config = common::config_for(&[dead]);
    config.health_check.enabled = true;
    config.health_check.interval_secs = 1;
    config.health_check.timeout_secs = 1;
    // A forward attempt would take seconds with this budget; a refusal must not.
    config.retries.retry_delay_ms = 1000;

    let proxy = common::start_proxy(config).await;
    tokio::time::sleep(Duration::from_millis(1600)).await;
    assert!(!proxy.pool.backends()[0].is_alive());

    let started = std::time::Instant::now();
    let res = common::client().get(proxy.url("/")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.text().await.unwrap(), "Service not available");
    assert!(started.elapsed() < Duration::from_millis(900));

    proxy.shutdown.trigger();
}
