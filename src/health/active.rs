//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe backends
//! - Update backend liveness based on results

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::health::probe::probe_tcp;
use crate::load_balancer::backend::status_label;
use crate::load_balancer::ServerPool;

pub struct HealthMonitor {
    pool: Arc<ServerPool>,
    enabled: bool,
    interval: Duration,
    timeout: Duration,
}

impl HealthMonitor {
    pub fn new(pool: Arc<ServerPool>, interval: Duration, timeout: Duration) -> Self {
        Self {
            pool,
            enabled: true,
            interval,
            timeout,
        }
    }

    pub fn from_config(pool: Arc<ServerPool>, config: &HealthCheckConfig) -> Self {
        Self {
            enabled: config.enabled,
            ..Self::new(
                pool,
                Duration::from_secs(config.interval_secs),
                Duration::from_secs(config.timeout_secs),
            )
        }
    }

    /// Probe on every interval until `shutdown` fires.
    ///
    /// The first round runs one full interval after start.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval = ?self.interval,
            timeout = ?self.timeout,
            "Health monitor starting"
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.recv() => break,
            }

            tracing::info!("Starting health check...");
            tokio::select! {
                _ = self.probe_all() => tracing::info!("Health check completed"),
                _ = shutdown.recv() => {
                    tracing::info!("Health check interrupted");
                    break;
                }
            }
        }

        tracing::info!("Health monitor received shutdown signal, exiting loop");
    }

    /// Probe every backend once, sequentially.
    pub async fn probe_all(&self) {
        for backend in self.pool.backends() {
            let alive = match probe_tcp(backend.address(), self.timeout).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(backend = %backend.url(), error = %e, "Health check failed");
                    false
                }
            };

            backend.set_alive(alive);
            tracing::info!(backend = %backend.url(), status = status_label(alive), "Health check result");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use crate::load_balancer::backend::testing::ScriptedUpstream;
    use crate::load_balancer::Backend;
    use tokio::net::TcpListener;
    use url::Url;

    fn pool_for(addrs: &[String]) -> Arc<ServerPool> {
        let mut pool = ServerPool::new();
        for addr in addrs {
            let url = Url::parse(&format!("http://{}", addr)).unwrap();
            pool.add_backend(Arc::new(Backend::new(url, ScriptedUpstream::healthy("x")).unwrap()));
        }
        Arc::new(pool)
    }

    #[tokio::test]
    async fn probe_marks_each_backend_independently() {
        let live = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let live_addr = live.local_addr().unwrap().to_string();
        let dead_addr = dead.local_addr().unwrap().to_string();
        drop(dead);

        // Dead backend first: its failure must not stop the live one being probed.
        let pool = pool_for(&[dead_addr, live_addr]);
        pool.backends()[1].set_alive(false);

        let monitor = HealthMonitor::new(pool.clone(), Duration::from_secs(60), Duration::from_secs(2));
        monitor.probe_all().await;

        assert!(!pool.backends()[0].is_alive());
        assert!(pool.backends()[1].is_alive());
    }

    #[tokio::test]
    async fn run_probes_on_interval_and_stops_on_shutdown() {
        let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_addr = dead.local_addr().unwrap().to_string();
        drop(dead);

        let pool = pool_for(&[dead_addr]);
        let monitor = HealthMonitor::new(pool.clone(), Duration::from_millis(50), Duration::from_secs(1));
        let shutdown = Shutdown::new();
        let handle = tokio::spawn(monitor.run(shutdown.subscribe()));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!pool.backends()[0].is_alive());

        shutdown.trigger();
        time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("monitor did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn shutdown_interrupts_a_round_in_progress() {
        // Unroutable address: the connect hangs until the probe timeout.
        let pool = pool_for(&["10.255.255.1:80".to_string(), "10.255.255.2:80".to_string()]);
        let monitor = HealthMonitor::new(pool, Duration::from_millis(20), Duration::from_secs(10));
        let shutdown = Shutdown::new();
        let handle = tokio::spawn(monitor.run(shutdown.subscribe()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.trigger();

        time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor waited for the whole round")
            .unwrap();
    }

    #[tokio::test]
    async fn disabled_monitor_returns_immediately() {
        let pool = pool_for(&["127.0.0.1:1".to_string()]);
        let config = HealthCheckConfig {
            enabled: false,
            ..HealthCheckConfig::default()
        };
        let shutdown = Shutdown::new();

        time::timeout(
            Duration::from_secs(1),
            HealthMonitor::from_config(pool, &config).run(shutdown.subscribe()),
        )
        .await
        .unwrap();
    }
}
