//! ==============================================================================
//! simulator.rs - the generate / send / sleep loop
//! ==============================================================================
//!
//! purpose:
//!     owns the rotating sensor index and drives one cycle per interval:
//!     build a fresh reading for the current sensor, push it once, advance
//!     the index, sleep. the outcome of a send never changes the schedule.
//!
//! shutdown:
//!     the sleep races a caller-supplied shutdown future. a shutdown that
//!     fires while a send is in flight ends the loop right after that send.
//!
//! relationships:
//!     - used by: main.rs
//!     - uses: domain.rs (Reading), transmit.rs (Transmitter)
//!
//! ==============================================================================

use crate::config::SimConfig;
use crate::domain::Reading;
use crate::transmit::Transmitter;

use std::future::Future;
use std::time::Duration;

/// yields 1, 2, .., count, 1, 2, .. forever
#[derive(Debug, Clone)]
pub struct SensorRotation {
    current: u32,
    count: u32,
}

impl SensorRotation {
    pub fn new(count: u32) -> Self {
        Self { current: 1, count: count.max(1) }
    }
}

impl Iterator for SensorRotation {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let sensor_num = self.current;
        self.current = (self.current % self.count) + 1;
        Some(sensor_num)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub sensor_num: u32,
    pub delivered: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub cycles: u64,
    pub delivered: u64,
    pub failed: u64,
}

pub struct Simulator {
    transmitter: Transmitter,
    prefix: String,
    rotation: SensorRotation,
    interval: Duration,
    stats: RunStats,
}

impl Simulator {
    pub fn new(
        transmitter: Transmitter,
        prefix: impl Into<String>,
        sensor_count: u32,
        interval: Duration,
    ) -> Self {
        Self {
            transmitter,
            prefix: prefix.into(),
            rotation: SensorRotation::new(sensor_count),
            interval,
            stats: RunStats::default(),
        }
    }

    pub fn from_config(config: &SimConfig) -> anyhow::Result<Self> {
        let transmitter = Transmitter::new(config.api.endpoint.clone(), config.request_timeout())?;
        Ok(Self::new(
            transmitter,
            config.sensors.prefix.clone(),
            config.sensors.count,
            config.send_interval(),
        ))
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// one generate + send, no sleep
    pub async fn run_cycle(&mut self) -> CycleReport {
        let sensor_num = self.rotation.next().unwrap_or(1);
        let reading = Reading::generate(&self.prefix, sensor_num);
        tracing::debug!(sensor_id = reading.sensor_id(), timestamp = reading.timestamp(), "generated reading");

        let delivered = self.transmitter.send_and_report(&reading).await;

        self.stats.cycles += 1;
        if delivered {
            self.stats.delivered += 1;
        } else {
            self.stats.failed += 1;
        }
        CycleReport { sensor_num, delivered }
    }

    /// cycle until `shutdown` resolves
    pub async fn run_until<F>(&mut self, shutdown: F) -> RunStats
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            self.run_cycle().await;

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!(
            cycles = self.stats.cycles,
            delivered = self.stats.delivered,
            failed = self.stats.failed,
            "simulator stopped"
        );
        self.stats().clone()
    }
}

// ==============================================================================
// tests
// ==============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    /// backend that records sensor ids and fails every `fail_every`-th request
    async fn spawn_backend(fail_every: usize) -> (String, Arc<Mutex<Vec<String>>>) {
        let ids: Arc<Mutex<Vec<String>>> = Arc::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let record = ids.clone();
        let app = Router::new().route(
            "/log-data",
            post(move |body: String| {
                let record = record.clone();
                let hits = hits.clone();
                async move {
                    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
                    record.lock().unwrap().push(json["sensor_id"].as_str().unwrap().to_string());
                    let n = hits.fetch_add(1, Ordering::SeqCst) + 1;
                    if fail_every > 0 && n % fail_every == 0 {
                        StatusCode::SERVICE_UNAVAILABLE
                    } else {
                        StatusCode::OK
                    }
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/log-data", addr), ids)
    }

    async fn unreachable_endpoint() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        format!("http://{}/log-data", listener.local_addr().unwrap())
    }

    #[test]
    fn test_rotation_wraps() {
        let seq: Vec<u32> = SensorRotation::new(3).take(7).collect();
        assert_eq!(seq, vec![1, 2, 3, 1, 2, 3, 1]);
    }

    #[test]
    fn test_rotation_single_sensor() {
        assert!(SensorRotation::new(1).take(5).all(|n| n == 1));
    }

    #[test]
    fn test_from_config() {
        let mut config = SimConfig::default();
        config.sensors.count = 2;
        config.sensors.prefix = "hum".to_string();
        let sim = Simulator::from_config(&config).unwrap();
        assert_eq!(sim.interval, Duration::from_secs(1800));
        assert_eq!(sim.prefix, "hum");
        assert_eq!(sim.rotation.take(3).collect::<Vec<_>>(), vec![1, 2, 1]);
    }

    #[tokio::test]
    async fn test_cycles_rotate_sensor_ids() {
        let (url, ids) = spawn_backend(0).await;
        let tx = Transmitter::new(url, Some(Duration::from_secs(5))).unwrap();
        let mut sim = Simulator::new(tx, "temp", 3, Duration::from_millis(1));

        for expected in [1, 2, 3, 1] {
            let report = sim.run_cycle().await;
            assert_eq!(report, CycleReport { sensor_num: expected, delivered: true });
        }
        assert_eq!(*ids.lock().unwrap(), vec!["temp_01", "temp_02", "temp_03", "temp_01"]);
        assert_eq!(sim.stats(), &RunStats { cycles: 4, delivered: 4, failed: 0 });
    }

    #[tokio::test]
    async fn test_http_failures_do_not_stop_rotation() {
        let (url, ids) = spawn_backend(2).await;
        let tx = Transmitter::new(url, Some(Duration::from_secs(5))).unwrap();
        let mut sim = Simulator::new(tx, "temp", 3, Duration::from_millis(1));

        let delivered: Vec<bool> = {
            let mut out = Vec::new();
            for _ in 0..4 {
                out.push(sim.run_cycle().await.delivered);
            }
            out
        };
        assert_eq!(delivered, vec![true, false, true, false]);
        assert_eq!(*ids.lock().unwrap(), vec!["temp_01", "temp_02", "temp_03", "temp_01"]);
    }

    #[tokio::test]
    async fn test_loop_keeps_running_while_backend_is_down() {
        let tx = Transmitter::new(unreachable_endpoint().await, Some(Duration::from_secs(1))).unwrap();
        let mut sim = Simulator::new(tx, "temp", 3, Duration::from_millis(10));

        let stats = sim.run_until(tokio::time::sleep(Duration::from_millis(300))).await;
        assert!(stats.cycles >= 2, "only {} cycles ran", stats.cycles);
        assert_eq!(stats.delivered, 0);
        assert_eq!(stats.failed, stats.cycles);
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_sleep() {
        let (url, ids) = spawn_backend(0).await;
        let tx = Transmitter::new(url, Some(Duration::from_secs(5))).unwrap();
        let mut sim = Simulator::new(tx, "temp", 3, Duration::from_secs(3600));

        let stats = tokio::time::timeout(
            Duration::from_secs(10),
            sim.run_until(tokio::time::sleep(Duration::from_millis(100))),
        )
        .await
        .expect("shutdown should cut the hour-long sleep short");

        assert_eq!(stats, RunStats { cycles: 1, delivered: 1, failed: 0 });
        assert_eq!(ids.lock().unwrap().len(), 1);
    }
}
