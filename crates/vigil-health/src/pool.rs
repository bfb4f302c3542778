//! Fixed-size worker pool for probe execution.
//!
//! All workers share one bounded job queue and one bounded result channel.
//! A full job queue makes `submit` wait, which is the pool's backpressure.
//! Shutdown is broadcast over a `watch` channel; a worker finishes the probe
//! it is running (bounded by the probe timeout) before it exits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use vigil_registry::Target;

use crate::error::{HealthError, HealthResult};
use crate::prober::{DEFAULT_PROBE_TIMEOUT, Prober};

/// Default number of workers.
pub const DEFAULT_WORKERS: usize = 10;

/// Worker pool sizing and probe timeout.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of concurrent workers.
    pub workers: usize,
    /// Capacity of the job queue and of the result channel.
    pub queue_capacity: usize,
    /// Timeout applied to every probe run by the pool.
    pub probe_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_WORKERS,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

/// Cloneable handle for enqueueing probe requests.
#[derive(Debug, Clone)]
pub struct Submitter {
    jobs: mpsc::Sender<Target>,
}

impl Submitter {
    /// Enqueue a probe request, waiting while the queue is full.
    pub async fn submit(&self, target: Target) -> HealthResult<()> {
        self.jobs
            .send(target)
            .await
            .map_err(|_| HealthError::PoolClosed)
    }
}

/// A running pool of probe workers.
pub struct WorkerPool {
    submitter: Submitter,
    shutdown_tx: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn the workers. Returns the pool and the receiving end of the
    /// result channel.
    pub fn start(prober: Prober, config: PoolConfig) -> (Self, mpsc::Receiver<Target>) {
        let workers = config.workers.max(1);
        let capacity = config.queue_capacity.max(1);

        let (jobs_tx, jobs_rx) = mpsc::channel(capacity);
        let (results_tx, results_rx) = mpsc::channel(capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let jobs_rx = Arc::new(Mutex::new(jobs_rx));

        let handles = (0..workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    jobs: Arc::clone(&jobs_rx),
                    results: results_tx.clone(),
                    shutdown: shutdown_rx.clone(),
                    prober: prober.clone(),
                    timeout: config.probe_timeout,
                };
                tokio::spawn(worker.run())
            })
            .collect();

        info!(
            workers,
            queue_capacity = capacity,
            probe_timeout = ?config.probe_timeout,
            "worker pool started"
        );

        let pool = Self {
            submitter: Submitter { jobs: jobs_tx },
            shutdown_tx,
            workers: handles,
        };
        (pool, results_rx)
    }

    /// Enqueue a probe request, waiting while the queue is full.
    pub async fn submit(&self, target: Target) -> HealthResult<()> {
        self.submitter.submit(target).await
    }

    /// A handle that can submit from other tasks.
    pub fn submitter(&self) -> Submitter {
        self.submitter.clone()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop all workers after their in-flight probes and wait for them.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        drop(self.submitter);

        for handle in self.workers {
            if let Err(e) = handle.await {
                warn!(error = %e, "probe worker task failed");
            }
        }
        info!("worker pool stopped");
    }
}

/// One probe worker.
struct Worker {
    id: usize,
    jobs: Arc<Mutex<mpsc::Receiver<Target>>>,
    results: mpsc::Sender<Target>,
    shutdown: watch::Receiver<bool>,
    prober: Prober,
    timeout: Duration,
}

impl Worker {
    async fn run(mut self) {
        debug!(worker = self.id, "probe worker started");

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            let job = tokio::select! {
                _ = self.shutdown.changed() => break,
                job = next_job(&self.jobs) => job,
            };
            // Queue closed and drained.
            let Some(target) = job else { break };

            let result = self.prober.run(target, self.timeout).await;

            // A finished probe is delivered ahead of a pending shutdown.
            tokio::select! {
                biased;
                sent = self.results.send(result) => {
                    if sent.is_err() {
                        break;
                    }
                }
                _ = self.shutdown.changed() => break,
            }
        }

        debug!(worker = self.id, "probe worker stopped");
    }
}

async fn next_job(jobs: &Mutex<mpsc::Receiver<Target>>) -> Option<Target> {
    jobs.lock().await.recv().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn ok_server(delay: Duration) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(delay))
            .mount(&server)
            .await;
        server
    }

    fn config(workers: usize, queue_capacity: usize) -> PoolConfig {
        PoolConfig {
            workers,
            queue_capacity,
            probe_timeout: Duration::from_secs(2),
        }
    }

    fn prober() -> Prober {
        Prober::new(Duration::from_secs(2)).unwrap()
    }

    async fn recv(results: &mut mpsc::Receiver<Target>) -> Target {
        tokio::time::timeout(Duration::from_secs(5), results.recv())
            .await
            .expect("timed out waiting for a result")
            .expect("result channel closed")
    }

    #[test]
    fn default_config() {
        let config = PoolConfig::default();
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.probe_timeout, DEFAULT_PROBE_TIMEOUT);
    }

    #[tokio::test]
    async fn every_submission_yields_exactly_one_result() {
        let server = ok_server(Duration::from_millis(10)).await;
        let (pool, mut results) = WorkerPool::start(prober(), config(3, 2));
        assert_eq!(pool.worker_count(), 3);

        const K: usize = 20;
        let targets: Vec<Target> = (0..K)
            .map(|i| Target::new(format!("{}/t/{i}", server.uri())))
            .collect();
        let expected: HashSet<String> = targets.iter().map(|t| t.id.clone()).collect();

        let submitter = pool.submitter();
        let feeder = tokio::spawn(async move {
            for target in targets {
                submitter.submit(target).await.unwrap();
            }
        });

        let mut seen = HashSet::new();
        for _ in 0..K {
            let result = recv(&mut results).await;
            assert_eq!(result.code, 200);
            assert!(seen.insert(result.id), "duplicate result");
        }
        feeder.await.unwrap();

        assert_eq!(seen, expected);
        assert!(results.try_recv().is_err());
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn failed_probe_does_not_stop_worker() {
        let server = ok_server(Duration::ZERO).await;
        let (pool, mut results) = WorkerPool::start(prober(), config(1, 4));

        pool.submit(Target::new("http://127.0.0.1:1/down")).await.unwrap();
        pool.submit(Target::new(format!("{}/ok", server.uri())))
            .await
            .unwrap();

        let first = recv(&mut results).await;
        let second = recv(&mut results).await;
        assert_eq!(first.code, 0);
        assert!(!first.error.is_empty());
        assert_eq!(second.code, 200);

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn idle_pool_shuts_down_promptly() {
        let (pool, _results) = WorkerPool::start(prober(), config(4, 4));
        tokio::time::timeout(Duration::from_secs(1), pool.shutdown())
            .await
            .expect("shutdown hung");
    }

    #[tokio::test]
    async fn submit_after_shutdown_is_rejected() {
        let (pool, _results) = WorkerPool::start(prober(), config(2, 2));
        let submitter = pool.submitter();
        pool.shutdown().await;

        let err = submitter
            .submit(Target::new("http://127.0.0.1:1/"))
            .await
            .unwrap_err();
        assert!(matches!(err, HealthError::PoolClosed));
    }

    #[tokio::test]
    async fn in_flight_probe_finishes_during_shutdown() {
        let server = ok_server(Duration::from_millis(300)).await;
        let (pool, mut results) = WorkerPool::start(prober(), config(1, 1));

        pool.submit(Target::new(format!("{}/slow", server.uri())))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let shutdown = tokio::spawn(pool.shutdown());
        let result = recv(&mut results).await;
        assert_eq!(result.code, 200);
        shutdown.await.unwrap();
    }
}
