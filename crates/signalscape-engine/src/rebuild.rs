//! Background ray-bundle rebuilds.
//!
//! A named worker thread owns a [`BundleCache`] and rebuilds bundles for
//! copies of the transmitter set sent over an `mpsc` channel. The session
//! polls for results without blocking. At most one job is in flight; while
//! it runs, newer requests overwrite a single pending slot, and any result
//! older than the latest request is discarded.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use thiserror::Error;

use signalscape_core::config::EngineConfig;
use signalscape_core::state::RayBundle;
use signalscape_core::types::Transmitter;
use signalscape_scene::index::GeometryIndex;

use crate::cache::{BundleCache, RebuildCounts};

/// Geometry shared read-only between the session and the worker.
pub type SharedIndex = Arc<dyn GeometryIndex + Send + Sync>;

#[derive(Error, Debug)]
pub enum RebuildError {
    #[error("Failed to spawn ray rebuild worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Ray rebuild worker has stopped")]
    Disconnected,
}

/// A request to rebuild bundles for one transmitter set.
#[derive(Debug, Clone)]
pub struct RebuildJob {
    pub generation: u64,
    pub transmitters: Vec<Transmitter>,
}

/// Bundles built for one generation.
#[derive(Debug, Clone)]
pub struct RebuildOutput {
    pub generation: u64,
    pub bundles: Vec<RayBundle>,
    pub counts: RebuildCounts,
}

/// Handle to the rebuild thread.
pub struct RebuildWorker {
    jobs: Option<mpsc::Sender<RebuildJob>>,
    results: mpsc::Receiver<RebuildOutput>,
    handle: Option<JoinHandle<()>>,
    next_generation: u64,
    in_flight: Option<u64>,
    pending: Option<RebuildJob>,
}

impl RebuildWorker {
    /// Start the worker thread.
    pub fn spawn(index: SharedIndex, config: EngineConfig) -> Result<Self, RebuildError> {
        let (job_tx, job_rx) = mpsc::channel::<RebuildJob>();
        let (result_tx, result_rx) = mpsc::channel::<RebuildOutput>();

        let handle = std::thread::Builder::new()
            .name("signalscape-ray-rebuild".into())
            .spawn(move || {
                run_worker(index, config, job_rx, result_tx);
            })?;

        Ok(Self {
            jobs: Some(job_tx),
            results: result_rx,
            handle: Some(handle),
            next_generation: 0,
            in_flight: None,
            pending: None,
        })
    }

    /// Request bundles for `transmitters`. Returns the generation assigned.
    pub fn request(&mut self, transmitters: Vec<Transmitter>) -> Result<u64, RebuildError> {
        self.next_generation += 1;
        let job = RebuildJob {
            generation: self.next_generation,
            transmitters,
        };
        tracing::debug!(
            generation = job.generation,
            transmitters = job.transmitters.len(),
            "ray rebuild requested"
        );
        if self.in_flight.is_some() {
            if let Some(replaced) = self.pending.replace(job) {
                tracing::debug!(generation = replaced.generation, "pending rebuild superseded");
            }
        } else {
            self.send(job)?;
        }
        Ok(self.next_generation)
    }

    /// Collect a finished rebuild, if the latest one is ready. Never blocks.
    pub fn poll(&mut self) -> Result<Option<RebuildOutput>, RebuildError> {
        let mut accepted = None;
        loop {
            match self.results.try_recv() {
                Ok(output) => {
                    if let Some(output) = self.receive(output)? {
                        accepted = Some(output);
                    }
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    return Err(RebuildError::Disconnected);
                }
            }
        }
        Ok(accepted)
    }

    /// Block until the latest requested generation arrives or `timeout` elapses.
    pub fn wait_latest(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<RebuildOutput>, RebuildError> {
        let deadline = Instant::now() + timeout;
        while !self.is_idle() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.results.recv_timeout(remaining) {
                Ok(output) => {
                    if let Some(output) = self.receive(output)? {
                        return Ok(Some(output));
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => return Ok(None),
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return Err(RebuildError::Disconnected);
                }
            }
        }
        Ok(None)
    }

    /// No job in flight and none pending.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.pending.is_none()
    }

    /// The most recently assigned generation (0 before any request).
    pub fn latest_generation(&self) -> u64 {
        self.next_generation
    }

    fn send(&mut self, job: RebuildJob) -> Result<(), RebuildError> {
        let generation = job.generation;
        let jobs = self.jobs.as_ref().ok_or(RebuildError::Disconnected)?;
        jobs.send(job).map_err(|_| RebuildError::Disconnected)?;
        self.in_flight = Some(generation);
        Ok(())
    }

    /// Book-keep one result; returns it only if it is current.
    fn receive(&mut self, output: RebuildOutput) -> Result<Option<RebuildOutput>, RebuildError> {
        if self.in_flight == Some(output.generation) {
            self.in_flight = None;
        }
        if let Some(next) = self.pending.take() {
            self.send(next)?;
        }
        if output.generation == self.next_generation {
            Ok(Some(output))
        } else {
            tracing::debug!(
                generation = output.generation,
                latest = self.next_generation,
                "discarding stale ray rebuild"
            );
            Ok(None)
        }
    }
}

impl Drop for RebuildWorker {
    fn drop(&mut self) {
        // Closing the job channel ends the worker loop.
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("ray rebuild worker panicked");
            }
        }
    }
}

/// Worker loop. Runs until the job channel closes or the session goes away.
fn run_worker(
    index: SharedIndex,
    config: EngineConfig,
    jobs: mpsc::Receiver<RebuildJob>,
    results: mpsc::Sender<RebuildOutput>,
) {
    let mut cache = BundleCache::new();
    while let Ok(job) = jobs.recv() {
        let started = Instant::now();
        let (bundles, counts) = cache.rebuild(&job.transmitters, &*index, &config);
        tracing::info!(
            generation = job.generation,
            bundles = bundles.len(),
            built = counts.built,
            reused = counts.reused,
            evicted = counts.evicted,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ray rebuild complete"
        );
        let output = RebuildOutput {
            generation: job.generation,
            bundles,
            counts,
        };
        if results.send(output).is_err() {
            break;
        }
    }
    tracing::debug!("ray rebuild worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use signalscape_core::constants::*;
    use signalscape_core::enums::MaterialClass;
    use signalscape_core::types::Mobility;
    use signalscape_scene::mesh::TriangleIndex;

    const TIMEOUT: Duration = Duration::from_secs(30);

    fn make_transmitter(id: u32, x: f64) -> Transmitter {
        Transmitter {
            id,
            position: DVec3::new(x, 20.0, 0.0),
            power_dbm: DEFAULT_TX_POWER_DBM,
            frequency_mhz: DEFAULT_TX_FREQUENCY_MHZ,
            color: TRANSMITTER_PALETTE[0],
            mobility: Mobility::Stationary,
        }
    }

    fn make_worker() -> RebuildWorker {
        let mut index = TriangleIndex::new();
        index.add_ground(2000.0, 0.0, MaterialClass::Terrain);
        index.build();
        RebuildWorker::spawn(Arc::new(index), EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_rebuild_round_trip() {
        let mut worker = make_worker();
        let generation = worker.request(vec![make_transmitter(1, 0.0)]).unwrap();
        assert_eq!(generation, 1);

        let output = worker.wait_latest(TIMEOUT).unwrap().unwrap();
        assert_eq!(output.generation, 1);
        assert!(!output.bundles.is_empty());
        assert_eq!(output.counts.built, 1);
        assert!(worker.is_idle());
    }

    #[test]
    fn test_latest_request_wins() {
        let mut worker = make_worker();
        worker.request(vec![make_transmitter(1, 0.0)]).unwrap();
        worker.request(vec![make_transmitter(2, 10.0)]).unwrap();
        let latest = worker.request(vec![make_transmitter(3, 20.0)]).unwrap();
        assert_eq!(latest, 3);

        let output = worker.wait_latest(TIMEOUT).unwrap().unwrap();
        assert_eq!(output.generation, latest);
        assert!(output.bundles.iter().all(|b| b.transmitter_id == 3));
        assert!(worker.is_idle());
    }

    #[test]
    fn test_poll_without_requests_is_empty() {
        let mut worker = make_worker();
        assert!(worker.poll().unwrap().is_none());
        assert!(worker.is_idle());
        assert_eq!(worker.latest_generation(), 0);
    }

    #[test]
    fn test_worker_reuses_cached_bundles() {
        let mut worker = make_worker();
        let txs = vec![make_transmitter(1, 0.0), make_transmitter(2, 40.0)];
        worker.request(txs.clone()).unwrap();
        let first = worker.wait_latest(TIMEOUT).unwrap().unwrap();

        worker.request(txs).unwrap();
        let second = worker.wait_latest(TIMEOUT).unwrap().unwrap();
        assert_eq!(second.counts.reused, 2);
        assert_eq!(first.bundles, second.bundles);
    }
}
