//! Background processing: per-device sampler loops and their supervision.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use blkstat_core::collector::{FileSystem, StatSource};
use blkstat_core::registry::DeviceRegistry;
use blkstat_core::sampler::{FailurePolicy, SampleError, Sampler, TickOutcome};

use crate::state::SharedStore;

#[derive(Error, Debug)]
pub(crate) enum SamplerTaskError {
    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error("device {device}: sampling task panicked")]
    Panicked { device: String },

    #[error("sampler task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl SamplerTaskError {
    /// Device whose loop failed, when known.
    pub(crate) fn device(&self) -> Option<&str> {
        match self {
            SamplerTaskError::Sample(e) => e.device(),
            SamplerTaskError::Panicked { device } => Some(device),
            SamplerTaskError::Join(_) => None,
        }
    }
}

pub(crate) type SamplerTasks = JoinSet<Result<(), SamplerTaskError>>;

/// Opens every registered device and spawns one loop per opened device.
///
/// A device that cannot be opened is skipped under
/// [`FailurePolicy::Isolate`] and aborts startup under
/// [`FailurePolicy::Exit`]. Returns the number of loops started.
#[allow(clippy::too_many_arguments)]
pub(crate) fn start_samplers<F: FileSystem>(
    fs: &F,
    registry: &DeviceRegistry,
    sys_path: &Path,
    interval: Duration,
    policy: FailurePolicy,
    store: &SharedStore,
    cancel: &CancellationToken,
    tasks: &mut SamplerTasks,
) -> Result<usize, SampleError> {
    let mut started = 0;
    for device in registry.iter() {
        match Sampler::open(fs, sys_path, device, interval) {
            Ok(sampler) => {
                info!(device, interval_ms = interval.as_millis() as u64, "sampler started");
                tasks.spawn(sampler_loop(
                    sampler,
                    store.clone(),
                    policy,
                    cancel.clone(),
                ));
                started += 1;
            }
            Err(e) if policy == FailurePolicy::Isolate => {
                error!(device, error = %e, "device not monitored");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(started)
}

// ============================================================
// Tick loop
// ============================================================

/// Samples one device every `interval` until cancelled.
///
/// The first tick fires one interval after start, since the baseline was
/// read when the sampler was opened. Missed ticks are skipped, never queued.
pub(crate) async fn sampler_loop<S: StatSource + 'static>(
    mut sampler: Sampler<S>,
    store: SharedStore,
    policy: FailurePolicy,
    cancel: CancellationToken,
) -> Result<(), SamplerTaskError> {
    let interval = sampler.interval();
    let device = sampler.device().to_string();
    let mut tick = tokio::time::interval_at(Instant::now() + interval, interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut snapshot_count: u64 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(device, "sampler stopped");
                return Ok(());
            }
            _ = tick.tick() => {}
        }

        // File reads are blocking; run them off the async runtime.
        let store_clone = store.clone();
        let t0 = Instant::now();
        let joined = tokio::task::spawn_blocking(move || {
            let result = sampler.step(&store_clone, policy);
            (sampler, result)
        })
        .await;

        let elapsed = t0.elapsed();

        let result = match joined {
            Ok((returned, result)) => {
                sampler = returned;
                result
            }
            Err(e) => {
                error!(device, error = %e, "tick panicked in spawn_blocking");
                return Err(SamplerTaskError::Panicked { device });
            }
        };

        match result? {
            TickOutcome::Published(snap) => {
                snapshot_count += 1;
                if snapshot_count == 1 {
                    info!(
                        device,
                        duration_ms = elapsed.as_millis() as u64,
                        timestamp = %snap.timestamp,
                        "first snapshot published"
                    );
                } else {
                    debug!(
                        device,
                        duration_ms = elapsed.as_millis() as u64,
                        snapshot_count,
                        "tick completed"
                    );
                }
            }
            TickOutcome::Baseline => {
                info!(device, "baseline re-established");
            }
            TickOutcome::Isolated => {}
        }

        if elapsed > interval / 2 {
            warn!(
                device,
                duration_ms = elapsed.as_millis() as u64,
                interval_ms = interval.as_millis() as u64,
                "tick exceeded 50% of interval"
            );
        }
    }
}

/// Waits for sampler loops to finish.
///
/// The first failing loop cancels `cancel` so every other loop (and the HTTP
/// server) winds down, and its error is returned.
pub(crate) async fn supervise(
    tasks: &mut SamplerTasks,
    cancel: &CancellationToken,
) -> Result<(), SamplerTaskError> {
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Err(e) if e.is_cancelled() => {}
            Ok(Err(e)) => {
                cancel.cancel();
                return Err(e);
            }
            Err(e) => {
                cancel.cancel();
                return Err(e.into());
            }
        }
    }
    Ok(())
}
