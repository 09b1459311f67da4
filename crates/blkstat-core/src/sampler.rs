//! Per-device sampler: baseline handling, tick computation, failure policy.
//!
//! A sampler owns its counter source and the previous reading. It starts in
//! `Initializing`, becomes `Running` once a baseline has been read, and
//! publishes one snapshot per tick from then on. Scheduling lives with the
//! caller; everything here is synchronous.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{trace, warn};

use crate::collector::parser::{BlockStat, ParseError, parse_block_stat};
use crate::collector::traits::{FileSystem, StatSource};
use crate::rates;
use crate::registry::stat_path;
use crate::storage::model::DeviceSnapshot;
use crate::storage::store::{SnapshotStore, StoreError};

#[derive(Error, Debug)]
pub enum SampleError {
    #[error("device {device}: cannot open {}: {source}", .path.display())]
    Open {
        device: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("device {device}: read failed: {source}")]
    Read {
        device: String,
        #[source]
        source: io::Error,
    },

    #[error("device {device}: malformed stat: {source}")]
    Parse {
        device: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SampleError {
    pub fn device(&self) -> Option<&str> {
        match self {
            SampleError::Open { device, .. }
            | SampleError::Read { device, .. }
            | SampleError::Parse { device, .. } => Some(device),
            SampleError::Store(_) => None,
        }
    }
}

/// What to do when a device cannot be opened or read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log, drop the device's snapshot and keep sampling the others.
    #[default]
    Isolate,
    /// Treat any failure as fatal to the whole process.
    Exit,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "isolate" => Ok(FailurePolicy::Isolate),
            "exit" => Ok(FailurePolicy::Exit),
            other => Err(format!(
                "unknown failure policy '{other}' (expected 'isolate' or 'exit')"
            )),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailurePolicy::Isolate => "isolate",
            FailurePolicy::Exit => "exit",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    /// No baseline yet; the next successful read becomes one.
    Initializing,
    /// Baseline held; the next successful read produces a snapshot.
    Running,
}

/// Result of one [`Sampler::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A snapshot was computed and published.
    Published(DeviceSnapshot),
    /// The read re-established a baseline; nothing published.
    Baseline,
    /// The read failed and the device was marked unavailable.
    Isolated,
}

pub struct Sampler<S: StatSource> {
    device: String,
    source: S,
    interval: Duration,
    baseline: Option<BlockStat>,
}

impl<S: StatSource> Sampler<S> {
    /// Opens `<sys_path>/block/<device>/stat` and reads the baseline.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `sys_path` - Root of the sysfs mount (usually "/sys")
    /// * `device` - Block device name, e.g. "sda"
    /// * `interval` - Configured tick interval, the rate denominator
    pub fn open<F>(
        fs: &F,
        sys_path: &Path,
        device: &str,
        interval: Duration,
    ) -> Result<Self, SampleError>
    where
        F: FileSystem<Source = S>,
    {
        let path = stat_path(sys_path, device);
        let source = fs.open(&path).map_err(|source| SampleError::Open {
            device: device.to_string(),
            path,
            source,
        })?;

        let mut sampler = Self {
            device: device.to_string(),
            source,
            interval,
            baseline: None,
        };
        sampler.baseline = Some(sampler.read()?);
        Ok(sampler)
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> SamplerState {
        if self.baseline.is_some() {
            SamplerState::Running
        } else {
            SamplerState::Initializing
        }
    }

    /// Re-reads and parses the counter source.
    pub fn read(&mut self) -> Result<BlockStat, SampleError> {
        let content = self.source.read_stat().map_err(|source| SampleError::Read {
            device: self.device.clone(),
            source,
        })?;
        parse_block_stat(content).map_err(|source| SampleError::Parse {
            device: self.device.clone(),
            source,
        })
    }

    /// Reads the source and computes rates against the baseline.
    ///
    /// Returns `Ok(None)` when there was no baseline to compare against. A
    /// failed read discards the baseline, so two consecutive good reads are
    /// needed before the next snapshot.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<Option<DeviceSnapshot>, SampleError> {
        let current = match self.read() {
            Ok(stat) => stat,
            Err(e) => {
                self.baseline = None;
                return Err(e);
            }
        };

        let snapshot = self.baseline.map(|prev| {
            trace!(
                device = %self.device,
                deltas = ?rates::deltas(&prev, &current),
                "counter deltas"
            );
            rates::compute_snapshot(&prev, &current, self.interval, now)
        });
        self.baseline = Some(current);
        Ok(snapshot)
    }

    /// Runs one tick and publishes the result, applying `policy` on failure.
    ///
    /// Under [`FailurePolicy::Exit`] read and parse errors are returned; under
    /// [`FailurePolicy::Isolate`] they clear the device's snapshot and yield
    /// [`TickOutcome::Isolated`].
    pub fn step(
        &mut self,
        store: &SnapshotStore,
        policy: FailurePolicy,
    ) -> Result<TickOutcome, SampleError> {
        match self.tick(Utc::now()) {
            Ok(Some(snapshot)) => {
                store.publish(&self.device, snapshot)?;
                Ok(TickOutcome::Published(snapshot))
            }
            Ok(None) => Ok(TickOutcome::Baseline),
            Err(e) if policy == FailurePolicy::Isolate => {
                warn!(device = %self.device, error = %e, "sample failed, device marked unavailable");
                store.clear(&self.device)?;
                Ok(TickOutcome::Isolated)
            }
            Err(e) => Err(e),
        }
    }
}
