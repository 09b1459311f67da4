//! blkstat-core: block device I/O sampling library.
//!
//! Provides:
//! - `collector`: counter source abstraction (real sysfs, in-memory mock) and
//!   the `/sys/block/<dev>/stat` parser
//! - `rates`: conversion of two consecutive readings into per-second rates
//! - `registry`: the fixed set of monitored devices
//! - `sampler`: per-device baseline/tick state machine and failure policy
//! - `storage`: snapshot model and the lock-free snapshot store
//! - `util`: helper utilities (duration parsing)
//!
//! With `api` feature:
//! - OpenAPI schema derives on the snapshot model

pub mod collector;
pub mod rates;
pub mod registry;
pub mod sampler;
pub mod storage;
pub mod util;

/// Crate version with the short git SHA of the build.
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BLKSTAT_GIT_SHA"),
    ")"
);
