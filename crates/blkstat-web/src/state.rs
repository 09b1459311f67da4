//! Shared application state and global allocator.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::sync::Arc;

use axum::extract::State;

use blkstat_core::storage::SnapshotStore;

/// Store shared by every sampler (writers) and request handler (readers).
pub(crate) type SharedStore = Arc<SnapshotStore>;

pub(crate) type AppState = State<SharedStore>;
