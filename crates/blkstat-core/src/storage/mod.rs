//! Snapshot model and the shared snapshot store.

pub mod model;
pub mod store;

pub use model::DeviceSnapshot;
pub use store::{SnapshotStore, StoreError};
