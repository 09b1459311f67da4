//! Lock-free store of the latest snapshot per device.
//!
//! One `ArcSwapOption` cell per registered device. The key set is fixed at
//! construction, so the map itself is never mutated and needs no lock; each
//! cell is swapped atomically, which gives readers either no snapshot or a
//! complete one.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use thiserror::Error;

use crate::registry::DeviceRegistry;
use crate::storage::model::DeviceSnapshot;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("device '{0}' is not registered")]
    UnknownDevice(String),
}

/// Latest snapshot per device; one writer per key, any number of readers.
#[derive(Debug)]
pub struct SnapshotStore {
    slots: HashMap<String, ArcSwapOption<DeviceSnapshot>>,
}

impl SnapshotStore {
    /// Creates an empty slot for every device in the registry.
    pub fn new(registry: &DeviceRegistry) -> Self {
        let slots = registry
            .iter()
            .map(|device| (device.to_string(), ArcSwapOption::empty()))
            .collect();
        Self { slots }
    }

    /// Replaces the device's snapshot. Last write wins.
    pub fn publish(&self, device: &str, snapshot: DeviceSnapshot) -> Result<(), StoreError> {
        self.slot(device)?.store(Some(Arc::new(snapshot)));
        Ok(())
    }

    /// Removes the device's snapshot so readers stop seeing stale rates.
    pub fn clear(&self, device: &str) -> Result<(), StoreError> {
        self.slot(device)?.store(None);
        Ok(())
    }

    pub fn get(&self, device: &str) -> Option<DeviceSnapshot> {
        self.slots
            .get(device)
            .and_then(|slot| slot.load_full())
            .map(|snap| *snap)
    }

    /// Returns every device that currently has a snapshot.
    ///
    /// Devices not sampled yet (or cleared) are absent.
    pub fn read_all(&self) -> BTreeMap<String, DeviceSnapshot> {
        self.slots
            .iter()
            .filter_map(|(device, slot)| slot.load_full().map(|snap| (device.clone(), *snap)))
            .collect()
    }

    fn slot(&self, device: &str) -> Result<&ArcSwapOption<DeviceSnapshot>, StoreError> {
        self.slots
            .get(device)
            .ok_or_else(|| StoreError::UnknownDevice(device.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::thread;

    fn snap(v: i64) -> DeviceSnapshot {
        DeviceSnapshot {
            timestamp: Utc::now(),
            reads_per_second: v,
            bytes_read_per_second: v,
            read_wait_milliseconds: v,
            writes_per_second: v,
            bytes_written_per_second: v,
            write_wait_milliseconds: v,
            in_flight: v as u64,
            queue_wait_milliseconds: v,
        }
    }

    fn store(devices: &str) -> SnapshotStore {
        SnapshotStore::new(&DeviceRegistry::parse(devices).unwrap())
    }

    #[test]
    fn test_empty_store_reads_nothing() {
        let store = store("sda,sdb");
        assert!(store.read_all().is_empty());
        assert!(store.get("sda").is_none());
        assert!(store.clear("sda").is_ok());
        assert!(store.clear("sdb").is_ok());
    }

    #[test]
    fn test_publish_last_write_wins() {
        let store = store("sda,sdb");
        store.publish("sda", snap(1)).unwrap();
        store.publish("sda", snap(2)).unwrap();

        let all = store.read_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all["sda"].reads_per_second, 2);
        assert!(!all.contains_key("sdb"));
        assert_eq!(store.get("sda").unwrap().reads_per_second, 2);
    }

    #[test]
    fn test_clear_removes_device() {
        let store = store("sda");
        store.publish("sda", snap(7)).unwrap();
        store.clear("sda").unwrap();
        assert!(store.read_all().is_empty());
    }

    #[test]
    fn test_unknown_device() {
        let store = store("sda");
        assert_eq!(
            store.publish("sdz", snap(1)).unwrap_err(),
            StoreError::UnknownDevice("sdz".to_string())
        );
        assert!(store.clear("sdz").is_err());
        assert!(store.get("sdz").is_none());
    }

    #[test]
    fn test_readers_never_see_torn_snapshot() {
        let store = Arc::new(store("sda"));

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for v in 0..20_000 {
                    store.publish("sda", snap(v)).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..20_000 {
                        if let Some(s) = store.get("sda") {
                            let v = s.reads_per_second;
                            assert_eq!(s.bytes_read_per_second, v);
                            assert_eq!(s.write_wait_milliseconds, v);
                            assert_eq!(s.in_flight, v as u64);
                            assert_eq!(s.queue_wait_milliseconds, v);
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(store.get("sda").unwrap().reads_per_second, 19_999);
    }
}
