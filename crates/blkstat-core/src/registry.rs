//! The fixed set of monitored block devices.
//!
//! Built once at startup from the comma-separated `--devices` list and never
//! modified afterwards; every entry owns one sampler and one store slot.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Device monitored when the configured list is empty.
pub const DEFAULT_DEVICE: &str = "sda";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("invalid device name {0:?}: must be a plain /sys/block entry name")]
    InvalidName(String),
}

/// Ordered, duplicate-free list of device names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRegistry {
    devices: Vec<String>,
}

impl DeviceRegistry {
    /// Parses a comma-separated device list.
    ///
    /// Entries are trimmed, empty entries are skipped and duplicates keep
    /// their first position. A list with no entries falls back to
    /// [`DEFAULT_DEVICE`].
    pub fn parse(list: &str) -> Result<Self, RegistryError> {
        let mut devices: Vec<String> = Vec::new();
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if name.contains('/') || name == "." || name == ".." {
                return Err(RegistryError::InvalidName(name.to_string()));
            }
            if !devices.iter().any(|d| d == name) {
                devices.push(name.to_string());
            }
        }
        if devices.is_empty() {
            devices.push(DEFAULT_DEVICE.to_string());
        }
        Ok(Self { devices })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.devices.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self {
            devices: vec![DEFAULT_DEVICE.to_string()],
        }
    }
}

/// Path of a device's counter file under a sysfs root, e.g. `/sys/block/sda/stat`.
pub fn stat_path(sys_path: impl AsRef<Path>, device: &str) -> PathBuf {
    sys_path.as_ref().join("block").join(device).join("stat")
}
