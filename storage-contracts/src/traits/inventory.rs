// SPDX-License-Identifier: GPL-3.0-only

use std::sync::Mutex;

use async_trait::async_trait;

use storage_types::{Capability, DeviceSnapshot};

use super::discovery::DeviceSource;
use crate::StorageError;

/// A captured device inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub devices: Vec<DeviceSnapshot>,
}

impl Inventory {
    pub fn new(devices: Vec<DeviceSnapshot>) -> Self {
        Self { devices }
    }
}

impl DeviceSource for Inventory {
    fn find_by_capability(&self, capability: Capability) -> Vec<DeviceSnapshot> {
        self.devices
            .iter()
            .filter(|d| d.has_capability(capability))
            .cloned()
            .collect()
    }
}

/// Asynchronous producer of inventories (D-Bus, HAL, ...).
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    async fn capture(&self) -> Result<Inventory, StorageError>;
}

/// Holds the latest captured inventory for the monitor to read.
///
/// The async side calls [`InventoryCell::replace`] after a capture, then
/// triggers a monitor update on the same task.
#[derive(Debug, Default)]
pub struct InventoryCell {
    current: Mutex<Inventory>,
}

impl InventoryCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, inventory: Inventory) {
        match self.current.lock() {
            Ok(mut guard) => *guard = inventory,
            Err(poisoned) => *poisoned.into_inner() = inventory,
        }
    }

    pub fn device_count(&self) -> usize {
        match self.current.lock() {
            Ok(guard) => guard.devices.len(),
            Err(poisoned) => poisoned.into_inner().devices.len(),
        }
    }
}

impl DeviceSource for InventoryCell {
    fn find_by_capability(&self, capability: Capability) -> Vec<DeviceSnapshot> {
        match self.current.lock() {
            Ok(guard) => guard.find_by_capability(capability),
            Err(poisoned) => poisoned.into_inner().find_by_capability(capability),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider(Vec<DeviceSnapshot>);

    #[async_trait]
    impl InventoryProvider for FixedProvider {
        async fn capture(&self) -> Result<Inventory, StorageError> {
            Ok(Inventory::new(self.0.clone()))
        }
    }

    #[tokio::test]
    async fn cell_serves_latest_capture_by_capability() {
        let provider = FixedProvider(vec![
            DeviceSnapshot::new("drive_a").with_capability(Capability::Storage),
            DeviceSnapshot::new("vol_a1")
                .with_capability(Capability::Volume)
                .with_capability(Capability::Disc),
        ]);
        let cell = InventoryCell::new();
        assert!(cell.find_by_capability(Capability::Storage).is_empty());

        cell.replace(provider.capture().await.expect("capture"));

        assert_eq!(cell.device_count(), 2);
        assert_eq!(cell.find_by_capability(Capability::Storage).len(), 1);
        assert_eq!(cell.find_by_capability(Capability::Disc)[0].key.as_str(), "vol_a1");
    }
}
