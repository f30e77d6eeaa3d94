// SPDX-License-Identifier: GPL-3.0-only

use std::sync::Arc;

use storage_types::{Capability, DeviceSnapshot, MountEntry};

/// Synchronous view of the device database.
///
/// Implementations must not block: any I/O happens before the monitor asks.
pub trait DeviceSource: Send + Sync {
    fn find_by_capability(&self, capability: Capability) -> Vec<DeviceSnapshot>;
}

/// Synchronous view of the mount table.
pub trait MountTableSource: Send + Sync {
    fn mount_entries(&self) -> Vec<MountEntry>;
}

impl<T: DeviceSource + ?Sized> DeviceSource for Arc<T> {
    fn find_by_capability(&self, capability: Capability) -> Vec<DeviceSnapshot> {
        (**self).find_by_capability(capability)
    }
}

impl<T: MountTableSource + ?Sized> MountTableSource for Arc<T> {
    fn mount_entries(&self) -> Vec<MountEntry> {
        (**self).mount_entries()
    }
}
