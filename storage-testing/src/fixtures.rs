// SPDX-License-Identifier: GPL-3.0-only

use std::sync::{Mutex, MutexGuard};

use storage_contracts::{DeviceSource, MountTableSource};
use storage_types::{Capability, DeviceKey, DeviceSnapshot, MountEntry, props};

/// A drive named after `product`.
pub fn drive(key: &str, product: &str) -> DeviceSnapshot {
    DeviceSnapshot::new(key)
        .with_capability(Capability::Storage)
        .with_str(props::INFO_PRODUCT, product)
}

/// An unmounted filesystem volume on `drive_key`.
pub fn volume(key: &str, drive_key: &str, device_file: &str) -> DeviceSnapshot {
    DeviceSnapshot::new(key)
        .with_capability(Capability::Volume)
        .with_str(props::BLOCK_STORAGE_DEVICE, drive_key)
        .with_str(props::BLOCK_DEVICE, device_file)
        .with_str(props::VOLUME_FSUSAGE, props::FSUSAGE_FILESYSTEM)
        .with_bool(props::VOLUME_IS_MOUNTED, false)
}

/// A filesystem volume the device database reports as mounted.
pub fn mounted_volume(
    key: &str,
    drive_key: &str,
    device_file: &str,
    mount_point: &str,
) -> DeviceSnapshot {
    volume(key, drive_key, device_file)
        .with_bool(props::VOLUME_IS_MOUNTED, true)
        .with_str(props::VOLUME_MOUNT_POINT, mount_point)
}

fn disc(key: &str, drive_key: &str, device_file: &str) -> DeviceSnapshot {
    DeviceSnapshot::new(key)
        .with_capability(Capability::Volume)
        .with_capability(Capability::Disc)
        .with_str(props::BLOCK_STORAGE_DEVICE, drive_key)
        .with_str(props::BLOCK_DEVICE, device_file)
        .with_str(props::VOLUME_FSUSAGE, "")
}

pub fn blank_disc(key: &str, drive_key: &str, device_file: &str) -> DeviceSnapshot {
    disc(key, drive_key, device_file).with_bool(props::DISC_IS_BLANK, true)
}

pub fn audio_disc(key: &str, drive_key: &str, device_file: &str) -> DeviceSnapshot {
    disc(key, drive_key, device_file).with_bool(props::DISC_HAS_AUDIO, true)
}

/// A data disc: neither blank nor audio.
pub fn data_disc(key: &str, drive_key: &str, device_file: &str) -> DeviceSnapshot {
    disc(key, drive_key, device_file).with_str(props::VOLUME_FSUSAGE, props::FSUSAGE_FILESYSTEM)
}

pub fn mount_entry(mount_path: &str, device_path: &str) -> MountEntry {
    MountEntry::new(mount_path, device_path, "vfat")
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory device database. Share it behind an `Arc` and change its
/// contents between updates.
#[derive(Debug, Default)]
pub struct FakeDevices {
    devices: Mutex<Vec<DeviceSnapshot>>,
}

impl FakeDevices {
    pub fn new(devices: Vec<DeviceSnapshot>) -> Self {
        Self {
            devices: Mutex::new(devices),
        }
    }

    pub fn set(&self, devices: Vec<DeviceSnapshot>) {
        *lock(&self.devices) = devices;
    }

    pub fn insert(&self, device: DeviceSnapshot) {
        let mut devices = lock(&self.devices);
        devices.retain(|d| d.key != device.key);
        devices.push(device);
    }

    pub fn remove(&self, key: &str) {
        let key = DeviceKey::from(key);
        lock(&self.devices).retain(|d| d.key != key);
    }

    pub fn len(&self) -> usize {
        lock(&self.devices).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.devices).is_empty()
    }
}

impl DeviceSource for FakeDevices {
    fn find_by_capability(&self, capability: Capability) -> Vec<DeviceSnapshot> {
        lock(&self.devices)
            .iter()
            .filter(|d| d.has_capability(capability))
            .cloned()
            .collect()
    }
}

/// In-memory mount table.
#[derive(Debug, Default)]
pub struct FakeMountTable {
    entries: Mutex<Vec<MountEntry>>,
}

impl FakeMountTable {
    pub fn new(entries: Vec<MountEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub fn set(&self, entries: Vec<MountEntry>) {
        *lock(&self.entries) = entries;
    }

    pub fn insert(&self, entry: MountEntry) {
        lock(&self.entries).push(entry);
    }

    pub fn remove(&self, mount_path: &str) {
        lock(&self.entries).retain(|e| e.mount_path != mount_path);
    }
}

impl MountTableSource for FakeMountTable {
    fn mount_entries(&self) -> Vec<MountEntry> {
        lock(&self.entries).clone()
    }
}
