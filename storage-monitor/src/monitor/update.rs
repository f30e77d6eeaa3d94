// SPDX-License-Identifier: GPL-3.0-only

use std::mem;

use storage_types::{Capability, DeviceKey, DeviceSnapshot, MountEntry, props};
use tracing::debug;

use super::{VolumeMonitor, sorted_by_key};
use crate::diff::diff_sorted;
use crate::entity::{MountId, Volume, VolumeId};
use crate::event::MonitorEvent;

impl VolumeMonitor {
    /// Reconcile drives against every `storage`-capable device.
    pub fn update_drives(&mut self) {
        let mut fresh = sorted_by_key(self.devices.find_by_capability(Capability::Storage));
        let old = mem::take(&mut self.last_drives);
        let delta = diff_sorted(&old, &fresh, DeviceSnapshot::cmp_by_key);
        let mut unbuilt = Vec::new();

        for snapshot in &delta.removed {
            if let Some(drive) = self.registry.remove_drive(&snapshot.key) {
                self.push(MonitorEvent::DriveDisconnected(drive));
            }
        }

        for snapshot in &delta.added {
            if self.registry.drive(&snapshot.key).is_some() {
                continue;
            }

            let Some(drive) = self.factory.make_drive(snapshot, &self.context()) else {
                debug!("No drive built for {}", snapshot.key);
                unbuilt.push(snapshot.key.clone());
                continue;
            };
            let drive = self.registry.insert_drive(drive).clone();
            self.push(MonitorEvent::DriveConnected(drive));
        }

        forget_unbuilt(&mut fresh, &unbuilt);
        self.last_drives = fresh;
    }

    /// Reconcile volumes against every `volume`-capable device that passes
    /// the ignore filter.
    pub fn update_volumes(&mut self) {
        let mut fetched = self.devices.find_by_capability(Capability::Volume);
        fetched.retain(|snapshot| self.filter.keep(snapshot));
        let mut fresh = sorted_by_key(fetched);
        let old = mem::take(&mut self.last_volumes);
        let delta = diff_sorted(&old, &fresh, DeviceSnapshot::cmp_by_key);
        let mut unbuilt = Vec::new();

        for snapshot in &delta.removed {
            let id = VolumeId::Device(snapshot.key.clone());
            if let Some(volume) = self.registry.remove_volume(&id) {
                self.push(MonitorEvent::VolumeRemoved(volume));
            }
        }

        for snapshot in &delta.added {
            if self.registry.device_volume(&snapshot.key).is_some() {
                continue;
            }

            let drive = owning_drive_key(snapshot).and_then(|key| self.registry.drive(&key));
            let Some(volume) = self.factory.make_volume(snapshot, &self.context(), drive) else {
                debug!("No volume built for {}", snapshot.key);
                unbuilt.push(snapshot.key.clone());
                continue;
            };
            let volume = self.registry.insert_volume(volume).clone();
            self.push(MonitorEvent::VolumeAdded(volume));
        }

        forget_unbuilt(&mut fresh, &unbuilt);

        // kept volumes are not rebuilt, so their mount point is refreshed here
        for snapshot in &fresh {
            self.registry
                .set_volume_mount_point(&snapshot.key, Volume::reported_mount_point(snapshot));
        }
        self.last_volumes = fresh;
    }

    /// Reconcile mounts against the mount table.
    pub fn update_mounts(&mut self) {
        let mut fresh = self.mount_table.mount_entries();
        fresh.sort();
        fresh.dedup();
        let old = mem::take(&mut self.last_mounts);
        let delta = diff_sorted(&old, &fresh, MountEntry::cmp);
        let mut unbuilt = Vec::new();

        for entry in &delta.removed {
            let id = MountId::Path(entry.mount_path.clone());
            if let Some(mount) = self.registry.remove_mount(&id) {
                self.push(MonitorEvent::MountRemoved(mount));
            }
        }

        for entry in &delta.added {
            if self.registry.mount_by_path(&entry.mount_path).is_some() {
                continue;
            }

            let volume = self.registry.volume_for_mount_path(&entry.mount_path);
            let Some(mount) = self.factory.make_mount(entry, &self.context(), volume) else {
                unbuilt.push((*entry).clone());
                continue;
            };
            let mount = self.registry.insert_mount(mount).clone();
            self.push(MonitorEvent::MountAdded(mount));
        }

        fresh.retain(|entry| !unbuilt.contains(entry));
        self.last_mounts = fresh;
    }
}

/// Drop snapshots whose entity could not be built so the next pass sees
/// them as new again.
pub(super) fn forget_unbuilt(fresh: &mut Vec<DeviceSnapshot>, unbuilt: &[DeviceKey]) {
    if !unbuilt.is_empty() {
        fresh.retain(|snapshot| !unbuilt.contains(&snapshot.key));
    }
}

/// Key of the drive a block device declares it belongs to.
pub(super) fn owning_drive_key(snapshot: &DeviceSnapshot) -> Option<DeviceKey> {
    snapshot
        .property_str(props::BLOCK_STORAGE_DEVICE)
        .filter(|s| !s.is_empty())
        .map(DeviceKey::from)
}
