// SPDX-License-Identifier: GPL-3.0-only

//! Arena of live drives, volumes and mounts.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use storage_types::DeviceKey;

use crate::entity::{Drive, Mount, MountId, Volume, VolumeId};

/// Five keyed collections of live entities.
///
/// Relations are stored as keys. Inserting an entity whose relation names
/// something that is not live drops the relation, and removing an entity
/// clears every relation that pointed at it, so the arena never holds a
/// dangling key.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    drives: BTreeMap<DeviceKey, Drive>,
    volumes: BTreeMap<DeviceKey, Volume>,
    mounts: BTreeMap<String, Mount>,
    disc_volumes: BTreeMap<DeviceKey, Volume>,
    disc_mounts: BTreeMap<DeviceKey, Mount>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.drives.is_empty()
            && self.volumes.is_empty()
            && self.mounts.is_empty()
            && self.disc_volumes.is_empty()
            && self.disc_mounts.is_empty()
    }

    pub fn drive(&self, key: &DeviceKey) -> Option<&Drive> {
        self.drives.get(key)
    }

    pub fn volume(&self, id: &VolumeId) -> Option<&Volume> {
        match id {
            VolumeId::Device(key) => self.volumes.get(key),
            VolumeId::Disc(key) => self.disc_volumes.get(key),
        }
    }

    pub fn mount(&self, id: &MountId) -> Option<&Mount> {
        match id {
            MountId::Path(path) => self.mounts.get(path),
            MountId::Disc(key) => self.disc_mounts.get(key),
        }
    }

    pub fn device_volume(&self, key: &DeviceKey) -> Option<&Volume> {
        self.volumes.get(key)
    }

    pub fn mount_by_path(&self, mount_path: &str) -> Option<&Mount> {
        self.mounts.get(mount_path)
    }

    pub fn disc_volume(&self, key: &DeviceKey) -> Option<&Volume> {
        self.disc_volumes.get(key)
    }

    pub fn disc_mount(&self, key: &DeviceKey) -> Option<&Mount> {
        self.disc_mounts.get(key)
    }

    pub fn drives(&self) -> impl Iterator<Item = &Drive> {
        self.drives.values()
    }

    /// Device volumes first, then disc volumes.
    pub fn volumes(&self) -> impl Iterator<Item = &Volume> {
        self.volumes.values().chain(self.disc_volumes.values())
    }

    /// Device mounts first, then disc mounts.
    pub fn mounts(&self) -> impl Iterator<Item = &Mount> {
        self.mounts.values().chain(self.disc_mounts.values())
    }

    /// Device volume whose reported mount point is `mount_path`.
    pub fn volume_for_mount_path(&self, mount_path: &str) -> Option<&Volume> {
        self.volumes.values().find(|v| v.has_mount_path(mount_path))
    }

    pub fn volume_for_uuid(&self, uuid: &str) -> Option<&Volume> {
        self.volumes().find(|v| v.has_uuid(uuid))
    }

    pub fn mount_for_uuid(&self, uuid: &str) -> Option<&Mount> {
        self.mounts().find(|m| m.has_uuid(uuid))
    }

    pub fn volumes_of_drive<'a>(
        &'a self,
        drive: &'a DeviceKey,
    ) -> impl Iterator<Item = &'a Volume> {
        self.volumes().filter(move |v| v.drive_key() == Some(drive))
    }

    pub fn drive_of_volume(&self, volume: &Volume) -> Option<&Drive> {
        volume.drive_key().and_then(|key| self.drives.get(key))
    }

    pub fn volume_of_mount(&self, mount: &Mount) -> Option<&Volume> {
        mount.volume_id().and_then(|id| self.volume(id))
    }

    pub fn mount_of_volume(&self, volume: &VolumeId) -> Option<&Mount> {
        self.mounts().find(|m| m.volume_id() == Some(volume))
    }

    pub(crate) fn insert_drive(&mut self, drive: Drive) -> &Drive {
        put(&mut self.drives, drive.key().clone(), drive)
    }

    pub(crate) fn insert_volume(&mut self, mut volume: Volume) -> &Volume {
        if volume
            .drive_key()
            .is_some_and(|key| !self.drives.contains_key(key))
        {
            volume.unset_drive();
        }

        let key = volume.key().clone();
        let collection = if volume.is_disc() {
            &mut self.disc_volumes
        } else {
            &mut self.volumes
        };
        put(collection, key, volume)
    }

    pub(crate) fn insert_mount(&mut self, mut mount: Mount) -> &Mount {
        if mount
            .volume_id()
            .is_some_and(|id| self.volume(id).is_none())
        {
            mount.unset_volume();
        }

        match mount.id().clone() {
            MountId::Path(path) => put(&mut self.mounts, path, mount),
            MountId::Disc(key) => put(&mut self.disc_mounts, key, mount),
        }
    }

    /// Follow a device volume to wherever its snapshot now says it is mounted.
    pub(crate) fn set_volume_mount_point(&mut self, key: &DeviceKey, mount_point: Option<String>) {
        if let Some(volume) = self.volumes.get_mut(key) {
            volume.set_mount_point(mount_point);
        }
    }

    /// Detach a drive. Volumes it owned stay live but lose their drive.
    pub(crate) fn remove_drive(&mut self, key: &DeviceKey) -> Option<Drive> {
        let mut drive = self.drives.remove(key)?;
        drive.disconnect();

        for volume in self
            .volumes
            .values_mut()
            .chain(self.disc_volumes.values_mut())
            .filter(|v| v.drive_key() == Some(key))
        {
            volume.unset_drive();
        }

        Some(drive)
    }

    pub(crate) fn remove_volume(&mut self, id: &VolumeId) -> Option<Volume> {
        let mut volume = match id {
            VolumeId::Device(key) => self.volumes.remove(key),
            VolumeId::Disc(key) => self.disc_volumes.remove(key),
        }?;
        volume.mark_removed();

        for mount in self
            .mounts
            .values_mut()
            .chain(self.disc_mounts.values_mut())
            .filter(|m| m.volume_id() == Some(id))
        {
            mount.unset_volume();
        }

        Some(volume)
    }

    pub(crate) fn remove_mount(&mut self, id: &MountId) -> Option<Mount> {
        let mut mount = match id {
            MountId::Path(path) => self.mounts.remove(path),
            MountId::Disc(key) => self.disc_mounts.remove(key),
        }?;
        mount.mark_unmounted();
        Some(mount)
    }

    /// Relations that name an entity which is no longer live.
    ///
    /// Always empty unless something bypassed the insert/remove methods.
    pub fn dangling_references(&self) -> Vec<String> {
        let mut dangling = Vec::new();

        for volume in self.volumes() {
            if let Some(drive) = volume.drive_key()
                && !self.drives.contains_key(drive)
            {
                dangling.push(format!("volume {} -> drive {drive}", volume.id()));
            }
        }

        for mount in self.mounts() {
            if let Some(volume) = mount.volume_id()
                && self.volume(volume).is_none()
            {
                dangling.push(format!("mount {} -> volume {volume}", mount.id()));
            }
        }

        dangling
    }
}

fn put<K: Ord, V>(collection: &mut BTreeMap<K, V>, key: K, value: V) -> &V {
    match collection.entry(key) {
        Entry::Occupied(mut entry) => {
            entry.insert(value);
            entry.into_mut()
        }
        Entry::Vacant(entry) => entry.insert(value),
    }
}
