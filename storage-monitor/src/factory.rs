// SPDX-License-Identifier: GPL-3.0-only

//! Construction of live entities from snapshots.
//!
//! Returning `None` is not an error: the entity is simply absent this cycle
//! and is tried again on the next one while its snapshot persists.

use storage_sys::{SystemPaths, is_pseudo_fs_type};
use storage_types::{DeviceSnapshot, MountEntry};

use crate::entity::{Drive, Mount, Volume};
use crate::registry::EntityRegistry;

/// Read-only view of the monitor handed to factories.
#[derive(Debug, Clone, Copy)]
pub struct FactoryContext<'a> {
    pub registry: &'a EntityRegistry,
}

pub trait EntityFactory: Send {
    fn make_drive(&self, snapshot: &DeviceSnapshot, ctx: &FactoryContext<'_>) -> Option<Drive>;

    fn make_volume(
        &self,
        snapshot: &DeviceSnapshot,
        ctx: &FactoryContext<'_>,
        drive: Option<&Drive>,
    ) -> Option<Volume>;

    fn make_mount(
        &self,
        entry: &MountEntry,
        ctx: &FactoryContext<'_>,
        volume: Option<&Volume>,
    ) -> Option<Mount>;

    /// Synthetic mount for a disc volume rooted at `root`.
    fn make_disc_mount(
        &self,
        snapshot: &DeviceSnapshot,
        root: &str,
        name: Option<&str>,
        icon: Option<&str>,
        ctx: &FactoryContext<'_>,
        volume: &Volume,
    ) -> Option<Mount>;
}

/// Factory used by the service.
#[derive(Debug, Clone, Default)]
pub struct DefaultEntityFactory {
    system_paths: SystemPaths,
}

impl DefaultEntityFactory {
    pub fn new(system_paths: SystemPaths) -> Self {
        Self { system_paths }
    }
}

impl EntityFactory for DefaultEntityFactory {
    fn make_drive(&self, snapshot: &DeviceSnapshot, _ctx: &FactoryContext<'_>) -> Option<Drive> {
        Some(Drive::from_snapshot(snapshot))
    }

    fn make_volume(
        &self,
        snapshot: &DeviceSnapshot,
        _ctx: &FactoryContext<'_>,
        drive: Option<&Drive>,
    ) -> Option<Volume> {
        Volume::from_snapshot(snapshot, drive.map(|d| d.key().clone()))
    }

    fn make_mount(
        &self,
        entry: &MountEntry,
        _ctx: &FactoryContext<'_>,
        volume: Option<&Volume>,
    ) -> Option<Mount> {
        if entry.mount_path.is_empty() {
            return None;
        }

        // Mounts without a volume are only interesting outside system plumbing
        if volume.is_none()
            && (self.system_paths.is_internal(&entry.mount_path)
                || is_pseudo_fs_type(&entry.filesystem_type))
        {
            return None;
        }

        Some(Mount::for_entry(entry, volume))
    }

    fn make_disc_mount(
        &self,
        snapshot: &DeviceSnapshot,
        root: &str,
        name: Option<&str>,
        icon: Option<&str>,
        _ctx: &FactoryContext<'_>,
        volume: &Volume,
    ) -> Option<Mount> {
        if root.is_empty() {
            return None;
        }
        Some(Mount::for_disc(snapshot.key.clone(), root, name, icon, volume))
    }
}
