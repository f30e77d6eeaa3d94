// SPDX-License-Identifier: GPL-3.0-only

//! Reconciliation of the device database and mount table into live entities
//!
//! Every update runs four passes in a fixed order: drives, volumes, mounts,
//! discs. Each pass diffs a freshly fetched, sorted snapshot against the one
//! it stored last time, tears down what disappeared, builds what appeared and
//! queues a lifecycle event for each. Within a pass all removals run before
//! any addition.
//!
//! Events are never delivered from inside a pass. The host drains the queue
//! with [`VolumeMonitor::drain_events`] or [`VolumeMonitor::dispatch`] once
//! the update call has returned.

mod discs;
mod update;

pub use discs::{AUDIO_DISC_ICON, AUDIO_DISC_NAME, BLANK_DISC_ROOT, audio_disc_root};

use std::collections::VecDeque;

use storage_contracts::{DeviceSource, MountTableSource};
use storage_types::{DeviceKey, DeviceSnapshot, MountEntry};
use tracing::debug;

use crate::entity::{Drive, Mount, MountId, Volume, VolumeId};
use crate::event::{EventSink, MonitorEvent};
use crate::factory::{DefaultEntityFactory, EntityFactory, FactoryContext};
use crate::filter::VolumeFilter;
use crate::registry::EntityRegistry;

/// What prompted an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTrigger {
    /// The mount table changed
    MountsChanged,
    /// The set of configured mount points changed
    MountpointsChanged,
    /// The device database reported an added, removed or modified device
    DevicesChanged,
}

pub struct VolumeMonitor {
    devices: Box<dyn DeviceSource>,
    mount_table: Box<dyn MountTableSource>,
    factory: Box<dyn EntityFactory>,
    filter: VolumeFilter,
    registry: EntityRegistry,

    last_drives: Vec<DeviceSnapshot>,
    last_volumes: Vec<DeviceSnapshot>,
    last_mounts: Vec<MountEntry>,
    last_discs: Vec<DeviceSnapshot>,

    events: VecDeque<MonitorEvent>,
}

impl std::fmt::Debug for VolumeMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumeMonitor")
            .field("registry", &self.registry)
            .field("pending_events", &self.events.len())
            .finish_non_exhaustive()
    }
}

impl VolumeMonitor {
    /// Build a monitor with the default factory and filter.
    ///
    /// Nothing is fetched until the first [`force_update`](Self::force_update).
    pub fn new(
        devices: impl DeviceSource + 'static,
        mount_table: impl MountTableSource + 'static,
    ) -> Self {
        Self {
            devices: Box::new(devices),
            mount_table: Box::new(mount_table),
            factory: Box::new(DefaultEntityFactory::default()),
            filter: VolumeFilter::default(),
            registry: EntityRegistry::new(),
            last_drives: Vec::new(),
            last_volumes: Vec::new(),
            last_mounts: Vec::new(),
            last_discs: Vec::new(),
            events: VecDeque::new(),
        }
    }

    pub fn with_factory(mut self, factory: impl EntityFactory + 'static) -> Self {
        self.factory = Box::new(factory);
        self
    }

    pub fn with_filter(mut self, filter: VolumeFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Run all four passes against fresh snapshots.
    pub fn force_update(&mut self) {
        self.update_drives();
        self.update_volumes();
        self.update_mounts();
        self.update_discs();
    }

    /// Every trigger re-runs the full update; which source changed only
    /// matters for logging.
    pub fn handle(&mut self, trigger: UpdateTrigger) {
        debug!("Reconciling after {trigger:?}");
        self.force_update();
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn drives(&self) -> impl Iterator<Item = &Drive> {
        self.registry.drives()
    }

    pub fn volumes(&self) -> impl Iterator<Item = &Volume> {
        self.registry.volumes()
    }

    pub fn mounts(&self) -> impl Iterator<Item = &Mount> {
        self.registry.mounts()
    }

    pub fn drive(&self, key: &DeviceKey) -> Option<&Drive> {
        self.registry.drive(key)
    }

    pub fn volume(&self, id: &VolumeId) -> Option<&Volume> {
        self.registry.volume(id)
    }

    pub fn mount(&self, id: &MountId) -> Option<&Mount> {
        self.registry.mount(id)
    }

    pub fn volume_for_uuid(&self, uuid: &str) -> Option<&Volume> {
        self.registry.volume_for_uuid(uuid)
    }

    pub fn mount_for_uuid(&self, uuid: &str) -> Option<&Mount> {
        self.registry.mount_for_uuid(uuid)
    }

    /// Device-backed mounts only; disc mounts have no mount path.
    pub fn mount_for_mount_path(&self, mount_path: &str) -> Option<&Mount> {
        self.registry.mount_by_path(mount_path)
    }

    pub fn lookup_volume_for_mount_path(&self, mount_path: &str) -> Option<&Volume> {
        self.registry.volume_for_mount_path(mount_path)
    }

    pub fn volumes_of_drive<'a>(
        &'a self,
        drive: &'a DeviceKey,
    ) -> impl Iterator<Item = &'a Volume> {
        self.registry.volumes_of_drive(drive)
    }

    pub fn drive_of_volume(&self, volume: &Volume) -> Option<&Drive> {
        self.registry.drive_of_volume(volume)
    }

    pub fn volume_of_mount(&self, mount: &Mount) -> Option<&Volume> {
        self.registry.volume_of_mount(mount)
    }

    pub fn mount_of_volume(&self, volume: &VolumeId) -> Option<&Mount> {
        self.registry.mount_of_volume(volume)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Take every queued event, oldest first.
    pub fn drain_events(&mut self) -> Vec<MonitorEvent> {
        self.events.drain(..).collect()
    }

    /// Hand every queued event to `sink`, oldest first.
    pub fn dispatch(&mut self, sink: &mut impl EventSink) {
        while let Some(event) = self.events.pop_front() {
            sink.emit(event);
        }
    }

    fn context(&self) -> FactoryContext<'_> {
        FactoryContext {
            registry: &self.registry,
        }
    }

    fn push(&mut self, event: MonitorEvent) {
        debug!("{event}");
        self.events.push_back(event);
    }
}

/// Sort by key and drop repeated keys; the diff needs a strict order.
fn sorted_by_key(mut snapshots: Vec<DeviceSnapshot>) -> Vec<DeviceSnapshot> {
    snapshots.sort_by(DeviceSnapshot::cmp_by_key);
    snapshots.dedup_by(|a, b| a.key == b.key);
    snapshots
}
