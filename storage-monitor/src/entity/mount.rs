// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use storage_types::{DeviceKey, MountEntry};

use super::basename;
use super::volume::{Volume, VolumeId};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MountId {
    /// A mount-table entry, keyed by mount path
    Path(String),
    /// Synthetic mount for a blank or audio disc
    Disc(DeviceKey),
}

impl fmt::Display for MountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.write_str(path),
            Self::Disc(key) => write!(f, "disc:{key}"),
        }
    }
}

/// A mounted filesystem, or a synthetic location standing in for one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    id: MountId,
    /// Root location: a mount path, or a URI for synthetic mounts
    pub root: String,
    pub name: String,
    pub icon: Option<String>,
    pub uuid: Option<String>,
    pub device_path: Option<String>,
    volume: Option<VolumeId>,
    unmounted: bool,
}

impl Mount {
    /// Mount for a mount-table entry; named after its volume when it has one.
    pub fn for_entry(entry: &MountEntry, volume: Option<&Volume>) -> Self {
        Self {
            id: MountId::Path(entry.mount_path.clone()),
            root: entry.mount_path.clone(),
            name: volume
                .map(|v| v.name.clone())
                .unwrap_or_else(|| basename(&entry.mount_path).to_string()),
            icon: None,
            uuid: volume.and_then(|v| v.uuid.clone()),
            device_path: Some(entry.device_path.clone()),
            volume: volume.map(Volume::id),
            unmounted: false,
        }
    }

    /// Synthetic mount for a disc volume.
    pub fn for_disc(
        key: DeviceKey,
        root: impl Into<String>,
        name: Option<&str>,
        icon: Option<&str>,
        volume: &Volume,
    ) -> Self {
        Self {
            id: MountId::Disc(key),
            root: root.into(),
            name: name.map_or_else(|| volume.name.clone(), str::to_string),
            icon: icon.map(str::to_string),
            uuid: volume.uuid.clone(),
            device_path: Some(volume.device_file.clone()),
            volume: Some(volume.id()),
            unmounted: false,
        }
    }

    pub fn id(&self) -> &MountId {
        &self.id
    }

    pub fn is_disc(&self) -> bool {
        matches!(self.id, MountId::Disc(_))
    }

    pub fn volume_id(&self) -> Option<&VolumeId> {
        self.volume.as_ref()
    }

    pub fn is_unmounted(&self) -> bool {
        self.unmounted
    }

    pub fn has_mount_path(&self, mount_path: &str) -> bool {
        matches!(&self.id, MountId::Path(p) if p == mount_path)
    }

    pub fn has_uuid(&self, uuid: &str) -> bool {
        self.uuid.as_deref() == Some(uuid)
    }

    pub(crate) fn unset_volume(&mut self) {
        self.volume = None;
    }

    pub(crate) fn mark_unmounted(&mut self) {
        self.unmounted = true;
        self.volume = None;
    }
}
