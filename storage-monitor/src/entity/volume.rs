// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use storage_types::{DeviceKey, DeviceSnapshot, props};

use super::basename;

/// Which collection a volume lives in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VolumeId {
    /// Backed by a block device carrying a filesystem
    Device(DeviceKey),
    /// Synthesized for a blank or audio disc
    Disc(DeviceKey),
}

impl VolumeId {
    pub fn key(&self) -> &DeviceKey {
        match self {
            Self::Device(key) | Self::Disc(key) => key,
        }
    }
}

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(key) => write!(f, "{key}"),
            Self::Disc(key) => write!(f, "disc:{key}"),
        }
    }
}

/// A volume: something that can be mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    key: DeviceKey,
    disc: bool,
    pub name: String,
    pub uuid: Option<String>,
    pub device_file: String,
    /// Where the device database says it is mounted, if anywhere
    pub mount_point: Option<String>,
    drive: Option<DeviceKey>,
    removed: bool,
}

impl Volume {
    pub fn new(key: DeviceKey, device_file: impl Into<String>, drive: Option<DeviceKey>) -> Self {
        let device_file = device_file.into();
        Self {
            key,
            disc: false,
            name: basename(&device_file).to_string(),
            uuid: None,
            device_file,
            mount_point: None,
            drive,
            removed: false,
        }
    }

    /// `None` when the snapshot does not name a device file.
    pub fn from_snapshot(snapshot: &DeviceSnapshot, drive: Option<DeviceKey>) -> Option<Self> {
        let device_file = snapshot
            .property_str(props::BLOCK_DEVICE)
            .filter(|s| !s.is_empty())?;

        let mut volume = Self::new(snapshot.key.clone(), device_file, drive);

        if let Some(label) = snapshot
            .property_str(props::VOLUME_LABEL)
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            volume.name = label.to_string();
        }
        volume.uuid = snapshot
            .property_str(props::VOLUME_UUID)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        volume.mount_point = Self::reported_mount_point(snapshot);

        Some(volume)
    }

    /// Mount point the snapshot reports, only while it says it is mounted.
    pub(crate) fn reported_mount_point(snapshot: &DeviceSnapshot) -> Option<String> {
        if !snapshot.property_bool(props::VOLUME_IS_MOUNTED) {
            return None;
        }
        snapshot
            .property_str(props::VOLUME_MOUNT_POINT)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn id(&self) -> VolumeId {
        if self.disc {
            VolumeId::Disc(self.key.clone())
        } else {
            VolumeId::Device(self.key.clone())
        }
    }

    pub fn key(&self) -> &DeviceKey {
        &self.key
    }

    pub fn is_disc(&self) -> bool {
        self.disc
    }

    /// Key of the owning drive, if it is still connected.
    pub fn drive_key(&self) -> Option<&DeviceKey> {
        self.drive.as_ref()
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn has_mount_path(&self, mount_path: &str) -> bool {
        self.mount_point.as_deref() == Some(mount_path)
    }

    pub fn has_uuid(&self, uuid: &str) -> bool {
        self.uuid.as_deref() == Some(uuid)
    }

    pub(crate) fn mark_disc(&mut self) {
        self.disc = true;
        // disc volumes are never mounted through the mount table
        self.mount_point = None;
    }

    pub(crate) fn set_mount_point(&mut self, mount_point: Option<String>) {
        if !self.disc {
            self.mount_point = mount_point;
        }
    }

    pub(crate) fn unset_drive(&mut self) {
        self.drive = None;
    }

    pub(crate) fn mark_removed(&mut self) {
        self.removed = true;
        self.drive = None;
    }
}
