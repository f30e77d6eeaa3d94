// SPDX-License-Identifier: GPL-3.0-only

//! Flatten probed UDisks2 properties into device snapshots.
//!
//! Probing talks to the bus; this module does not. It only decides which
//! capabilities and properties a drive or block ends up with.

use storage_types::{Capability, DeviceSnapshot, props};

/// What the inventory learned about one `org.freedesktop.UDisks2.Drive`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriveFacts {
    pub vendor: String,
    pub model: String,
    pub ejectable: bool,
    pub optical: bool,
    pub media_available: bool,
    pub optical_blank: bool,
    pub optical_audio_tracks: u32,
}

impl DriveFacts {
    fn has_blank_disc(&self) -> bool {
        self.optical && self.media_available && self.optical_blank
    }

    fn has_audio_disc(&self) -> bool {
        self.optical && self.media_available && self.optical_audio_tracks > 0
    }
}

/// What the inventory learned about one `org.freedesktop.UDisks2.Block`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockFacts {
    pub device: String,
    /// Drive object path, `None` for loop devices and the like
    pub drive: Option<String>,
    pub id_usage: String,
    pub id_uuid: String,
    pub id_label: String,
    pub hint_ignore: bool,
    pub mount_points: Vec<String>,
}

pub fn drive_snapshot(object_path: &str, facts: &DriveFacts) -> DeviceSnapshot {
    let mut snapshot = DeviceSnapshot::new(object_path)
        .with_capability(Capability::Storage)
        .with_bool(props::STORAGE_EJECTABLE, facts.ejectable);
    if !facts.vendor.trim().is_empty() {
        snapshot = snapshot.with_str(props::INFO_VENDOR, facts.vendor.trim());
    }
    if !facts.model.trim().is_empty() {
        snapshot = snapshot.with_str(props::INFO_PRODUCT, facts.model.trim());
    }
    snapshot
}

/// Snapshot for a block object, or `None` when the block carries nothing a
/// volume could be built from (partition tables, unused whole disks).
///
/// `drive` must be the facts of the drive named by `facts.drive`, if known.
pub fn volume_snapshot(
    object_path: &str,
    facts: &BlockFacts,
    drive: Option<&DriveFacts>,
) -> Option<DeviceSnapshot> {
    let blank = drive.is_some_and(DriveFacts::has_blank_disc);
    let audio = drive.is_some_and(DriveFacts::has_audio_disc);

    if facts.id_usage.is_empty() && !blank && !audio {
        return None;
    }
    if facts.device.is_empty() {
        return None;
    }

    let mounted = facts.mount_points.first();
    let mut snapshot = DeviceSnapshot::new(object_path)
        .with_capability(Capability::Volume)
        .with_str(props::BLOCK_DEVICE, facts.device.as_str())
        .with_str(props::VOLUME_FSUSAGE, facts.id_usage.as_str())
        .with_bool(props::VOLUME_IGNORE, facts.hint_ignore)
        .with_bool(props::VOLUME_IS_MOUNTED, mounted.is_some());

    if let Some(drive_path) = facts.drive.as_deref() {
        snapshot = snapshot.with_str(props::BLOCK_STORAGE_DEVICE, drive_path);
    }
    if let Some(mount_point) = mounted {
        snapshot = snapshot.with_str(props::VOLUME_MOUNT_POINT, mount_point.as_str());
    }
    if !facts.id_uuid.is_empty() {
        snapshot = snapshot.with_str(props::VOLUME_UUID, facts.id_uuid.as_str());
    }
    if !facts.id_label.is_empty() {
        snapshot = snapshot.with_str(props::VOLUME_LABEL, facts.id_label.as_str());
    }

    if blank || audio {
        snapshot = snapshot
            .with_capability(Capability::Disc)
            .with_bool(props::DISC_IS_BLANK, blank)
            .with_bool(props::DISC_HAS_AUDIO, audio);
    }

    Some(snapshot)
}
