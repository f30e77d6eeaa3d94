// SPDX-License-Identifier: GPL-3.0-only

use std::mem;

use storage_types::{Capability, DeviceSnapshot, props};
use tracing::debug;

use super::update::{forget_unbuilt, owning_drive_key};
use super::{VolumeMonitor, sorted_by_key};
use crate::diff::diff_sorted;
use crate::entity::{MountId, VolumeId};
use crate::event::MonitorEvent;

/// Root of every blank disc mount.
pub const BLANK_DISC_ROOT: &str = "burn:///";
pub const AUDIO_DISC_NAME: &str = "Audio Disc";
pub const AUDIO_DISC_ICON: &str = "media-optical-audio";

/// Blank and audio discs have no filesystem to mount, so they get a
/// synthetic volume and mount pair instead.
fn is_blank_or_audio(snapshot: &DeviceSnapshot) -> bool {
    snapshot.property_bool(props::DISC_IS_BLANK) || snapshot.property_bool(props::DISC_HAS_AUDIO)
}

/// `cdda://sr0/` style root for an audio disc in `device_file`.
pub fn audio_disc_root(device_file: &str) -> String {
    format!("cdda://{}/", urlencoding::encode(device_file))
}

impl VolumeMonitor {
    /// Reconcile the synthetic volume and mount pairs for blank and audio
    /// discs. Runs after the drives pass so a new disc can find its drive.
    pub fn update_discs(&mut self) {
        let mut fetched = self.devices.find_by_capability(Capability::Disc);
        fetched.retain(is_blank_or_audio);
        let mut fresh = sorted_by_key(fetched);
        let old = mem::take(&mut self.last_discs);
        let delta = diff_sorted(&old, &fresh, DeviceSnapshot::cmp_by_key);

        for snapshot in &delta.removed {
            let key = &snapshot.key;
            if let Some(mount) = self.registry.remove_mount(&MountId::Disc(key.clone())) {
                self.push(MonitorEvent::MountRemoved(mount));
            }
            if let Some(volume) = self.registry.remove_volume(&VolumeId::Disc(key.clone())) {
                self.push(MonitorEvent::VolumeRemoved(volume));
            }
        }

        let mut unbuilt = Vec::new();
        for snapshot in &delta.added {
            if !self.add_disc(snapshot) {
                unbuilt.push(snapshot.key.clone());
            }
        }

        forget_unbuilt(&mut fresh, &unbuilt);
        self.last_discs = fresh;
    }

    /// `false` when the pair could not be built this time.
    fn add_disc(&mut self, snapshot: &DeviceSnapshot) -> bool {
        let key = &snapshot.key;
        if self.registry.disc_volume(key).is_some() {
            return true;
        }

        let Some(drive) = owning_drive_key(snapshot).and_then(|k| self.registry.drive(&k)) else {
            debug!("Disc {key} has no known drive, skipping");
            return false;
        };

        let ctx = self.context();
        let Some(mut volume) = self.factory.make_volume(snapshot, &ctx, Some(drive)) else {
            debug!("No volume built for disc {key}");
            return false;
        };
        volume.mark_disc();

        let mount = if snapshot.property_bool(props::DISC_IS_BLANK) {
            self.factory
                .make_disc_mount(snapshot, BLANK_DISC_ROOT, None, None, &ctx, &volume)
        } else {
            let device_file = snapshot.property_str(props::BLOCK_DEVICE).unwrap_or_default();
            self.factory.make_disc_mount(
                snapshot,
                &audio_disc_root(device_file),
                Some(AUDIO_DISC_NAME),
                Some(AUDIO_DISC_ICON),
                &ctx,
                &volume,
            )
        };

        // Both or neither: without a mount the volume is dropped unannounced
        let Some(mount) = mount else {
            debug!("No mount built for disc {key}, dropping its volume");
            return false;
        };

        let volume = self.registry.insert_volume(volume).clone();
        self.push(MonitorEvent::VolumeAdded(volume));
        let mount = self.registry.insert_mount(mount).clone();
        self.push(MonitorEvent::MountAdded(mount));
        true
    }
}
