// SPDX-License-Identifier: GPL-3.0-only

use storage_sys::SystemPaths;
use storage_types::{DeviceSnapshot, props};

/// Decides whether a volume-capable device is surfaced at all.
#[derive(Debug, Clone, Default)]
pub struct VolumeFilter {
    system_paths: SystemPaths,
}

impl VolumeFilter {
    pub fn new(system_paths: SystemPaths) -> Self {
        Self { system_paths }
    }

    /// A missing `volume.fsusage` keeps the volume.
    pub fn should_ignore(&self, snapshot: &DeviceSnapshot) -> bool {
        if snapshot.property_bool(props::VOLUME_IGNORE) {
            return true;
        }

        if let Some(usage) = snapshot.property_str(props::VOLUME_FSUSAGE)
            && usage != props::FSUSAGE_FILESYSTEM
        {
            return true;
        }

        if snapshot.property_bool(props::VOLUME_IS_MOUNTED)
            && let Some(mount_point) = snapshot.property_str(props::VOLUME_MOUNT_POINT)
            && self.system_paths.is_internal(mount_point)
        {
            return true;
        }

        false
    }

    pub fn keep(&self, snapshot: &DeviceSnapshot) -> bool {
        !self.should_ignore(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stick() -> DeviceSnapshot {
        DeviceSnapshot::new("volume_uuid_1234")
            .with_str(props::BLOCK_DEVICE, "/dev/sdb1")
            .with_str(props::VOLUME_FSUSAGE, "filesystem")
    }

    #[test]
    fn plain_filesystem_is_kept() {
        assert!(VolumeFilter::default().keep(&stick()));
    }

    #[test]
    fn missing_usage_is_kept() {
        let snapshot =
            DeviceSnapshot::new("volume_part2").with_str(props::BLOCK_DEVICE, "/dev/sdb2");
        assert!(VolumeFilter::default().keep(&snapshot));
    }

    #[test]
    fn ignore_flag_wins_over_everything() {
        let snapshot = stick()
            .with_bool(props::VOLUME_IGNORE, true)
            .with_bool(props::VOLUME_IS_MOUNTED, true)
            .with_str(props::VOLUME_MOUNT_POINT, "/run/media/alex/STICK");

        assert!(VolumeFilter::default().should_ignore(&snapshot));
    }

    #[test]
    fn non_filesystem_usage_is_ignored() {
        for usage in ["raid", "crypto", "other", ""] {
            let snapshot = stick().with_str(props::VOLUME_FSUSAGE, usage);
            assert!(VolumeFilter::default().should_ignore(&snapshot), "{usage}");
        }
    }

    #[test]
    fn mounted_under_system_path_is_ignored() {
        let filter = VolumeFilter::new(SystemPaths::with_extra_prefixes(["/srv/vm"]));

        let boot = stick()
            .with_bool(props::VOLUME_IS_MOUNTED, true)
            .with_str(props::VOLUME_MOUNT_POINT, "/boot");
        assert!(filter.should_ignore(&boot));

        let vm = stick()
            .with_bool(props::VOLUME_IS_MOUNTED, true)
            .with_str(props::VOLUME_MOUNT_POINT, "/srv/vm/disk0");
        assert!(filter.should_ignore(&vm));

        // stale mount point with is_mounted unset does not count
        let unmounted = stick().with_str(props::VOLUME_MOUNT_POINT, "/boot");
        assert!(filter.keep(&unmounted));
    }
}
