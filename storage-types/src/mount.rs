// SPDX-License-Identifier: GPL-3.0-only

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// One line of the mount table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountEntry {
    /// Where the filesystem is mounted (e.g. "/run/media/user/DISK")
    pub mount_path: String,

    /// Source device (e.g. "/dev/sdb1")
    pub device_path: String,

    /// Filesystem type (e.g. "vfat")
    pub filesystem_type: String,

    /// Raw mount options, comma separated
    #[serde(default)]
    pub options: String,

    #[serde(default)]
    pub read_only: bool,
}

impl MountEntry {
    pub fn new(
        mount_path: impl Into<String>,
        device_path: impl Into<String>,
        filesystem_type: impl Into<String>,
    ) -> Self {
        Self {
            mount_path: mount_path.into(),
            device_path: device_path.into(),
            filesystem_type: filesystem_type.into(),
            options: String::new(),
            read_only: false,
        }
    }
}

// Mount path first so that entries for the same path sit together.
impl Ord for MountEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.mount_path
            .cmp(&other.mount_path)
            .then_with(|| self.device_path.cmp(&other.device_path))
            .then_with(|| self.filesystem_type.cmp(&other.filesystem_type))
            .then_with(|| self.options.cmp(&other.options))
            .then_with(|| self.read_only.cmp(&other.read_only))
    }
}

impl PartialOrd for MountEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
