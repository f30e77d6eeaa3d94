// SPDX-License-Identifier: GPL-3.0-only

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// State of a volume living in another process, as last reported by it.
///
/// Empty strings are how the remote side says "absent"; the monitor
/// normalizes them when applying an update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteVolumeInfo {
    pub id: String,
    pub name: String,
    /// Serialized icon name, empty for none
    pub icon: String,
    pub uuid: String,
    pub activation_uri: String,
    pub can_mount: bool,
    /// Only honoured while the owning drive allows ejecting
    #[serde(default)]
    pub can_eject: bool,
    pub should_automount: bool,
    pub drive_id: String,
    pub mount_id: String,
    #[serde(default)]
    pub identifiers: BTreeMap<String, String>,
}
