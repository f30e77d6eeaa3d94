// SPDX-License-Identifier: GPL-3.0-only

//! Device snapshots as captured from the device database.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known property names carried by device snapshots.
pub mod props {
    /// Key of the storage device (drive) a block belongs to
    pub const BLOCK_STORAGE_DEVICE: &str = "block.storage_device";
    /// Device file, e.g. "/dev/sr0"
    pub const BLOCK_DEVICE: &str = "block.device";
    pub const INFO_VENDOR: &str = "info.vendor";
    pub const INFO_PRODUCT: &str = "info.product";
    pub const STORAGE_EJECTABLE: &str = "storage.requires_eject";
    pub const VOLUME_FSUSAGE: &str = "volume.fsusage";
    pub const VOLUME_IGNORE: &str = "volume.ignore";
    pub const VOLUME_IS_MOUNTED: &str = "volume.is_mounted";
    pub const VOLUME_MOUNT_POINT: &str = "volume.mount_point";
    pub const VOLUME_UUID: &str = "volume.uuid";
    pub const VOLUME_LABEL: &str = "volume.label";
    pub const DISC_IS_BLANK: &str = "volume.disc.is_blank";
    pub const DISC_HAS_AUDIO: &str = "volume.disc.has_audio";

    /// The only `volume.fsusage` value that is surfaced as a volume
    pub const FSUSAGE_FILESYSTEM: &str = "filesystem";
}

/// Stable device identifier (UDI).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceKey(String);

impl DeviceKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DeviceKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Capability tags a device can be enumerated by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// A drive: something that holds media
    Storage,
    /// A block device that may carry a filesystem
    Volume,
    /// Optical disc media
    Disc,
}

impl Capability {
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Storage => "storage",
            Self::Volume => "volume",
            Self::Disc => "volume.disc",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "storage" => Some(Self::Storage),
            "volume" => Some(Self::Volume),
            "volume.disc" => Some(Self::Disc),
            _ => None,
        }
    }
}

/// A typed property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Str(String),
}

/// One device as seen by the device database at capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub key: DeviceKey,

    #[serde(default)]
    pub capabilities: BTreeSet<Capability>,

    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl DeviceSnapshot {
    pub fn new(key: impl Into<DeviceKey>) -> Self {
        Self {
            key: key.into(),
            capabilities: BTreeSet::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    pub fn with_str(mut self, name: &str, value: impl Into<String>) -> Self {
        self.properties
            .insert(name.to_string(), PropertyValue::Str(value.into()));
        self
    }

    pub fn with_bool(mut self, name: &str, value: bool) -> Self {
        self.properties
            .insert(name.to_string(), PropertyValue::Bool(value));
        self
    }

    pub fn key(&self) -> &DeviceKey {
        &self.key
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// String property, `None` when absent or not a string.
    pub fn property_str(&self, name: &str) -> Option<&str> {
        match self.properties.get(name) {
            Some(PropertyValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Boolean property; absent or non-boolean reads as `false`.
    pub fn property_bool(&self, name: &str) -> bool {
        matches!(self.properties.get(name), Some(PropertyValue::Bool(true)))
    }

    /// Order used by every device pass: by key only.
    pub fn cmp_by_key(a: &Self, b: &Self) -> std::cmp::Ordering {
        a.key.cmp(&b.key)
    }
}
