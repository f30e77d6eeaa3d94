// SPDX-License-Identifier: GPL-3.0-only

use storage_types::{DeviceKey, DeviceSnapshot, props};

use super::basename;

/// A connected drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drive {
    key: DeviceKey,
    pub name: String,
    pub device_file: Option<String>,
    pub can_eject: bool,
    connected: bool,
}

impl Drive {
    pub fn new(key: DeviceKey, name: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
            device_file: None,
            can_eject: false,
            connected: true,
        }
    }

    /// Build a drive from a `storage` snapshot, naming it after vendor and
    /// product when the database knows them.
    pub fn from_snapshot(snapshot: &DeviceSnapshot) -> Self {
        let device_file = snapshot
            .property_str(props::BLOCK_DEVICE)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let vendor = snapshot.property_str(props::INFO_VENDOR).unwrap_or("").trim();
        let product = snapshot.property_str(props::INFO_PRODUCT).unwrap_or("").trim();
        let name = match (vendor.is_empty(), product.is_empty()) {
            (false, false) => format!("{vendor} {product}"),
            (true, false) => product.to_string(),
            (false, true) => format!("{vendor} Drive"),
            (true, true) => device_file
                .as_deref()
                .map(basename)
                .unwrap_or(snapshot.key.as_str())
                .to_string(),
        };

        Self {
            key: snapshot.key.clone(),
            name,
            device_file,
            can_eject: snapshot.property_bool(props::STORAGE_EJECTABLE),
            connected: true,
        }
    }

    pub fn key(&self) -> &DeviceKey {
        &self.key
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub(crate) fn disconnect(&mut self) {
        self.connected = false;
    }
}
