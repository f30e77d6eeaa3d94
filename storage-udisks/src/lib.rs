// SPDX-License-Identifier: GPL-3.0-only

//! UDisks2 inventory provider
//!
//! Captures drives and block devices over the system bus and flattens them
//! into [`DeviceSnapshot`](storage_types::DeviceSnapshot)s keyed by object
//! path, using the HAL-style property names the monitor understands.

mod bytestring;

pub mod inventory;
pub mod manager;
pub mod probe;

pub use inventory::UDisksInventory;
pub use manager::{DeviceEvent, DeviceEventStream, device_event_stream};
pub use probe::{BlockFacts, DriveFacts, drive_snapshot, volume_snapshot};
