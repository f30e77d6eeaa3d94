// SPDX-License-Identifier: GPL-3.0-only

//! Canonical data carriers for the storage monitor
//!
//! These types are what the outside world hands to the monitor and what the
//! monitor hands back:
//!
//! - **storage-udisks** / **storage-sys**: produce `DeviceSnapshot` and `MountEntry`
//! - **storage-monitor**: diffs them, builds live entities, shapes `FileEvent`s
//! - **storage-service**: logs or forwards the results
//!
//! ## Snapshots
//!
//! A snapshot is immutable once captured. Every update cycle replaces the
//! whole set, so nothing in here is ever patched in place.

pub mod device;
pub mod file_event;
pub mod mount;
pub mod remote;

pub use device::{Capability, DeviceKey, DeviceSnapshot, PropertyValue, props};
pub use file_event::{FileEvent, FileEventKind};
pub use mount::MountEntry;
pub use remote::RemoteVolumeInfo;
