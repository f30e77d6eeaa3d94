// SPDX-License-Identifier: GPL-3.0-only

//! Change detection and reconciliation for removable storage
//!
//! Two pieces live here:
//!
//! - [`VolumeMonitor`]: diffs successive device and mount-table snapshots
//!   and keeps a live arena of drives, volumes and mounts in step, queueing
//!   `MonitorEvent`s for the host to drain.
//! - [`ChangeEventShaper`]: turns a bursty stream of raw file notifications
//!   into a rate-limited one with a derived "changes done" hint.
//!   [`FileMonitor`] runs one on a tokio task.
//!
//! The remote volume proxy in [`proxy`] covers volumes owned by another
//! process and the shadow mounts that stand in for them.

pub mod diff;
pub mod entity;
pub mod error;
pub mod event;
pub mod factory;
pub mod filter;
pub mod monitor;
pub mod proxy;
pub mod registry;
pub mod shaper;

pub use diff::{SortedDiff, diff_sorted};
pub use entity::{Drive, Mount, MountId, Volume, VolumeId};
pub use error::MonitorError;
pub use event::{EventSink, MonitorEvent};
pub use factory::{DefaultEntityFactory, EntityFactory, FactoryContext};
pub use filter::VolumeFilter;
pub use monitor::{UpdateTrigger, VolumeMonitor};
pub use registry::EntityRegistry;
pub use shaper::{ChangeEventShaper, FileMonitor, ShaperConfig};
