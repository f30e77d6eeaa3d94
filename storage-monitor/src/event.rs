// SPDX-License-Identifier: GPL-3.0-only

//! Lifecycle events queued by the monitor.

use std::fmt;

use tokio::sync::mpsc::UnboundedSender;

use crate::entity::{Drive, Mount, Volume};

/// One lifecycle change, carrying the entity as it was at that moment.
///
/// Removal events carry the torn-down entity: disconnected, removed or
/// unmounted, with its outward relations already cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    DriveConnected(Drive),
    DriveDisconnected(Drive),
    VolumeAdded(Volume),
    VolumeRemoved(Volume),
    MountAdded(Mount),
    MountRemoved(Mount),
}

impl MonitorEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DriveConnected(_) => "drive_connected",
            Self::DriveDisconnected(_) => "drive_disconnected",
            Self::VolumeAdded(_) => "volume_added",
            Self::VolumeRemoved(_) => "volume_removed",
            Self::MountAdded(_) => "mount_added",
            Self::MountRemoved(_) => "mount_removed",
        }
    }
}

impl fmt::Display for MonitorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DriveConnected(d) | Self::DriveDisconnected(d) => {
                write!(f, "{} {} ({})", self.kind(), d.name, d.key())
            }
            Self::VolumeAdded(v) | Self::VolumeRemoved(v) => {
                write!(f, "{} {} ({})", self.kind(), v.name, v.id())
            }
            Self::MountAdded(m) | Self::MountRemoved(m) => {
                write!(f, "{} {} at {}", self.kind(), m.name, m.root)
            }
        }
    }
}

/// Where drained events go.
pub trait EventSink {
    fn emit(&mut self, event: MonitorEvent);
}

impl EventSink for Vec<MonitorEvent> {
    fn emit(&mut self, event: MonitorEvent) {
        self.push(event);
    }
}

impl EventSink for UnboundedSender<MonitorEvent> {
    fn emit(&mut self, event: MonitorEvent) {
        // a closed receiver means nobody is listening any more
        let _ = self.send(event);
    }
}
