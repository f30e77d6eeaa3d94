// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};

use anyhow::Result;
use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use tracing::warn;
use zbus::{
    Connection,
    zvariant::{self, Value},
};
use zbus_macros::proxy;

const BLOCK_IFACE: &str = "org.freedesktop.UDisks2.Block";
const DRIVE_IFACE: &str = "org.freedesktop.UDisks2.Drive";

#[proxy(
    default_service = "org.freedesktop.UDisks2",
    default_path = "/org/freedesktop/UDisks2/Manager",
    interface = "org.freedesktop.UDisks2.Manager"
)]
pub trait UDisks2Manager {
    fn get_block_devices(
        &self,
        options: HashMap<String, Value<'_>>,
    ) -> zbus::Result<Vec<zvariant::OwnedObjectPath>>;
}

#[proxy(
    default_service = "org.freedesktop.UDisks2",
    default_path = "/org/freedesktop/UDisks2",
    interface = "org.freedesktop.DBus.ObjectManager"
)]
pub trait UDisks2ObjectManager {
    #[zbus(signal)]
    fn interfaces_added(
        &self,
        object_path: zvariant::OwnedObjectPath,
        interfaces_and_properties: HashMap<String, HashMap<String, zvariant::OwnedValue>>,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    fn interfaces_removed(
        &self,
        object_path: zvariant::OwnedObjectPath,
        interfaces: Vec<String>,
    ) -> zbus::Result<()>;
}

/// A drive or block object appeared or went away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Added(String),
    Removed(String),
}

impl DeviceEvent {
    pub fn object_path(&self) -> &str {
        match self {
            Self::Added(path) | Self::Removed(path) => path,
        }
    }
}

pub struct DeviceEventStream {
    inner: BoxStream<'static, DeviceEvent>,
}

fn concerns_devices<'a>(mut interfaces: impl Iterator<Item = &'a str>) -> bool {
    interfaces.any(|iface| iface == BLOCK_IFACE || iface == DRIVE_IFACE)
}

fn added_event(signal: &InterfacesAdded) -> Option<DeviceEvent> {
    let args = signal
        .args()
        .inspect_err(|e| warn!("Failed to parse InterfacesAdded signal args: {e}"))
        .ok()?;
    concerns_devices(args.interfaces_and_properties.keys().map(String::as_str))
        .then(|| DeviceEvent::Added(args.object_path.to_string()))
}

fn removed_event(signal: &InterfacesRemoved) -> Option<DeviceEvent> {
    let args = signal
        .args()
        .inspect_err(|e| warn!("Failed to parse InterfacesRemoved signal args: {e}"))
        .ok()?;
    concerns_devices(args.interfaces.iter().map(String::as_str))
        .then(|| DeviceEvent::Removed(args.object_path.to_string()))
}

/// Signal-based stream of drive and block add/remove events.
///
/// Listens to `org.freedesktop.DBus.ObjectManager` on the UDisks2 root
/// object. Any event means the inventory is stale; the stream does not say
/// what changed beyond the object path. Property changes on existing
/// objects (mounts, media insertion) are not reported here and are picked
/// up by polling. The stream ends once both signal subscriptions end.
pub async fn device_event_stream(connection: &Connection) -> Result<DeviceEventStream> {
    let object_manager = UDisks2ObjectManagerProxy::new(connection).await?;
    let added = object_manager
        .receive_interfaces_added()
        .await?
        .filter_map(|signal| async move { added_event(&signal) });
    let removed = object_manager
        .receive_interfaces_removed()
        .await?
        .filter_map(|signal| async move { removed_event(&signal) });

    Ok(DeviceEventStream {
        inner: stream::select(added, removed).boxed(),
    })
}

impl Stream for DeviceEventStream {
    type Item = DeviceEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}
