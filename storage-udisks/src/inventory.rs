// SPDX-License-Identifier: GPL-3.0-only

//! Device inventory captured from UDisks2.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::Result;
use async_trait::async_trait;
use storage_contracts::{Inventory, InventoryProvider, StorageError};
use storage_types::DeviceSnapshot;
use tracing::{debug, warn};
use udisks2::{block::BlockProxy, drive::DriveProxy, filesystem::FilesystemProxy};
use zbus::Connection;
use zbus::zvariant::OwnedObjectPath;

use crate::bytestring as bs;
use crate::manager::UDisks2ManagerProxy;
use crate::probe::{BlockFacts, DriveFacts, drive_snapshot, volume_snapshot};

pub struct UDisksInventory {
    connection: Connection,
}

impl UDisksInventory {
    pub async fn new() -> Result<Self> {
        let connection = Connection::system().await?;
        Ok(Self { connection })
    }

    pub fn with_connection(connection: Connection) -> Self {
        Self { connection }
    }

    /// Get a reference to the D-Bus connection
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    async fn collect(&self) -> Result<Vec<DeviceSnapshot>> {
        let manager_proxy = UDisks2ManagerProxy::new(&self.connection).await?;
        let block_paths = manager_proxy.get_block_devices(HashMap::new()).await?;

        let mut blocks = Vec::with_capacity(block_paths.len());
        for path in block_paths {
            match probe_block(&self.connection, &path).await {
                Ok(facts) => blocks.push((path.to_string(), facts)),
                Err(e) => warn!("Skipping block {path}: {e:#}"),
            }
        }

        let drive_paths: BTreeSet<&str> = blocks
            .iter()
            .filter_map(|(_, facts)| facts.drive.as_deref())
            .collect();

        let mut drives = BTreeMap::new();
        for path in drive_paths {
            match probe_drive(&self.connection, path).await {
                Ok(facts) => {
                    drives.insert(path.to_string(), facts);
                }
                Err(e) => warn!("Skipping drive {path}: {e:#}"),
            }
        }

        let mut devices: Vec<DeviceSnapshot> = drives
            .iter()
            .map(|(path, facts)| drive_snapshot(path, facts))
            .collect();
        devices.extend(blocks.iter().filter_map(|(path, facts)| {
            let drive = facts.drive.as_ref().and_then(|d| drives.get(d));
            volume_snapshot(path, facts, drive)
        }));

        debug!(
            "Captured {} drives and {} blocks as {} snapshots",
            drives.len(),
            blocks.len(),
            devices.len()
        );
        Ok(devices)
    }
}

#[async_trait]
impl InventoryProvider for UDisksInventory {
    async fn capture(&self) -> Result<Inventory, StorageError> {
        self.collect()
            .await
            .map(Inventory::new)
            .map_err(|e| StorageError::unavailable(format!("UDisks2 inventory: {e:#}")))
    }
}

async fn probe_block(connection: &Connection, path: &OwnedObjectPath) -> Result<BlockFacts> {
    let block_proxy = BlockProxy::builder(connection).path(path)?.build().await?;

    let preferred = bs::decode_c_string_bytes(&block_proxy.preferred_device().await?);
    let device = if preferred.is_empty() {
        bs::decode_c_string_bytes(&block_proxy.device().await?)
    } else {
        preferred
    };

    let drive = match block_proxy.drive().await {
        Ok(dp) if dp.as_str() != "/" => Some(dp.to_string()),
        _ => None,
    };

    let mount_points = match FilesystemProxy::builder(connection).path(path)?.build().await {
        Ok(proxy) => match proxy.mount_points().await {
            Ok(mps) => bs::decode_mount_points(mps),
            Err(_) => Vec::new(),
        },
        Err(_) => Vec::new(),
    };

    Ok(BlockFacts {
        device,
        drive,
        id_usage: block_proxy.id_usage().await?,
        id_uuid: block_proxy.id_uuid().await?,
        id_label: block_proxy.id_label().await?,
        hint_ignore: block_proxy.hint_ignore().await?,
        mount_points,
    })
}

async fn probe_drive(connection: &Connection, path: &str) -> Result<DriveFacts> {
    let drive_proxy = DriveProxy::builder(connection).path(path)?.build().await?;

    let optical = drive_proxy.optical().await?;
    let optical_audio_tracks = if optical {
        drive_proxy.optical_num_audio_tracks().await.unwrap_or(0)
    } else {
        0
    };

    Ok(DriveFacts {
        vendor: drive_proxy.vendor().await?,
        model: drive_proxy.model().await?,
        ejectable: drive_proxy.ejectable().await?,
        optical,
        media_available: drive_proxy.media_available().await?,
        optical_blank: drive_proxy.optical_blank().await?,
        optical_audio_tracks,
    })
}
