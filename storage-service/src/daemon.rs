// SPDX-License-Identifier: GPL-3.0-only

use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use storage_contracts::{InventoryCell, InventoryProvider};
use storage_monitor::{
    DefaultEntityFactory, FileMonitor, UpdateTrigger, VolumeFilter, VolumeMonitor,
};
use storage_sys::{ProcMountTable, SystemPaths};
use storage_udisks::{UDisksInventory, device_event_stream};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::watch;

/// Capture a fresh inventory. On failure the previous one stays in place.
async fn refresh(inventory: &impl InventoryProvider, cell: &InventoryCell) {
    match inventory.capture().await {
        Ok(captured) => cell.replace(captured),
        Err(e) => warn!("Keeping the previous inventory: {e}"),
    }
}

/// Recapture, then run every pass against what was captured.
async fn reconcile(
    inventory: &impl InventoryProvider,
    cell: &InventoryCell,
    monitor: &mut VolumeMonitor,
    trigger: UpdateTrigger,
) {
    refresh(inventory, cell).await;
    monitor.handle(trigger);
}

fn report(monitor: &mut VolumeMonitor) {
    for event in monitor.drain_events() {
        info!("{event}");
    }
}

pub async fn run(config: MonitorConfig) -> Result<()> {
    let inventory = UDisksInventory::new()
        .await
        .context("connecting to the system bus")?;
    let cell = Arc::new(InventoryCell::new());

    let system_paths = SystemPaths::with_extra_prefixes(config.system_internal_paths.clone());
    let mut monitor = VolumeMonitor::new(cell.clone(), ProcMountTable::new())
        .with_filter(VolumeFilter::new(system_paths.clone()))
        .with_factory(DefaultEntityFactory::new(system_paths));

    refresh(&inventory, &cell).await;
    monitor.force_update();
    info!(
        "Initial inventory: {} drives, {} volumes, {} mounts",
        monitor.drives().count(),
        monitor.volumes().count(),
        monitor.mounts().count()
    );
    report(&mut monitor);

    let mut device_events = device_event_stream(inventory.connection())
        .await
        .context("subscribing to UDisks2 object events")?;
    let mut device_events_open = true;

    let mut poll = tokio::time::interval(config.poll_interval());
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    poll.tick().await;

    let (file_monitor, mut shaped) = FileMonitor::spawn(config.shaper());
    let (_watchers, mut raw_events) = watch::watch_paths(&config.watch_paths);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Monitor ready");
    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl-C: {e}");
                }
                info!("Received shutdown signal");
                break;
            }
            maybe_event = device_events.next(), if device_events_open => {
                let Some(event) = maybe_event else {
                    warn!("UDisks2 event stream ended, relying on polling");
                    device_events_open = false;
                    continue;
                };
                debug!("Device event: {event:?}");
                reconcile(&inventory, &cell, &mut monitor, UpdateTrigger::DevicesChanged).await;
                report(&mut monitor);
            }
            _ = poll.tick() => {
                // mount state and media changes arrive only as property
                // changes, which the device event stream does not carry
                reconcile(&inventory, &cell, &mut monitor, UpdateTrigger::MountsChanged).await;
                report(&mut monitor);
            }
            Some(result) = raw_events.recv() => match result {
                Ok(event) => {
                    for raw in watch::file_events(event) {
                        if let Err(e) = file_monitor.feed(raw) {
                            warn!("File monitor rejected event: {e}");
                        }
                    }
                }
                Err(e) => warn!("Watcher error: {e}"),
            },
            Some(event) = shaped.recv() => {
                info!("File {event}");
            }
        }
    }

    file_monitor.cancel();
    info!("Storage monitor shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use storage_contracts::{Inventory, StorageError};
    use storage_monitor::MonitorEvent;
    use storage_testing::FakeMountTable;
    use storage_testing::fixtures::{blank_disc, drive};
    use storage_types::DeviceSnapshot;

    use super::*;

    /// Serves whatever was last staged; `None` fails the capture.
    #[derive(Default)]
    struct StagedInventory(Mutex<Option<Vec<DeviceSnapshot>>>);

    impl StagedInventory {
        fn stage(&self, devices: Option<Vec<DeviceSnapshot>>) {
            *self.0.lock().unwrap() = devices;
        }
    }

    #[async_trait]
    impl InventoryProvider for StagedInventory {
        async fn capture(&self) -> Result<Inventory, StorageError> {
            match self.0.lock().unwrap().clone() {
                Some(devices) => Ok(Inventory::new(devices)),
                None => Err(StorageError::unavailable("bus gone")),
            }
        }
    }

    fn kinds(monitor: &mut VolumeMonitor) -> Vec<&'static str> {
        monitor.drain_events().iter().map(MonitorEvent::kind).collect()
    }

    #[tokio::test]
    async fn poll_picks_up_media_inserted_into_a_known_drive() {
        let inventory = StagedInventory::default();
        let cell = Arc::new(InventoryCell::new());
        let mut monitor =
            VolumeMonitor::new(cell.clone(), Arc::new(FakeMountTable::default()));

        inventory.stage(Some(vec![drive("storage_sr0", "DVD-RW")]));
        reconcile(&inventory, &cell, &mut monitor, UpdateTrigger::DevicesChanged).await;
        assert_eq!(kinds(&mut monitor), ["drive_connected"]);

        inventory.stage(Some(vec![
            drive("storage_sr0", "DVD-RW"),
            blank_disc("volume_disc_sr0", "storage_sr0", "/dev/sr0"),
        ]));
        reconcile(&inventory, &cell, &mut monitor, UpdateTrigger::MountsChanged).await;
        assert_eq!(kinds(&mut monitor), ["volume_added", "mount_added"]);

        // a failed capture is not mistaken for everything going away
        inventory.stage(None);
        reconcile(&inventory, &cell, &mut monitor, UpdateTrigger::MountsChanged).await;
        assert!(kinds(&mut monitor).is_empty());
        assert_eq!(monitor.volumes().count(), 1);
    }
}
