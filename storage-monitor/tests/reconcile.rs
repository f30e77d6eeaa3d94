// SPDX-License-Identifier: GPL-3.0-only

use std::sync::Arc;

use storage_monitor::{
    DefaultEntityFactory, Drive, EntityFactory, FactoryContext, Mount, MonitorEvent, MountId,
    Volume, VolumeId, VolumeMonitor,
};
use storage_testing::fixtures::{
    audio_disc, blank_disc, data_disc, drive, mount_entry, mounted_volume, volume,
};
use storage_testing::{FakeDevices, FakeMountTable};
use storage_types::{DeviceKey, DeviceSnapshot, MountEntry, props};

struct Rig {
    devices: Arc<FakeDevices>,
    mounts: Arc<FakeMountTable>,
    monitor: VolumeMonitor,
}

impl Rig {
    fn new() -> Self {
        Self::with_factory(DefaultEntityFactory::default())
    }

    fn with_factory(factory: impl EntityFactory + 'static) -> Self {
        let devices = Arc::new(FakeDevices::default());
        let mounts = Arc::new(FakeMountTable::default());
        let monitor = VolumeMonitor::new(devices.clone(), mounts.clone()).with_factory(factory);
        Self {
            devices,
            mounts,
            monitor,
        }
    }

    fn update(&mut self) -> Vec<MonitorEvent> {
        self.monitor.force_update();
        self.monitor.drain_events()
    }
}

fn kinds(events: &[MonitorEvent]) -> Vec<&'static str> {
    events.iter().map(MonitorEvent::kind).collect()
}

fn key(s: &str) -> DeviceKey {
    DeviceKey::from(s)
}

#[test]
fn second_update_without_changes_is_silent() {
    let mut rig = Rig::new();
    rig.devices.set(vec![
        drive("storage_sdb", "Stick"),
        mounted_volume("volume_sdb1", "storage_sdb", "/dev/sdb1", "/media/stick"),
        drive("storage_sr0", "DVD-RW"),
        blank_disc("volume_disc_sr0", "storage_sr0", "/dev/sr0"),
    ]);
    rig.mounts.set(vec![mount_entry("/media/stick", "/dev/sdb1")]);

    assert_eq!(rig.update().len(), 6);
    assert!(rig.update().is_empty());
    assert!(rig.update().is_empty());
}

#[test]
fn property_changes_under_the_same_key_are_not_reported() {
    let mut rig = Rig::new();
    rig.devices.set(vec![
        drive("storage_sdb", "Stick"),
        volume("volume_sdb1", "storage_sdb", "/dev/sdb1"),
    ]);
    rig.update();

    rig.devices.insert(
        volume("volume_sdb1", "storage_sdb", "/dev/sdb1").with_str(props::VOLUME_LABEL, "NEW"),
    );

    assert!(rig.update().is_empty());
}

#[test]
fn mount_links_to_volume_by_mount_point() {
    let mut rig = Rig::new();
    rig.devices.set(vec![
        drive("storage_sdb", "Stick"),
        mounted_volume("volume_sdb1", "storage_sdb", "/dev/sdb1", "/media/stick")
            .with_str(props::VOLUME_UUID, "1234-ABCD"),
    ]);
    rig.mounts.set(vec![mount_entry("/media/stick", "/dev/sdb1")]);
    rig.update();

    let mount = rig
        .monitor
        .mount_for_mount_path("/media/stick")
        .expect("mount");
    assert_eq!(
        mount.volume_id(),
        Some(&VolumeId::Device(key("volume_sdb1")))
    );
    assert_eq!(
        rig.monitor.mount_for_uuid("1234-ABCD").map(Mount::id),
        Some(mount.id())
    );
    assert_eq!(rig.monitor.mounts().count(), 1);
}

#[test]
fn volume_mounted_after_it_appeared_gets_its_mount() {
    let mut rig = Rig::new();
    rig.devices.set(vec![
        drive("storage_sdb", "Stick"),
        volume("volume_sdb1", "storage_sdb", "/dev/sdb1"),
    ]);
    assert_eq!(kinds(&rig.update()), ["drive_connected", "volume_added"]);

    rig.devices.insert(mounted_volume(
        "volume_sdb1",
        "storage_sdb",
        "/dev/sdb1",
        "/media/stick",
    ));
    rig.mounts.set(vec![mount_entry("/media/stick", "/dev/sdb1")]);
    assert_eq!(kinds(&rig.update()), ["mount_added"]);

    let mount = rig
        .monitor
        .mount_for_mount_path("/media/stick")
        .expect("mount");
    assert_eq!(
        mount.volume_id(),
        Some(&VolumeId::Device(key("volume_sdb1")))
    );
    assert_eq!(
        rig.monitor
            .lookup_volume_for_mount_path("/media/stick")
            .map(Volume::id),
        Some(VolumeId::Device(key("volume_sdb1")))
    );
}

#[test]
fn reused_mount_path_links_to_the_volume_mounted_there_now() {
    let mut rig = Rig::new();
    rig.devices.set(vec![
        drive("storage_sdb", "Stick"),
        mounted_volume("volume_sdb1", "storage_sdb", "/dev/sdb1", "/media/usb"),
        drive("storage_sdc", "Card"),
        volume("volume_sdc1", "storage_sdc", "/dev/sdc1"),
    ]);
    rig.mounts.set(vec![mount_entry("/media/usb", "/dev/sdb1")]);
    rig.update();

    rig.devices.set(vec![
        drive("storage_sdb", "Stick"),
        volume("volume_sdb1", "storage_sdb", "/dev/sdb1"),
        drive("storage_sdc", "Card"),
        mounted_volume("volume_sdc1", "storage_sdc", "/dev/sdc1", "/media/usb"),
    ]);
    rig.mounts.set(vec![mount_entry("/media/usb", "/dev/sdc1")]);
    assert_eq!(kinds(&rig.update()), ["mount_removed", "mount_added"]);

    let mount = rig.monitor.mount_for_mount_path("/media/usb").expect("mount");
    assert_eq!(
        mount.volume_id(),
        Some(&VolumeId::Device(key("volume_sdc1")))
    );
    assert!(
        rig.monitor
            .mount_of_volume(&VolumeId::Device(key("volume_sdb1")))
            .is_none()
    );
}

#[test]
fn no_relation_outlives_its_target() {
    let mut rig = Rig::new();
    rig.devices.set(vec![
        drive("storage_sdb", "Stick"),
        mounted_volume("volume_sdb1", "storage_sdb", "/dev/sdb1", "/media/stick"),
    ]);
    rig.mounts.set(vec![mount_entry("/media/stick", "/dev/sdb1")]);
    rig.update();

    // device gone but the kernel still lists the mount
    rig.devices.set(Vec::new());
    let events = rig.update();
    assert_eq!(kinds(&events), ["drive_disconnected", "volume_removed"]);

    let MonitorEvent::VolumeRemoved(removed) = &events[1] else {
        panic!("expected volume_removed, got {}", events[1]);
    };
    assert!(removed.is_removed());
    assert!(removed.drive_key().is_none());

    let mount = rig
        .monitor
        .mount_for_mount_path("/media/stick")
        .expect("mount");
    assert!(mount.volume_id().is_none());
    assert!(rig.monitor.registry().dangling_references().is_empty());
}

#[test]
fn drive_disconnect_leaves_volume_driveless() {
    let mut rig = Rig::new();
    rig.devices.set(vec![
        drive("storage_sdb", "Stick"),
        volume("volume_sdb1", "storage_sdb", "/dev/sdb1"),
    ]);
    rig.update();

    rig.devices.remove("storage_sdb");
    let events = rig.update();

    assert_eq!(kinds(&events), ["drive_disconnected"]);
    let volume = rig
        .monitor
        .volume(&VolumeId::Device(key("volume_sdb1")))
        .expect("volume");
    assert!(rig.monitor.drive_of_volume(volume).is_none());
}

#[test]
fn volume_without_known_drive_is_still_built() {
    let mut rig = Rig::new();
    rig.devices
        .set(vec![volume("volume_sdc1", "storage_missing", "/dev/sdc1")]);

    let events = rig.update();

    assert_eq!(kinds(&events), ["volume_added"]);
    let MonitorEvent::VolumeAdded(added) = &events[0] else {
        panic!("expected volume_added");
    };
    assert!(added.drive_key().is_none());
}

#[test]
fn ignore_flag_always_wins() {
    let mut rig = Rig::new();
    let base = mounted_volume("volume_sdb1", "storage_sdb", "/dev/sdb1", "/media/stick")
        .with_str(props::VOLUME_LABEL, "STICK")
        .with_str(props::VOLUME_UUID, "1234-ABCD");

    rig.devices.set(vec![
        drive("storage_sdb", "Stick"),
        base.clone().with_bool(props::VOLUME_IGNORE, true),
        volume("volume_sdb2", "storage_sdb", "/dev/sdb2").with_bool(props::VOLUME_IGNORE, true),
    ]);
    rig.update();

    assert_eq!(rig.monitor.volumes().count(), 0);
    assert!(rig.monitor.volume_for_uuid("1234-ABCD").is_none());
}

#[test]
fn within_a_pass_removals_come_before_additions() {
    let mut rig = Rig::new();
    rig.devices.set(vec![
        drive("storage_a", "A"),
        drive("storage_c", "C"),
    ]);
    rig.update();

    rig.devices.set(vec![
        drive("storage_b", "B"),
        drive("storage_d", "D"),
    ]);
    let events = rig.update();

    assert_eq!(
        kinds(&events),
        [
            "drive_disconnected",
            "drive_disconnected",
            "drive_connected",
            "drive_connected"
        ]
    );
}

#[test]
fn passes_run_in_fixed_order() {
    let mut rig = Rig::new();
    rig.devices.set(vec![
        blank_disc("volume_disc_sr0", "storage_sr0", "/dev/sr0"),
        mounted_volume("volume_sdb1", "storage_sdb", "/dev/sdb1", "/media/stick"),
        drive("storage_sr0", "DVD-RW"),
        drive("storage_sdb", "Stick"),
    ]);
    rig.mounts.set(vec![mount_entry("/media/stick", "/dev/sdb1")]);

    let events = rig.update();

    assert_eq!(
        kinds(&events),
        [
            "drive_connected",
            "drive_connected",
            "volume_added",
            "mount_added",
            "volume_added",
            "mount_added"
        ]
    );
}

#[test]
fn blank_disc_pair_is_added_and_removed_together() {
    let mut rig = Rig::new();
    rig.devices.set(vec![
        drive("storage_sr0", "DVD-RW"),
        blank_disc("volume_disc_sr0", "storage_sr0", "/dev/sr0"),
    ]);

    let events = rig.update();
    assert_eq!(kinds(&events), ["drive_connected", "volume_added", "mount_added"]);

    let (MonitorEvent::VolumeAdded(volume), MonitorEvent::MountAdded(mount)) =
        (&events[1], &events[2])
    else {
        panic!("unexpected events");
    };
    assert_eq!(volume.id(), VolumeId::Disc(key("volume_disc_sr0")));
    assert_eq!(mount.id(), &MountId::Disc(key("volume_disc_sr0")));
    assert_eq!(mount.root, "burn:///");
    assert_eq!(mount.volume_id(), Some(&volume.id()));
    assert!(mount.is_disc());

    rig.devices.remove("volume_disc_sr0");
    let mut removed = kinds(&rig.update());
    removed.sort_unstable();
    assert_eq!(removed, ["mount_removed", "volume_removed"]);
    assert_eq!(rig.monitor.volumes().count(), 0);
    assert_eq!(rig.monitor.mounts().count(), 0);
}

#[test]
fn audio_disc_gets_cdda_root_and_name() {
    let mut rig = Rig::new();
    rig.devices.set(vec![
        drive("storage_sr0", "DVD-RW"),
        audio_disc("volume_part1_sr0", "storage_sr0", "/dev/sr0"),
    ]);
    rig.update();

    let mount = rig
        .monitor
        .mount(&MountId::Disc(key("volume_part1_sr0")))
        .expect("disc mount");
    assert_eq!(mount.root, "cdda://%2Fdev%2Fsr0/");
    assert_eq!(mount.name, "Audio Disc");
    assert_eq!(mount.icon.as_deref(), Some("media-optical-audio"));
    assert!(rig.monitor.mount_for_mount_path("cdda://%2Fdev%2Fsr0/").is_none());
}

#[test]
fn disc_without_drive_waits_for_it() {
    let mut rig = Rig::new();
    rig.devices
        .set(vec![blank_disc("volume_disc_sr0", "storage_sr0", "/dev/sr0")]);
    assert!(rig.update().is_empty());

    // unbuilt snapshots are retried once their drive shows up
    rig.devices.insert(drive("storage_sr0", "DVD-RW"));
    assert_eq!(
        kinds(&rig.update()),
        ["drive_connected", "volume_added", "mount_added"]
    );
    assert!(rig.update().is_empty());
}

#[test]
fn data_discs_are_plain_volumes() {
    let mut rig = Rig::new();
    rig.devices.set(vec![
        drive("storage_sr0", "DVD-RW"),
        data_disc("volume_label_DATA", "storage_sr0", "/dev/sr0"),
    ]);

    assert_eq!(kinds(&rig.update()), ["drive_connected", "volume_added"]);
    assert!(
        rig.monitor
            .volume(&VolumeId::Device(key("volume_label_DATA")))
            .is_some()
    );
}

/// Default factory that refuses to build disc mounts.
struct NoDiscMounts(DefaultEntityFactory);

impl EntityFactory for NoDiscMounts {
    fn make_drive(&self, snapshot: &DeviceSnapshot, ctx: &FactoryContext<'_>) -> Option<Drive> {
        self.0.make_drive(snapshot, ctx)
    }

    fn make_volume(
        &self,
        snapshot: &DeviceSnapshot,
        ctx: &FactoryContext<'_>,
        drive: Option<&Drive>,
    ) -> Option<Volume> {
        self.0.make_volume(snapshot, ctx, drive)
    }

    fn make_mount(
        &self,
        entry: &MountEntry,
        ctx: &FactoryContext<'_>,
        volume: Option<&Volume>,
    ) -> Option<Mount> {
        self.0.make_mount(entry, ctx, volume)
    }

    fn make_disc_mount(
        &self,
        _snapshot: &DeviceSnapshot,
        _root: &str,
        _name: Option<&str>,
        _icon: Option<&str>,
        _ctx: &FactoryContext<'_>,
        _volume: &Volume,
    ) -> Option<Mount> {
        None
    }
}

#[test]
fn failed_disc_mount_rolls_back_the_volume() {
    let mut rig = Rig::with_factory(NoDiscMounts(DefaultEntityFactory::default()));
    rig.devices.set(vec![
        drive("storage_sr0", "DVD-RW"),
        blank_disc("volume_disc_sr0", "storage_sr0", "/dev/sr0"),
    ]);

    assert_eq!(kinds(&rig.update()), ["drive_connected"]);
    assert!(
        rig.monitor
            .volume(&VolumeId::Disc(key("volume_disc_sr0")))
            .is_none()
    );

    // removal of a disc that never materialized is silent
    rig.devices.remove("volume_disc_sr0");
    assert!(rig.update().is_empty());
}

#[test]
fn mount_without_volume_outside_system_paths() {
    let mut rig = Rig::new();
    rig.mounts.set(vec![
        MountEntry::new("/mnt/nas", "//nas/share", "cifs"),
        MountEntry::new("/", "/dev/nvme0n1p2", "ext4"),
        MountEntry::new("/sys/kernel/tracing", "tracefs", "tracefs"),
    ]);

    let events = rig.update();

    assert_eq!(kinds(&events), ["mount_added"]);
    let mount = rig.monitor.mount_for_mount_path("/mnt/nas").expect("mount");
    assert!(rig.monitor.volume_of_mount(mount).is_none());
    assert_eq!(mount.name, "nas");
}

#[test]
fn events_can_be_forwarded_to_a_channel() {
    let mut rig = Rig::new();
    rig.devices.set(vec![drive("storage_sdb", "Stick")]);
    rig.monitor.force_update();

    let (mut tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    rig.monitor.dispatch(&mut tx);

    let event = rx.try_recv().expect("event");
    assert_eq!(event.kind(), "drive_connected");
    assert!(rx.try_recv().is_err());
}
