// SPDX-License-Identifier: GPL-3.0-only

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use storage_types::RemoteVolumeInfo;
use tracing::{debug, warn};

use super::shadow::{ShadowMount, UnionMount, mount_to_shadow};
use super::{ProxyEvent, same_location};
use crate::error::{MonitorError, Result};

#[derive(Debug, Default)]
struct Fields {
    id: Option<String>,
    name: Option<String>,
    icon: Option<String>,
    uuid: Option<String>,
    activation_uri: Option<String>,
    can_mount: bool,
    can_eject: bool,
    should_automount: bool,
    drive_id: Option<String>,
    mount_id: Option<String>,
    identifiers: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct State {
    fields: Fields,
    shadow: Option<ShadowMount>,
    refresh_pending: bool,
    events: VecDeque<ProxyEvent>,
}

/// A volume reported by another process.
///
/// Shareable across threads; every accessor takes the internal lock for the
/// duration of a copy and never calls out while holding it.
#[derive(Debug, Default)]
pub struct RemoteVolume {
    state: Mutex<State>,
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

impl RemoteVolume {
    /// A volume with no identity yet; the first update sets it.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_info(info: RemoteVolumeInfo) -> Self {
        let volume = Self::new();
        // a fresh volume has no identity to mismatch
        let _ = volume.update(info);
        volume
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the reported state wholesale.
    ///
    /// A payload for a different volume is rejected and nothing changes.
    /// Otherwise a shadow mount refresh is requested; the host runs it with
    /// [`refresh_shadow_mount`](Self::refresh_shadow_mount) once this call
    /// has returned.
    pub fn update(&self, info: RemoteVolumeInfo) -> Result<()> {
        let mut state = self.lock();

        if let Some(current) = &state.fields.id
            && *current != info.id
        {
            warn!("id mismatch during update of volume {current}: got {}", info.id);
            return Err(MonitorError::IdentityMismatch {
                current: current.clone(),
                received: info.id,
            });
        }

        state.fields = Fields {
            id: Some(info.id),
            name: non_empty(info.name),
            icon: non_empty(info.icon),
            uuid: non_empty(info.uuid),
            activation_uri: non_empty(info.activation_uri),
            can_mount: info.can_mount,
            can_eject: info.can_eject,
            should_automount: info.should_automount,
            drive_id: non_empty(info.drive_id),
            mount_id: non_empty(info.mount_id),
            identifiers: info.identifiers,
        };
        state.refresh_pending = true;

        Ok(())
    }

    pub fn refresh_pending(&self) -> bool {
        self.lock().refresh_pending
    }

    /// Re-evaluate which union mount, if any, this volume shadows.
    pub fn refresh_shadow_mount(&self, union_mounts: &[UnionMount]) {
        let mut state = self.lock();
        state.refresh_pending = false;

        let Some(activation_root) = state.fields.activation_uri.clone() else {
            // nothing to activate means nothing to shadow, but an existing
            // shadow is left alone until the union list changes under it
            return;
        };
        let volume_id = state.fields.id.clone().unwrap_or_default();

        let target = mount_to_shadow(&activation_root, union_mounts);

        match (target, state.shadow.take()) {
            (Some(real), None) => {
                let shadow = ShadowMount {
                    volume_id,
                    real_mount_id: real.id.clone(),
                    activation_root,
                };
                debug!("Shadowing {} for volume {}", shadow.real_mount_id, shadow.volume_id);
                state.events.push_back(ProxyEvent::MountAdded(shadow.clone()));
                state.shadow = Some(shadow);
            }
            (Some(real), Some(current)) => {
                if same_location(&current.activation_root, &activation_root) {
                    state.shadow = Some(current);
                    return;
                }
                state.events.push_back(ProxyEvent::Unmounted(current.clone()));
                state.events.push_back(ProxyEvent::MountRemoved(current));

                let shadow = ShadowMount {
                    volume_id,
                    real_mount_id: real.id.clone(),
                    activation_root,
                };
                state.events.push_back(ProxyEvent::MountAdded(shadow.clone()));
                state.shadow = Some(shadow);
            }
            (None, Some(current)) => {
                state.events.push_back(ProxyEvent::Unmounted(current.clone()));
                state.events.push_back(ProxyEvent::MountRemoved(current));
            }
            (None, None) => {}
        }
    }

    /// A union mount changed; re-announce the shadow if it stands on it.
    pub fn union_mount_changed(&self, mount_id: &str) {
        let mut state = self.lock();
        if let Some(shadow) = state.shadow.clone()
            && shadow.real_mount_id == mount_id
        {
            state.events.push_back(ProxyEvent::Changed(shadow.clone()));
            state.events.push_back(ProxyEvent::MountChanged(shadow));
        }
    }

    /// Tear down the shadow mount, if any, as the volume goes away.
    pub fn dispose(&self) {
        let mut state = self.lock();
        if let Some(shadow) = state.shadow.take() {
            state.events.push_back(ProxyEvent::Unmounted(shadow.clone()));
            state.events.push_back(ProxyEvent::MountRemoved(shadow));
        }
        state.refresh_pending = false;
    }

    pub fn drain_events(&self) -> Vec<ProxyEvent> {
        self.lock().events.drain(..).collect()
    }

    pub fn id(&self) -> Option<String> {
        self.lock().fields.id.clone()
    }

    pub fn name(&self) -> Option<String> {
        self.lock().fields.name.clone()
    }

    pub fn icon(&self) -> Option<String> {
        self.lock().fields.icon.clone()
    }

    pub fn uuid(&self) -> Option<String> {
        self.lock().fields.uuid.clone()
    }

    pub fn activation_uri(&self) -> Option<String> {
        self.lock().fields.activation_uri.clone()
    }

    pub fn can_mount(&self) -> bool {
        self.lock().fields.can_mount
    }

    /// Only a volume on a known drive can be ejected.
    pub fn can_eject(&self) -> bool {
        let state = self.lock();
        state.fields.drive_id.is_some() && state.fields.can_eject
    }

    pub fn should_automount(&self) -> bool {
        self.lock().fields.should_automount
    }

    pub fn drive_id(&self) -> Option<String> {
        self.lock().fields.drive_id.clone()
    }

    /// Id of the remote mount, unless a shadow mount takes its place.
    pub fn mount_id(&self) -> Option<String> {
        let state = self.lock();
        if state.shadow.is_some() {
            return None;
        }
        state.fields.mount_id.clone()
    }

    pub fn shadow_mount(&self) -> Option<ShadowMount> {
        self.lock().shadow.clone()
    }

    pub fn identifier(&self, kind: &str) -> Option<String> {
        self.lock().fields.identifiers.get(kind).cloned()
    }

    pub fn enumerate_identifiers(&self) -> Vec<String> {
        self.lock().fields.identifiers.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(activation_uri: &str) -> RemoteVolumeInfo {
        let mut identifiers = BTreeMap::new();
        identifiers.insert("uuid".to_string(), "CAM-1".to_string());
        identifiers.insert("label".to_string(), "EOS".to_string());

        RemoteVolumeInfo {
            id: "0x1".to_string(),
            name: "EOS".to_string(),
            activation_uri: activation_uri.to_string(),
            can_mount: true,
            identifiers,
            ..Default::default()
        }
    }

    fn kinds(events: &[ProxyEvent]) -> Vec<&'static str> {
        events
            .iter()
            .map(|e| match e {
                ProxyEvent::MountAdded(_) => "mount_added",
                ProxyEvent::MountRemoved(_) => "mount_removed",
                ProxyEvent::MountChanged(_) => "mount_changed",
                ProxyEvent::Unmounted(_) => "unmounted",
                ProxyEvent::Changed(_) => "changed",
            })
            .collect()
    }

    #[test]
    fn empty_strings_become_absent() {
        let volume = RemoteVolume::from_info(RemoteVolumeInfo {
            id: "0x2".to_string(),
            ..Default::default()
        });

        assert_eq!(volume.id().as_deref(), Some("0x2"));
        assert_eq!(volume.name(), None);
        assert_eq!(volume.uuid(), None);
        assert_eq!(volume.activation_uri(), None);
        assert_eq!(volume.icon(), None);
        assert_eq!(volume.drive_id(), None);
    }

    #[test]
    fn mismatched_update_is_rejected_whole() {
        let volume = RemoteVolume::from_info(camera("gphoto2://cam/"));
        volume.refresh_shadow_mount(&[]);

        let mut other = camera("gphoto2://other/");
        other.id = "0x9".to_string();
        other.name = "Other".to_string();

        let err = volume.update(other).expect_err("mismatch");
        assert_eq!(
            err,
            MonitorError::IdentityMismatch {
                current: "0x1".to_string(),
                received: "0x9".to_string()
            }
        );
        assert_eq!(volume.name().as_deref(), Some("EOS"));
        assert!(!volume.refresh_pending());
    }

    #[test]
    fn identifiers_are_enumerable() {
        let volume = RemoteVolume::from_info(camera(""));
        assert_eq!(volume.identifier("uuid").as_deref(), Some("CAM-1"));
        assert_eq!(volume.enumerate_identifiers(), ["label", "uuid"]);
        assert_eq!(volume.identifier("class"), None);
    }

    #[test]
    fn can_eject_needs_a_drive() {
        let mut info = camera("");
        info.can_eject = true;
        let volume = RemoteVolume::from_info(info.clone());
        assert!(!volume.can_eject());

        info.drive_id = "drive-7".to_string();
        volume.update(info).expect("same id");
        assert!(volume.can_eject());
    }

    #[test]
    fn shadow_mount_lifecycle() {
        let volume = RemoteVolume::from_info(camera("smb://nas/share/eos"));
        assert!(volume.refresh_pending());

        let mounts = vec![UnionMount::new("nas", "smb://nas/share")];
        volume.refresh_shadow_mount(&mounts);
        assert!(!volume.refresh_pending());
        assert_eq!(kinds(&volume.drain_events()), ["mount_added"]);
        assert_eq!(
            volume.shadow_mount().map(|s| s.real_mount_id),
            Some("nas".to_string())
        );
        assert_eq!(volume.mount_id(), None);

        // same activation root: nothing to say
        volume.refresh_shadow_mount(&mounts);
        assert!(volume.drain_events().is_empty());

        volume.union_mount_changed("nas");
        assert_eq!(kinds(&volume.drain_events()), ["changed", "mount_changed"]);
        volume.union_mount_changed("elsewhere");
        assert!(volume.drain_events().is_empty());

        // activation root moved: replace the shadow
        volume
            .update(camera("smb://nas/share/eos2"))
            .expect("same id");
        volume.refresh_shadow_mount(&mounts);
        assert_eq!(
            kinds(&volume.drain_events()),
            ["unmounted", "mount_removed", "mount_added"]
        );

        // real mount gone
        volume.refresh_shadow_mount(&[]);
        assert_eq!(kinds(&volume.drain_events()), ["unmounted", "mount_removed"]);
        assert!(volume.shadow_mount().is_none());
    }

    #[test]
    fn dispose_removes_the_shadow() {
        let volume = RemoteVolume::from_info(camera("/media/cam/DCIM"));
        volume.refresh_shadow_mount(&[UnionMount::new("cam", "/media/cam")]);
        volume.drain_events();

        volume.dispose();

        assert_eq!(kinds(&volume.drain_events()), ["unmounted", "mount_removed"]);
    }
}
