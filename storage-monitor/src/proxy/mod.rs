// SPDX-License-Identifier: GPL-3.0-only

//! Volumes owned by another process
//!
//! A [`RemoteVolume`] mirrors the state another process reports for one of
//! its volumes. When that volume activates somewhere below a mount the host
//! already knows about, a [`ShadowMount`] stands in for it so consumers see
//! the volume as mounted.

mod shadow;
mod volume;

pub use shadow::{ShadowMount, UnionMount};
pub use volume::RemoteVolume;

/// Emission of a remote volume, queued until the host drains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyEvent {
    MountAdded(ShadowMount),
    MountRemoved(ShadowMount),
    MountChanged(ShadowMount),
    /// Sent on the shadow mount itself before it is removed
    Unmounted(ShadowMount),
    /// Sent on the shadow mount itself when its real mount changed
    Changed(ShadowMount),
}

impl ProxyEvent {
    pub fn shadow(&self) -> &ShadowMount {
        match self {
            Self::MountAdded(s)
            | Self::MountRemoved(s)
            | Self::MountChanged(s)
            | Self::Unmounted(s)
            | Self::Changed(s) => s,
        }
    }
}

/// `true` when `location` lies strictly below `root`.
///
/// Both are URIs or absolute paths; only whole path components match, and a
/// location is never below itself.
pub fn location_has_prefix(location: &str, root: &str) -> bool {
    let root = root.trim_end_matches('/');
    let location = location.trim_end_matches('/');

    location.len() > root.len()
        && location.starts_with(root)
        && location.as_bytes()[root.len()] == b'/'
}

fn same_location(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_strict_and_component_wise() {
        assert!(location_has_prefix("smb://nas/share/photos", "smb://nas/share/"));
        assert!(location_has_prefix("/media/cam/DCIM", "/media/cam"));
        assert!(location_has_prefix("/media/cam", "/"));

        assert!(!location_has_prefix("smb://nas/share/", "smb://nas/share"));
        assert!(!location_has_prefix("smb://nasty/share", "smb://nas"));
        assert!(!location_has_prefix("/media", "/media/cam"));
    }
}
