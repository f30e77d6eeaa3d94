// SPDX-License-Identifier: GPL-3.0-only

use super::location_has_prefix;

/// A mount as listed by the union of every monitor in the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionMount {
    pub id: String,
    pub root: String,
    /// Shadow mounts are listed too but are never shadowed themselves
    pub is_shadow: bool,
}

impl UnionMount {
    pub fn new(id: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            root: root.into(),
            is_shadow: false,
        }
    }
}

/// Synthetic mount standing in for a remote volume activated below a real
/// mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowMount {
    pub volume_id: String,
    pub real_mount_id: String,
    pub activation_root: String,
}

/// First non-shadow mount whose root lies above `activation_root`.
pub(super) fn mount_to_shadow<'a>(
    activation_root: &str,
    mounts: &'a [UnionMount],
) -> Option<&'a UnionMount> {
    mounts
        .iter()
        .filter(|m| !m.is_shadow)
        .find(|m| location_has_prefix(activation_root, &m.root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_shadow_mounts_and_takes_the_first_match() {
        let shadow = UnionMount {
            is_shadow: true,
            ..UnionMount::new("shadow-1", "smb://nas/")
        };
        let mounts = [
            UnionMount::new("m0", "/media/cam"),
            shadow,
            UnionMount::new("m1", "smb://nas/"),
            UnionMount::new("m2", "smb://nas/share"),
        ];

        let found = mount_to_shadow("smb://nas/share/dir", &mounts).expect("mount");
        assert_eq!(found.id, "m1");

        assert!(mount_to_shadow("ftp://host/", &mounts).is_none());
    }
}
