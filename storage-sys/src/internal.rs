// SPDX-License-Identifier: GPL-3.0-only

//! Which mounts belong to the system rather than to the user.

use std::path::{Path, PathBuf};

/// Mount paths that are part of the running system itself.
const SYSTEM_MOUNT_PATHS: &[&str] = &[
    "/",
    "/bin",
    "/boot",
    "/boot/efi",
    "/compat/linux/proc",
    "/compat/linux/sys",
    "/dev",
    "/etc",
    "/home",
    "/lib",
    "/lib64",
    "/media",
    "/mnt",
    "/opt",
    "/proc",
    "/root",
    "/run",
    "/sbin",
    "/srv",
    "/sys",
    "/tmp",
    "/usr",
    "/usr/local",
    "/var",
    "/var/crash",
    "/var/local",
    "/var/log",
    "/var/log/audit",
    "/var/mail",
    "/var/run",
    "/var/tmp",
];

/// Everything below these is kernel or runtime plumbing.
const PSEUDO_MOUNT_PREFIXES: &[&str] = &["/proc", "/sys", "/dev", "/run/user", "/snap"];

const PSEUDO_FS_TYPES: &[&str] = &[
    "autofs",
    "binfmt_misc",
    "bpf",
    "cgroup",
    "cgroup2",
    "configfs",
    "debugfs",
    "devpts",
    "devtmpfs",
    "efivarfs",
    "fusectl",
    "hugetlbfs",
    "mqueue",
    "nsfs",
    "proc",
    "pstore",
    "ramfs",
    "rpc_pipefs",
    "securityfs",
    "selinuxfs",
    "sysfs",
    "tracefs",
];

pub fn is_system_internal_mount_path(mount_path: &str) -> bool {
    SystemPaths::default().is_internal(mount_path)
}

pub fn is_pseudo_fs_type(fs_type: &str) -> bool {
    PSEUDO_FS_TYPES.contains(&fs_type)
}

/// System-internal mount predicate, extendable with site-specific prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemPaths {
    extra_prefixes: Vec<PathBuf>,
}

impl SystemPaths {
    pub fn with_extra_prefixes<I, P>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            extra_prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_internal(&self, mount_path: &str) -> bool {
        let trimmed = if mount_path.len() > 1 {
            mount_path.trim_end_matches('/')
        } else {
            mount_path
        };

        if SYSTEM_MOUNT_PATHS.contains(&trimmed) {
            return true;
        }

        let path = Path::new(trimmed);
        PSEUDO_MOUNT_PREFIXES
            .iter()
            .map(Path::new)
            .chain(self.extra_prefixes.iter().map(PathBuf::as_path))
            .any(|prefix| path.starts_with(prefix))
    }
}
