// SPDX-License-Identifier: GPL-3.0-only

//! Live entities held by the registry
//!
//! Entities never point at each other directly. A relation is stored as the
//! key of the other side and resolved through the registry on demand, so
//! tearing one down never leaves a dangling pointer behind.

pub mod drive;
pub mod mount;
pub mod volume;

pub use drive::Drive;
pub use mount::{Mount, MountId};
pub use volume::{Volume, VolumeId};

/// Last path component of a device file or mount path, "/" for the root.
pub(crate) fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
