// SPDX-License-Identifier: GPL-3.0-only

//! Low-level system knowledge for the storage monitor
//!
//! This crate reads things straight from the kernel rather than through
//! D-Bus:
//! - The mount table (`/proc/self/mountinfo`)
//! - Which mount paths and filesystem types are system-internal
//!
//! Nothing here needs elevated privileges.

pub mod error;
pub mod internal;
pub mod mounts;

pub use error::{Result, SysError};
pub use internal::{SystemPaths, is_pseudo_fs_type, is_system_internal_mount_path};
pub use mounts::{ProcMountTable, parse_mount_table, read_mount_table};
