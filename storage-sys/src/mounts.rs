// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use storage_contracts::MountTableSource;
use storage_types::MountEntry;

use crate::error::{Result, SysError};

const PROC_MOUNTINFO: &str = "/proc/self/mountinfo";

pub fn read_mount_table(path: &Path) -> Result<Vec<MountEntry>> {
    let mount_info = fs::read_to_string(path)?;
    parse_mount_table(&mount_info)
}

pub fn parse_mount_table(input: &str) -> Result<Vec<MountEntry>> {
    let mut entries = Vec::new();

    for line in input.lines().filter(|line| !line.trim().is_empty()) {
        let (left, right) = line
            .split_once(" - ")
            .ok_or_else(|| SysError::InvalidMountInfoLine(line.to_string()))?;

        let mut left_fields = left.split_whitespace();
        let mount_point = left_fields
            .nth(4)
            .ok_or_else(|| SysError::InvalidMountInfoLine(line.to_string()))?;
        let options = left_fields
            .next()
            .ok_or_else(|| SysError::InvalidMountInfoLine(line.to_string()))?;

        let mut right_fields = right.split_whitespace();
        let fs_type = right_fields
            .next()
            .ok_or_else(|| SysError::InvalidMountInfoLine(line.to_string()))?;
        let source = right_fields.next().unwrap_or("none");

        entries.push(MountEntry {
            mount_path: unescape_mount_field(mount_point),
            device_path: unescape_mount_field(source),
            filesystem_type: fs_type.to_string(),
            options: options.to_string(),
            read_only: options.split(',').any(|opt| opt == "ro"),
        });
    }

    Ok(entries)
}

fn unescape_mount_field(value: &str) -> String {
    let mut output = Vec::with_capacity(value.len());
    let bytes = value.as_bytes();
    let mut index = 0;

    while index < bytes.len() {
        if bytes[index] == b'\\'
            && index + 3 < bytes.len()
            && bytes[index + 1].is_ascii_digit()
            && bytes[index + 2].is_ascii_digit()
            && bytes[index + 3].is_ascii_digit()
        {
            let octal = &value[index + 1..index + 4];
            if let Ok(num) = u8::from_str_radix(octal, 8) {
                output.push(num);
                index += 4;
                continue;
            }
        }

        output.push(bytes[index]);
        index += 1;
    }

    String::from_utf8_lossy(&output).into_owned()
}

/// Mount table backed by a mountinfo file.
///
/// A failed read keeps serving the last table that parsed, so a transient
/// error never looks like every mount disappearing at once.
#[derive(Debug)]
pub struct ProcMountTable {
    path: PathBuf,
    last_good: Mutex<Vec<MountEntry>>,
}

impl ProcMountTable {
    pub fn new() -> Self {
        Self::with_path(PROC_MOUNTINFO)
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_good: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ProcMountTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MountTableSource for ProcMountTable {
    fn mount_entries(&self) -> Vec<MountEntry> {
        let mut last_good = match self.last_good.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        match read_mount_table(&self.path) {
            Ok(entries) => {
                *last_good = entries.clone();
                entries
            }
            Err(e) => {
                tracing::warn!(
                    "Could not read mount table {}: {}; keeping last known table",
                    self.path.display(),
                    e
                );
                last_good.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
36 25 8:2 / / rw,relatime - ext4 /dev/nvme0n1p2 rw
37 25 0:5 / /proc rw,nosuid,nodev,noexec,relatime - proc proc rw
61 36 8:17 / /run/media/alex/MY\\040STICK rw,nosuid,nodev shared:300 - vfat /dev/sdb1 rw,fmask=0022
62 36 11:0 / /run/media/alex/AUDIO ro,nosuid,nodev - iso9660 /dev/sr0 ro
";

    #[test]
    fn parses_mountinfo_fields_and_escapes() {
        let entries = parse_mount_table(SAMPLE).expect("parse should succeed");

        assert_eq!(entries.len(), 4);
        assert_eq!(entries[2].mount_path, "/run/media/alex/MY STICK");
        assert_eq!(entries[2].device_path, "/dev/sdb1");
        assert_eq!(entries[2].filesystem_type, "vfat");
        assert!(!entries[2].read_only);
        assert!(entries[3].read_only);
        assert_eq!(entries[1].options, "rw,nosuid,nodev,noexec,relatime");
    }

    #[test]
    fn rejects_lines_without_separator() {
        let err = parse_mount_table("36 25 8:2 / / rw ext4 /dev/sda1\n").unwrap_err();
        assert!(matches!(err, SysError::InvalidMountInfoLine(_)));
    }

    #[test]
    fn keeps_last_good_table_when_read_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mountinfo");
        fs::write(&path, SAMPLE).expect("write sample");

        let table = ProcMountTable::with_path(&path);
        assert_eq!(table.mount_entries().len(), 4);

        fs::remove_file(&path).expect("remove sample");
        assert_eq!(table.mount_entries().len(), 4);
    }
}
