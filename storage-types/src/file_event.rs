// SPDX-License-Identifier: GPL-3.0-only

//! File change notifications, raw and shaped.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Kind of file change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileEventKind {
    /// Contents changed
    Changed,

    /// A burst of changes has finished
    ChangesDoneHint,

    Deleted,

    Created,

    AttributeChanged,

    /// The file is about to be deleted
    PreDelete,

    /// The enclosing mount went away
    Unmounted,

    /// Renamed; `other_file` carries the new name
    Moved,
}

impl FileEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Changed => "changed",
            Self::ChangesDoneHint => "changes_done_hint",
            Self::Deleted => "deleted",
            Self::Created => "created",
            Self::AttributeChanged => "attribute_changed",
            Self::PreDelete => "pre_delete",
            Self::Unmounted => "unmounted",
            Self::Moved => "moved",
        }
    }
}

impl fmt::Display for FileEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single file notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEvent {
    pub kind: FileEventKind,
    pub file: PathBuf,
    pub other_file: Option<PathBuf>,
}

impl FileEvent {
    pub fn new(kind: FileEventKind, file: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            file: file.into(),
            other_file: None,
        }
    }

    pub fn changed(file: impl Into<PathBuf>) -> Self {
        Self::new(FileEventKind::Changed, file)
    }

    pub fn changes_done(file: impl Into<PathBuf>) -> Self {
        Self::new(FileEventKind::ChangesDoneHint, file)
    }

    pub fn moved(file: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            kind: FileEventKind::Moved,
            file: file.into(),
            other_file: Some(to.into()),
        }
    }
}

impl fmt::Display for FileEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.other_file {
            Some(other) => write!(
                f,
                "{} {} -> {}",
                self.kind,
                self.file.display(),
                other.display()
            ),
            None => write!(f, "{} {}", self.kind, self.file.display()),
        }
    }
}
