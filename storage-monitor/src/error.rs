// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MonitorError {
    #[error("id mismatch during update of volume (have {current}, got {received})")]
    IdentityMismatch { current: String, received: String },

    #[error("file monitor is cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, MonitorError>;
