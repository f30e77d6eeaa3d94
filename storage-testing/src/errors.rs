// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestingError {
    #[error("scenario not found for '{name}' in resources/scenarios")]
    ScenarioNotFound { name: String },
    #[error("invalid scenario '{name}': {reason}")]
    ScenarioInvalid { name: String, reason: String },
    #[error("io error for {path:?}: {reason}")]
    Io { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, TestingError>;
