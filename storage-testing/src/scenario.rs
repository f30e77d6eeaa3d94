// SPDX-License-Identifier: GPL-3.0-only

//! Scripted inventory states.
//!
//! A scenario is a list of steps. Each step replaces the whole device
//! database and mount table, runs one full update and names the lifecycle
//! event kinds it expects, in order.
//!
//! ```toml
//! name = "stick-plug-unplug"
//!
//! [[steps]]
//! expect = ["drive_connected"]
//!
//! [[steps.devices]]
//! key = "storage_sdb"
//! capabilities = ["storage"]
//! properties = { "info.product" = "Stick" }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use storage_types::{DeviceSnapshot, MountEntry};

use crate::errors::{Result, TestingError};

/// Every event kind a step may expect.
pub const EVENT_KINDS: &[&str] = &[
    "drive_connected",
    "drive_disconnected",
    "volume_added",
    "volume_removed",
    "mount_added",
    "mount_removed",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub devices: Vec<DeviceSnapshot>,
    #[serde(default)]
    pub mounts: Vec<MountEntry>,
    /// Event kinds in emission order
    #[serde(default)]
    pub expect: Vec<String>,
    /// When set, only the multiset of kinds is compared
    #[serde(default)]
    pub unordered: bool,
}

pub fn workspace_root() -> PathBuf {
    if let Ok(value) = std::env::var("STORAGE_TESTING_WORKSPACE_ROOT") {
        return PathBuf::from(value);
    }

    if let Ok(current_dir) = std::env::current_dir()
        && current_dir.join("resources/scenarios").exists()
    {
        return current_dir;
    }

    let manifest_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    if manifest_root.join("resources/scenarios").exists() {
        return manifest_root;
    }

    PathBuf::from(".")
}

pub fn scenarios_root() -> PathBuf {
    workspace_root().join("resources/scenarios")
}

pub fn scenario_path_for_name(name: &str) -> PathBuf {
    scenarios_root().join(format!("{name}.toml"))
}

pub fn load_by_name(name: &str) -> Result<Scenario> {
    let path = scenario_path_for_name(name);
    if !path.exists() {
        return Err(TestingError::ScenarioNotFound {
            name: name.to_string(),
        });
    }

    let raw = fs::read_to_string(&path).map_err(|error| TestingError::Io {
        path: path.clone(),
        reason: error.to_string(),
    })?;

    from_toml_str(name, &raw)
}

pub fn from_toml_str(name: &str, raw: &str) -> Result<Scenario> {
    let scenario: Scenario = toml::from_str(raw).map_err(|error| TestingError::ScenarioInvalid {
        name: name.to_string(),
        reason: error.to_string(),
    })?;

    validate(&scenario)?;
    Ok(scenario)
}

/// Names of every scenario file, sorted.
pub fn list_scenarios() -> Result<Vec<String>> {
    let root = scenarios_root();
    let entries = fs::read_dir(&root).map_err(|error| TestingError::Io {
        path: root.clone(),
        reason: error.to_string(),
    })?;

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    Ok(names)
}

pub fn validate(scenario: &Scenario) -> Result<()> {
    if scenario.name.is_empty() {
        return Err(TestingError::ScenarioInvalid {
            name: "<unknown>".to_string(),
            reason: "name must not be empty".to_string(),
        });
    }

    if scenario.steps.is_empty() {
        return Err(TestingError::ScenarioInvalid {
            name: scenario.name.clone(),
            reason: "steps must not be empty".to_string(),
        });
    }

    for (index, step) in scenario.steps.iter().enumerate() {
        if let Some(kind) = step
            .expect
            .iter()
            .find(|kind| !EVENT_KINDS.contains(&kind.as_str()))
        {
            return Err(TestingError::ScenarioInvalid {
                name: scenario.name.clone(),
                reason: format!("step {index}: unknown event kind '{kind}'"),
            });
        }

        if let Some(entry) = step.mounts.iter().find(|m| m.mount_path.is_empty()) {
            return Err(TestingError::ScenarioInvalid {
                name: scenario.name.clone(),
                reason: format!(
                    "step {index}: mount entry for '{}' has no mount path",
                    entry.device_path
                ),
            });
        }
    }

    Ok(())
}
