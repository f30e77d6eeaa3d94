// SPDX-License-Identifier: GPL-3.0-only

//! Test support for the storage monitor
//!
//! - [`fixtures`]: snapshot builders plus in-memory device and mount-table
//!   sources whose contents a test can swap between updates
//! - [`scenario`]: scripted sequences of inventory states loaded from TOML
//!   under `resources/scenarios`

pub mod errors;
pub mod fixtures;
pub mod scenario;

pub use errors::{Result, TestingError};
pub use fixtures::{FakeDevices, FakeMountTable};
pub use scenario::{Scenario, Step};
