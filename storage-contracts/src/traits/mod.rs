// SPDX-License-Identifier: GPL-3.0-only

pub mod discovery;
pub mod inventory;

pub use discovery::{DeviceSource, MountTableSource};
pub use inventory::{Inventory, InventoryCell, InventoryProvider};
