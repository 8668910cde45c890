// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: FARM_PROVIDER

//! File-backed hierarchy provider used by the command line tool and tests.

pub mod memory;
pub mod snapshot;
pub mod store;

pub use memory::MemoryFarm;
pub use snapshot::{DefinitionSpec, FarmSnapshot, NodeSpec};
pub use store::FarmStore;
