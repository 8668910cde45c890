// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: FARM_STORE

use crate::memory::MemoryFarm;
use crate::snapshot::FarmSnapshot;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Loads and saves a farm snapshot file.
#[derive(Debug, Clone)]
pub struct FarmStore {
    path: PathBuf,
}

impl FarmStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<MemoryFarm> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read farm file {}", self.path.display()))?;
        let snapshot = FarmSnapshot::parse(&content)
            .with_context(|| format!("Invalid farm file {}", self.path.display()))?;
        MemoryFarm::from_snapshot(&snapshot)
            .with_context(|| format!("Invalid farm file {}", self.path.display()))
    }

    /// Writes next to the target first and renames over it, so a failed save
    /// leaves the previous file intact.
    pub fn save(&self, farm: &MemoryFarm) -> Result<()> {
        let yaml = farm.to_snapshot().to_yaml()?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, yaml)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        log::debug!("Saved farm to {}", self.path.display());
        Ok(())
    }
}
