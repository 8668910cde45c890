// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: ADMIN_CONFIG

use activation::DEFAULT_MAX_SELECTION;
use anyhow::{Context, Result, bail};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "FEATUREADMIN_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_farm_file")]
    pub farm_file: PathBuf,
    #[serde(default = "default_max_selection")]
    pub max_selection: usize,
    /// Passed to every activate / deactivate call.
    #[serde(default)]
    pub forceful: bool,
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

fn default_version() -> u32 {
    1
}
fn default_farm_file() -> PathBuf {
    PathBuf::from("farm.yaml")
}
fn default_max_selection() -> usize {
    DEFAULT_MAX_SELECTION
}
fn default_timestamp_format() -> String {
    "%Y/%m/%d %H:%M:%S".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            farm_file: default_farm_file(),
            max_selection: default_max_selection(),
            forceful: false,
            timestamp_format: default_timestamp_format(),
        }
    }
}

impl AdminConfig {
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).context("Failed to parse featureadmin.yaml")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            bail!(
                "Unsupported version: {}. Only version 1 is supported.",
                self.version
            );
        }

        if self.max_selection == 0 {
            bail!("max_selection must be at least 1");
        }

        if self.farm_file.as_os_str().is_empty() {
            bail!("farm_file must not be empty");
        }

        if StrftimeItems::new(&self.timestamp_format).any(|item| matches!(item, Item::Error)) {
            bail!(
                "Invalid timestamp_format: '{}'",
                self.timestamp_format
            );
        }

        Ok(())
    }

    /// Reads the file named by `flag`, else by `$FEATUREADMIN_CONFIG`, else
    /// returns the defaults. A relative `farm_file` is taken relative to the
    /// config file.
    pub fn load(flag: Option<&Path>) -> Result<Self> {
        let env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match resolve_path(flag, env) {
            Some(path) => Self::load_file(&path),
            None => {
                log::debug!("No config file given; using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        if config.farm_file.is_relative()
            && let Some(dir) = path.parent()
        {
            config.farm_file = dir.join(&config.farm_file);
        }
        Ok(config)
    }
}

fn resolve_path(flag: Option<&Path>, env: Option<PathBuf>) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or(env.filter(|p| !p.as_os_str().is_empty()))
}
