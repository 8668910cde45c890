// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: FARM_SNAPSHOT

use activation::ScopeLevel;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// On-disk form of a farm: the node tree plus the installed definitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FarmSnapshot {
    pub farm: NodeSpec,
    #[serde(default)]
    pub definitions: Vec<DefinitionSpec>,
}

/// One node. The level is implied by depth: the farm's children are web
/// applications, theirs are site collections, theirs are webs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeSpec {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<Uuid>,
    /// Reading this node fails.
    #[serde(default, skip_serializing_if = "is_false")]
    pub broken: bool,
    /// Mutating this node fails.
    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,
    #[serde(
        default,
        alias = "web_applications",
        alias = "site_collections",
        alias = "webs",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub children: Vec<NodeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefinitionSpec {
    pub id: Uuid,
    pub name: String,
    pub scope: ScopeLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatibility_level: Option<i32>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl FarmSnapshot {
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse farm snapshot")
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize farm snapshot")
    }
}
