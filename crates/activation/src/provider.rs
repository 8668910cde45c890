// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: HIERARCHY_PROVIDER

use crate::error::{NotFoundError, ProviderError};
use crate::model::{FeatureDefinition, Location};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// What a forced removal found at the node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemoveStatus {
    Removed,
    Absent,
}

/// Access to the live hierarchy. Every call may block and every call may fail.
pub trait HierarchyProvider {
    /// The root node.
    fn farm(&self) -> Location;

    /// Web applications of the farm, site collections of a web application,
    /// webs of a site collection. Webs have no children.
    fn list_children(&self, location: &Location) -> Result<Vec<Location>, ProviderError>;

    fn list_active_feature_ids(&self, location: &Location)
    -> Result<BTreeSet<Uuid>, ProviderError>;

    fn activate(
        &self,
        location: &Location,
        feature_id: Uuid,
        forceful: bool,
    ) -> Result<(), ProviderError>;

    fn deactivate(
        &self,
        location: &Location,
        feature_id: Uuid,
        forceful: bool,
    ) -> Result<(), ProviderError>;

    /// Removes the activation record. An absent record is not an error.
    fn remove_activation(
        &self,
        location: &Location,
        feature_id: Uuid,
        forceful: bool,
    ) -> Result<RemoveStatus, ProviderError>;
}

/// Static feature metadata.
pub trait FeatureCatalog {
    fn resolve(&self, feature_id: Uuid) -> Result<FeatureDefinition, NotFoundError>;

    /// Every installed definition. Catalogs that cannot enumerate return nothing
    /// and features are then only discovered through their activations.
    fn definitions(&self) -> Result<Vec<(Uuid, FeatureDefinition)>, ProviderError> {
        Ok(Vec::new())
    }
}
