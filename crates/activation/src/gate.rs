// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: SCOPE_GATE

use crate::error::{AdminError, ConfigurationError, ValidationError};
use crate::model::{Action, FeatureSet, Location, ScopeLevel};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Largest selection that may be activated or deactivated in one call.
pub const DEFAULT_MAX_SELECTION: usize = 10;

/// Decides, before anything is touched, whether an operation may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeGate {
    max_selection: usize,
}

impl Default for ScopeGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SELECTION)
    }
}

impl ScopeGate {
    pub fn new(max_selection: usize) -> Self {
        Self { max_selection }
    }

    pub fn max_selection(&self) -> usize {
        self.max_selection
    }

    pub fn validate(
        &self,
        selection: &FeatureSet,
        target: ScopeLevel,
        action: Action,
    ) -> Result<(), ValidationError> {
        let verb = action.verb_past();

        if selection.is_empty() {
            return Err(ValidationError::EmptySelection);
        }

        if selection.len() > self.max_selection {
            return Err(ValidationError::TooManyFeatures {
                count: selection.len(),
                max: self.max_selection,
                verb,
            });
        }

        if let Some(feature) = selection.unscoped().next() {
            return Err(ValidationError::UnknownScope(feature.id, verb));
        }

        let Some(lowest) = selection.lowest_scope() else {
            return Err(ValidationError::EmptySelection);
        };

        if !lowest.admits(target) {
            return Err(ValidationError::ScopeMismatch {
                lowest,
                target,
                verb,
            });
        }

        Ok(())
    }

    /// Forced removal has no size cap, but site and web sets must stay
    /// disjoint and may only be combined for web-application or farm wide
    /// removal.
    pub fn validate_removal(
        &self,
        site_features: &BTreeSet<Uuid>,
        web_features: &BTreeSet<Uuid>,
        start: ScopeLevel,
    ) -> Result<(), AdminError> {
        if site_features.is_empty() && web_features.is_empty() {
            return Err(ValidationError::EmptySelection.into());
        }

        if let Some(id) = site_features.intersection(web_features).next() {
            return Err(ConfigurationError::OverlappingRemoval(*id).into());
        }

        let mixed = !site_features.is_empty() && !web_features.is_empty();
        match start {
            ScopeLevel::Farm | ScopeLevel::WebApplication => Ok(()),
            ScopeLevel::SiteCollection if mixed => {
                Err(ConfigurationError::MixedRemoval(start).into())
            }
            ScopeLevel::SiteCollection => Ok(()),
            ScopeLevel::Web if mixed => Err(ConfigurationError::MixedRemoval(start).into()),
            ScopeLevel::Web if !site_features.is_empty() => {
                Err(ConfigurationError::SiteFeaturesAtWeb.into())
            }
            ScopeLevel::Web => Ok(()),
        }
    }

    /// Target scopes an operator may pick for `selection` while `selected` is
    /// the current node. Selecting a node implies its ancestors, so every level
    /// from the web application down to the node's own level is reachable.
    pub fn permitted_targets(
        &self,
        selection: &FeatureSet,
        selected: Option<&Location>,
    ) -> Vec<ScopeLevel> {
        if selection.is_empty() || selection.len() > self.max_selection {
            return Vec::new();
        }
        if selection.unscoped().next().is_some() {
            return Vec::new();
        }
        let Some(lowest) = selection.lowest_scope() else {
            return Vec::new();
        };
        let depth = match selected {
            Some(loc) if !loc.is_empty() => loc.kind,
            _ => ScopeLevel::Farm,
        };
        ScopeLevel::ALL
            .into_iter()
            .filter(|target| *target <= depth && lowest.admits(*target))
            .collect()
    }
}
