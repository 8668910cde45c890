// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: ACTIVATION_ERRORS

use crate::model::ScopeLevel;
use thiserror::Error;
use uuid::Uuid;

/// Failure of a single call against the hierarchy provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Access denied: {0}")]
    AccessDenied(String),
    #[error("Node unreachable: {0}")]
    Unreachable(String),
    #[error("Node corrupted: {0}")]
    Corrupted(String),
    #[error("Activation failed: {0}")]
    Activation(String),
}

/// Feature metadata could not be resolved.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Feature definition {0} not found")]
pub struct NotFoundError(pub Uuid);

/// A selection the scope gate refuses. Nothing has been attempted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("No feature selected. Please select at least 1 feature.")]
    EmptySelection,
    #[error("Too many features ({count}) selected; max {max} may be {verb} at a time")]
    TooManyFeatures {
        count: usize,
        max: usize,
        verb: &'static str,
    },
    #[error("Feature {0} has no known scope and cannot be {1}")]
    UnknownScope(Uuid, &'static str),
    #[error("{lowest} Feature(s) cannot be {verb} at level {target}")]
    ScopeMismatch {
        lowest: ScopeLevel,
        target: ScopeLevel,
        verb: &'static str,
    },
}

/// An invalid combination of arguments, rejected before any traversal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Cannot remove site features and web features simultaneously from a {0}")]
    MixedRemoval(ScopeLevel),
    #[error("SiteCollection scoped features cannot be removed from a single Web")]
    SiteFeaturesAtWeb,
    #[error("Feature {0} is listed as both site scoped and web scoped")]
    OverlappingRemoval(Uuid),
    #[error("Start location {start} is narrower than the requested scope {target}")]
    StartBelowTarget {
        start: ScopeLevel,
        target: ScopeLevel,
    },
}

/// Errors returned to the caller of a mutating operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdminError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
