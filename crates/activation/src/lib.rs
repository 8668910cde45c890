// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: ACTIVATION_CORE

//! Scanning, validation and scoped mutation of feature activations across a
//! farm / web application / site collection / web hierarchy.

pub mod error;
pub mod events;
pub mod gate;
pub mod index;
pub mod locate;
pub mod model;
pub mod mutator;
pub mod provider;
pub mod remover;
pub mod scanner;
mod traverse;

#[cfg(test)]
mod testing;

pub use error::{AdminError, ConfigurationError, NotFoundError, ProviderError, ValidationError};
pub use events::{CancelToken, EventSink, Listeners, NullSink};
pub use gate::{DEFAULT_MAX_SELECTION, ScopeGate};
pub use index::{ActivationIndex, IndexBuilder, LocationEntry};
pub use locate::{FeatureLocationSet, FeatureLocations, locate};
pub use model::{
    Action, Event, EventKind, Feature, FeatureDefinition, FeatureSet, Location, NodeFailure,
    OperationOutcome, ScopeLevel,
};
pub use mutator::ScopedMutator;
pub use provider::{FeatureCatalog, HierarchyProvider, RemoveStatus};
pub use remover::ForceRemover;
pub use scanner::{ActivationScanner, ScanError};
