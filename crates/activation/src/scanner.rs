// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: ACTIVATION_SCANNER

use crate::index::{ActivationIndex, IndexBuilder};
use crate::model::{Location, ScopeLevel};
use crate::provider::{FeatureCatalog, HierarchyProvider};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A node that could not be read. Its subtree is missing from the index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanError {
    pub location: Location,
    pub cause: String,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.cause)
    }
}

/// Walks the whole hierarchy once and records every activation it finds.
pub struct ActivationScanner<'a, P: ?Sized, C: ?Sized> {
    provider: &'a P,
    catalog: &'a C,
}

impl<'a, P, C> ActivationScanner<'a, P, C>
where
    P: HierarchyProvider + ?Sized,
    C: FeatureCatalog + ?Sized,
{
    pub fn new(provider: &'a P, catalog: &'a C) -> Self {
        Self { provider, catalog }
    }

    pub fn scan(&self) -> (ActivationIndex, Vec<ScanError>) {
        let mut builder = IndexBuilder::new();
        let mut errors = Vec::new();
        let farm = self.provider.farm();

        match self.catalog.definitions() {
            Ok(defs) => {
                for (id, def) in defs {
                    builder.define(id, def);
                }
            }
            Err(e) => {
                log::warn!("Could not list feature definitions: {}", e);
                errors.push(ScanError {
                    location: farm.clone(),
                    cause: format!("Listing feature definitions: {}", e),
                });
            }
        }

        self.visit(&farm, &mut builder, &mut errors);

        let index = builder.build();
        log::info!(
            "Scan complete: {} activations at {} locations, {} faulty features, {} errors",
            index.total_activations(),
            index.visited().count(),
            index.faulty_feature_ids().len(),
            errors.len()
        );
        (index, errors)
    }

    fn visit(&self, node: &Location, builder: &mut IndexBuilder, errors: &mut Vec<ScanError>) {
        let active = match self.provider.list_active_feature_ids(node) {
            Ok(ids) => ids,
            Err(e) => {
                log::warn!("Skipping {}: {}", node, e);
                errors.push(ScanError {
                    location: node.clone(),
                    cause: e.to_string(),
                });
                return;
            }
        };

        builder.visit(node);
        for feature_id in active {
            // An activation without metadata is still recorded so it can be cleaned up.
            builder.record(node, feature_id);
            match self.catalog.resolve(feature_id) {
                Ok(def) => builder.define(feature_id, def),
                Err(e) => {
                    log::debug!("{} at {}", e, node);
                    builder.mark_faulty(feature_id);
                }
            }
        }

        if node.kind == ScopeLevel::Web {
            return;
        }

        match self.provider.list_children(node) {
            Ok(children) => {
                for child in children.iter().filter(|c| !c.is_empty()) {
                    self.visit(child, builder, errors);
                }
            }
            Err(e) => {
                log::warn!("Cannot enumerate children of {}: {}", node, e);
                errors.push(ScanError {
                    location: node.clone(),
                    cause: e.to_string(),
                });
            }
        }
    }
}
