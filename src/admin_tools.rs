// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: ADMIN_TOOLS

use crate::config::AdminConfig;
use activation::{
    Action, ActivationIndex, ActivationScanner, AdminError, CancelToken, EventSink, Feature,
    FeatureCatalog, FeatureLocationSet, FeatureSet, ForceRemover, HierarchyProvider, Location,
    OperationOutcome, ScanError, ScopeGate, ScopeLevel, ScopedMutator, locate,
};
use anyhow::{Result, anyhow, bail};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub fingerprint: String,
    pub locations_visited: usize,
    pub total_activations: usize,
    pub faulty_features: usize,
    pub errors: Vec<ScanError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureListing {
    pub installed: usize,
    pub faulty: usize,
    pub features: Vec<Feature>,
}

/// Holds a provider and the most recent scan of it.
///
/// The scan is cached until a mutation succeeds; callers that need fresh data
/// after that get a new scan on their next read.
pub struct AdminTools<P> {
    provider: P,
    gate: ScopeGate,
    forceful: bool,
    cancel: CancelToken,
    cache: Mutex<Option<Arc<ActivationIndex>>>,
}

impl<P> AdminTools<P>
where
    P: HierarchyProvider + FeatureCatalog,
{
    pub fn new(provider: P, config: &AdminConfig) -> Self {
        Self {
            provider,
            gate: ScopeGate::new(config.max_selection),
            forceful: config.forceful,
            cancel: CancelToken::new(),
            cache: Mutex::new(None),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Cancelling stops any running traversal after its current node.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Always rescans and replaces the cached index.
    pub fn scan(&self) -> ScanReport {
        let (index, errors) = self.rescan();
        ScanReport {
            fingerprint: index.fingerprint.clone(),
            locations_visited: index.visited().count(),
            total_activations: index.total_activations(),
            faulty_features: index.faulty_feature_ids().len(),
            errors,
        }
    }

    fn rescan(&self) -> (Arc<ActivationIndex>, Vec<ScanError>) {
        let (index, errors) = ActivationScanner::new(&self.provider, &self.provider).scan();
        let index = Arc::new(index);
        *self.cache.lock().unwrap() = Some(index.clone());
        (index, errors)
    }

    pub fn index(&self) -> Arc<ActivationIndex> {
        {
            let cache = self.cache.lock().unwrap();
            if let Some(index) = cache.as_ref() {
                return index.clone();
            }
        }
        self.rescan().0
    }

    pub fn invalidate(&self) {
        *self.cache.lock().unwrap() = None;
    }

    pub fn features(&self, faulty_only: bool) -> FeatureListing {
        let index = self.index();
        let all = index.all_features();
        let installed = all.len();
        let faulty = all.iter().filter(|f| f.faulty).count();
        let features: Vec<Feature> = if faulty_only {
            all.into_iter().filter(|f| f.faulty).collect()
        } else {
            all
        };
        log::info!("{} features installed, {} faulty", installed, faulty);
        FeatureListing {
            installed,
            faulty,
            features,
        }
    }

    pub fn locate(&self, feature_ids: &[Uuid]) -> FeatureLocationSet {
        let set = locate(&self.index(), feature_ids);
        if set.is_empty() {
            log::info!("No activations found");
        }
        set
    }

    /// Resolves a url to a scanned node.
    pub fn find_location(&self, url: &str) -> Result<Location> {
        self.index()
            .find_by_url(url)
            .cloned()
            .ok_or_else(|| anyhow!("No scanned location has url {}", url))
    }

    /// Builds a selection from ids. Ids with no definition stay in the set
    /// without a scope so validation can name them.
    pub fn selection(&self, feature_ids: &[Uuid]) -> FeatureSet {
        let index = self.index();
        FeatureSet::new(feature_ids.iter().map(|id| {
            index
                .feature(*id)
                .or_else(|| {
                    self.provider
                        .resolve(*id)
                        .ok()
                        .map(|def| Feature::from_definition(*id, &def))
                })
                .unwrap_or_else(|| Feature::bare(*id))
        }))
    }

    pub fn targets(&self, feature_ids: &[Uuid], at: Option<&Location>) -> Vec<ScopeLevel> {
        self.gate
            .permitted_targets(&self.selection(feature_ids), at)
    }

    pub fn apply(
        &self,
        action: Action,
        target: ScopeLevel,
        at: Option<&Location>,
        feature_ids: &[Uuid],
        force: bool,
        sink: &mut dyn EventSink,
    ) -> Result<OperationOutcome, AdminError> {
        let selection = self.selection(feature_ids);
        let outcome = ScopedMutator::new(&self.provider)
            .with_gate(self.gate)
            .with_cancel(self.cancel.clone())
            .apply(action, target, at, &selection, force || self.forceful, sink)?;
        self.after_mutation(&outcome);
        Ok(outcome)
    }

    pub fn remove(
        &self,
        site_features: &BTreeSet<Uuid>,
        web_features: &BTreeSet<Uuid>,
        at: Option<&Location>,
        sink: &mut dyn EventSink,
    ) -> Result<OperationOutcome, AdminError> {
        let outcome = ForceRemover::new(&self.provider)
            .with_cancel(self.cancel.clone())
            .remove(site_features, web_features, at, sink)?;
        self.after_mutation(&outcome);
        Ok(outcome)
    }

    /// Removes a feature from every node of its scope. `scope` is required
    /// when the feature has no definition.
    pub fn remove_everywhere(
        &self,
        feature_id: Uuid,
        scope: Option<ScopeLevel>,
        sink: &mut dyn EventSink,
    ) -> Result<OperationOutcome> {
        let declared = self
            .selection(&[feature_id])
            .iter()
            .next()
            .and_then(|f| f.declared_scope);
        let Some(scope) = scope.or(declared) else {
            bail!(
                "Feature {} has no known scope; pass the scope to remove it",
                feature_id
            );
        };
        let outcome = ForceRemover::new(&self.provider)
            .with_cancel(self.cancel.clone())
            .remove_everywhere(feature_id, scope, sink);
        self.after_mutation(&outcome);
        Ok(outcome)
    }

    fn after_mutation(&self, outcome: &OperationOutcome) {
        if outcome.succeeded > 0 {
            self.invalidate();
        }
    }
}
