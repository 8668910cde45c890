// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: ACTIVATION_INDEX

use crate::model::{Feature, FeatureDefinition, Location};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Features active at one visited node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationEntry {
    pub location: Location,
    pub features: BTreeSet<Uuid>,
}

/// Snapshot of every activation found by one full scan.
///
/// Built only through [`IndexBuilder`]; it is never updated afterwards and goes
/// stale as soon as anything is mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivationIndex {
    pub schema_version: String,
    /// Changes whenever the scanned content changes.
    pub fingerprint: String,
    features: BTreeMap<Uuid, Vec<Location>>,
    // Keyed by location id so the snapshot serializes as a plain map.
    locations: BTreeMap<Uuid, LocationEntry>,
    definitions: BTreeMap<Uuid, FeatureDefinition>,
    faulty_feature_ids: BTreeSet<Uuid>,
}

impl ActivationIndex {
    /// Locations where `feature_id` is active, in discovery order.
    pub fn locations_of(&self, feature_id: Uuid) -> &[Location] {
        self.features
            .get(&feature_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn features_at(&self, location_id: Uuid) -> Option<&BTreeSet<Uuid>> {
        self.locations.get(&location_id).map(|e| &e.features)
    }

    pub fn location(&self, location_id: Uuid) -> Option<&Location> {
        self.locations.get(&location_id).map(|e| &e.location)
    }

    /// Visited node with the given url, compared without a trailing slash.
    /// A site collection and its root web share a url; the broadest level wins.
    pub fn find_by_url(&self, url: &str) -> Option<&Location> {
        let wanted = url.trim_end_matches('/');
        self.locations
            .values()
            .map(|e| &e.location)
            .filter(|l| l.url.trim_end_matches('/').eq_ignore_ascii_case(wanted))
            .min_by_key(|l| l.kind)
    }

    pub fn visited(&self) -> impl Iterator<Item = &Location> {
        self.locations.values().map(|e| &e.location)
    }

    pub fn faulty_feature_ids(&self) -> &BTreeSet<Uuid> {
        &self.faulty_feature_ids
    }

    pub fn is_faulty(&self, feature_id: Uuid) -> bool {
        self.faulty_feature_ids.contains(&feature_id)
    }

    pub fn activation_count(&self, feature_id: Uuid) -> usize {
        self.locations_of(feature_id).len()
    }

    pub fn total_activations(&self) -> usize {
        self.features.values().map(|v| v.len()).sum()
    }

    /// One feature record, or `None` if the id was never seen by the scan.
    pub fn feature(&self, feature_id: Uuid) -> Option<Feature> {
        let definition = self.definitions.get(&feature_id);
        if definition.is_none() && !self.features.contains_key(&feature_id) {
            return None;
        }
        let mut feature = match definition {
            Some(def) => Feature::from_definition(feature_id, def),
            None => Feature::bare(feature_id),
        };
        feature.activation_count = Some(self.activation_count(feature_id));
        feature.faulty = self.is_faulty(feature_id);
        Some(feature)
    }

    /// Every installed definition plus every orphaned activation, sorted by
    /// name with nameless features last.
    pub fn all_features(&self) -> Vec<Feature> {
        let ids: BTreeSet<Uuid> = self
            .definitions
            .keys()
            .chain(self.features.keys())
            .copied()
            .collect();
        let mut features: Vec<Feature> = ids.into_iter().filter_map(|id| self.feature(id)).collect();
        features.sort_by(|a, b| match (&a.name, &b.name) {
            (Some(x), Some(y)) => x.cmp(y).then(a.id.cmp(&b.id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        });
        features
    }
}

/// Accumulates one scan. Consumed by [`IndexBuilder::build`].
#[derive(Debug, Default)]
pub struct IndexBuilder {
    features: BTreeMap<Uuid, Vec<Location>>,
    locations: BTreeMap<Uuid, LocationEntry>,
    definitions: BTreeMap<Uuid, FeatureDefinition>,
    faulty_feature_ids: BTreeSet<Uuid>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node as visited, even if nothing is active there.
    pub fn visit(&mut self, location: &Location) {
        self.locations
            .entry(location.id)
            .or_insert_with(|| LocationEntry {
                location: location.clone(),
                features: BTreeSet::new(),
            });
    }

    pub fn record(&mut self, location: &Location, feature_id: Uuid) {
        self.visit(location);
        if let Some(entry) = self.locations.get_mut(&location.id) {
            entry.features.insert(feature_id);
        }
        let locs = self.features.entry(feature_id).or_default();
        if !locs.iter().any(|l| l.id == location.id) {
            locs.push(location.clone());
        }
    }

    pub fn define(&mut self, feature_id: Uuid, definition: FeatureDefinition) {
        self.definitions.entry(feature_id).or_insert(definition);
    }

    pub fn mark_faulty(&mut self, feature_id: Uuid) {
        self.faulty_feature_ids.insert(feature_id);
    }

    pub fn build(self) -> ActivationIndex {
        let mut index = ActivationIndex {
            schema_version: "1.0".to_string(),
            fingerprint: String::new(),
            features: self.features,
            locations: self.locations,
            definitions: self.definitions,
            faulty_feature_ids: self.faulty_feature_ids,
        };

        let mut hasher = Sha256::new();
        if let Ok(json_bytes) = serde_json::to_vec(&index) {
            hasher.update(json_bytes);
        }
        index.fingerprint = format!("sha256:{}", hex::encode(hasher.finalize()));
        index
    }
}
