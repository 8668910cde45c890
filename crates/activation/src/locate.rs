// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: ACTIVATION_LOCATE

use crate::index::ActivationIndex;
use crate::model::{Feature, Location};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureLocations {
    pub feature: Feature,
    pub locations: Vec<Location>,
}

/// Where each requested feature is active.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeatureLocationSet {
    pub entries: Vec<FeatureLocations>,
}

impl FeatureLocationSet {
    pub fn total_location_count(&self) -> usize {
        self.entries.iter().map(|e| e.locations.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_location_count() == 0
    }
}

/// Looks up every id in the index. Ids the scan never saw are reported with
/// no locations rather than dropped.
pub fn locate(index: &ActivationIndex, feature_ids: &[Uuid]) -> FeatureLocationSet {
    let mut entries: Vec<FeatureLocations> = Vec::new();
    for id in feature_ids {
        if entries.iter().any(|e| e.feature.id == *id) {
            continue;
        }
        let feature = index.feature(*id).unwrap_or_else(|| Feature::bare(*id));
        entries.push(FeatureLocations {
            feature,
            locations: index.locations_of(*id).to_vec(),
        });
    }
    // Named features first, orphans after.
    entries.sort_by_key(|e| (e.feature.name.is_none(), e.feature.name_or_id()));
    FeatureLocationSet { entries }
}
