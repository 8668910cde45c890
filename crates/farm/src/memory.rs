// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: MEMORY_FARM

use crate::snapshot::{DefinitionSpec, FarmSnapshot, NodeSpec};
use activation::{
    FeatureCatalog, FeatureDefinition, HierarchyProvider, Location, NotFoundError, ProviderError,
    RemoveStatus, ScopeLevel,
};
use anyhow::{Result, bail};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Node {
    location: Location,
    children: Vec<Uuid>,
    features: BTreeSet<Uuid>,
    broken: bool,
    locked: bool,
}

#[derive(Debug)]
struct State {
    root: Uuid,
    nodes: HashMap<Uuid, Node>,
    definitions: BTreeMap<Uuid, FeatureDefinition>,
    // Dirty flag for callers that persist after mutations.
    changed: bool,
}

/// A farm held entirely in memory, loaded from a [`FarmSnapshot`].
#[derive(Debug)]
pub struct MemoryFarm {
    state: Mutex<State>,
}

impl MemoryFarm {
    pub fn from_snapshot(snapshot: &FarmSnapshot) -> Result<Self> {
        let mut nodes = HashMap::new();
        let root = snapshot.farm.id;
        flatten(&snapshot.farm, ScopeLevel::Farm, &mut nodes)?;

        let mut definitions = BTreeMap::new();
        for def in &snapshot.definitions {
            if definitions.contains_key(&def.id) {
                bail!("Duplicate feature definition {}", def.id);
            }
            definitions.insert(
                def.id,
                FeatureDefinition {
                    name: def.name.clone(),
                    scope: def.scope,
                    compatibility_level: def.compatibility_level,
                },
            );
        }

        log::debug!(
            "Loaded farm with {} nodes and {} definitions",
            nodes.len(),
            definitions.len()
        );
        Ok(Self {
            state: Mutex::new(State {
                root,
                nodes,
                definitions,
                changed: false,
            }),
        })
    }

    pub fn to_snapshot(&self) -> FarmSnapshot {
        let state = self.state.lock().unwrap();
        FarmSnapshot {
            farm: unflatten(&state, state.root),
            definitions: state
                .definitions
                .iter()
                .map(|(id, def)| DefinitionSpec {
                    id: *id,
                    name: def.name.clone(),
                    scope: def.scope,
                    compatibility_level: def.compatibility_level,
                })
                .collect(),
        }
    }

    /// True once any activation record has been added or removed.
    pub fn is_changed(&self) -> bool {
        self.state.lock().unwrap().changed
    }

    pub fn is_active(&self, location_id: Uuid, feature_id: Uuid) -> bool {
        self.state
            .lock()
            .unwrap()
            .nodes
            .get(&location_id)
            .is_some_and(|n| n.features.contains(&feature_id))
    }

    pub fn location(&self, location_id: Uuid) -> Option<Location> {
        self.state
            .lock()
            .unwrap()
            .nodes
            .get(&location_id)
            .map(|n| n.location.clone())
    }

    fn with_node<T>(
        &self,
        location: &Location,
        write: bool,
        f: impl FnOnce(&mut Node, &BTreeMap<Uuid, FeatureDefinition>) -> Result<T, ProviderError>,
    ) -> Result<T, ProviderError> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let Some(node) = state.nodes.get_mut(&location.id) else {
            return Err(ProviderError::Unreachable(location.url.clone()));
        };
        if node.broken {
            return Err(ProviderError::Corrupted(location.url.clone()));
        }
        if write && node.locked {
            return Err(ProviderError::AccessDenied(location.url.clone()));
        }
        f(node, &state.definitions)
    }

    fn mark_changed(&self) {
        self.state.lock().unwrap().changed = true;
    }
}

fn flatten(spec: &NodeSpec, kind: ScopeLevel, nodes: &mut HashMap<Uuid, Node>) -> Result<()> {
    if nodes.contains_key(&spec.id) {
        bail!("Duplicate node id {}", spec.id);
    }
    let child_kind = kind.child();
    if child_kind.is_none() && !spec.children.is_empty() {
        bail!("Web {} cannot have children", spec.id);
    }

    let name = if spec.name.is_empty() && kind == ScopeLevel::Farm {
        "Farm".to_string()
    } else {
        spec.name.clone()
    };
    nodes.insert(
        spec.id,
        Node {
            location: Location::new(spec.id, spec.url.clone(), name, kind),
            children: spec.children.iter().map(|c| c.id).collect(),
            features: spec.features.iter().copied().collect(),
            broken: spec.broken,
            locked: spec.locked,
        },
    );

    if let Some(child_kind) = child_kind {
        for child in &spec.children {
            flatten(child, child_kind, nodes)?;
        }
    }
    Ok(())
}

fn unflatten(state: &State, id: Uuid) -> NodeSpec {
    let node = &state.nodes[&id];
    NodeSpec {
        id,
        url: node.location.url.clone(),
        name: node.location.name.clone(),
        features: node.features.iter().copied().collect(),
        broken: node.broken,
        locked: node.locked,
        children: node
            .children
            .iter()
            .map(|c| unflatten(state, *c))
            .collect(),
    }
}

impl HierarchyProvider for MemoryFarm {
    fn farm(&self) -> Location {
        let state = self.state.lock().unwrap();
        state.nodes[&state.root].location.clone()
    }

    fn list_children(&self, location: &Location) -> Result<Vec<Location>, ProviderError> {
        let state = self.state.lock().unwrap();
        let Some(node) = state.nodes.get(&location.id) else {
            return Err(ProviderError::Unreachable(location.url.clone()));
        };
        if node.broken {
            return Err(ProviderError::Corrupted(location.url.clone()));
        }
        Ok(node
            .children
            .iter()
            .filter_map(|c| state.nodes.get(c))
            .map(|c| c.location.clone())
            .collect())
    }

    fn list_active_feature_ids(
        &self,
        location: &Location,
    ) -> Result<BTreeSet<Uuid>, ProviderError> {
        self.with_node(location, false, |node, _| Ok(node.features.clone()))
    }

    fn activate(
        &self,
        location: &Location,
        feature_id: Uuid,
        forceful: bool,
    ) -> Result<(), ProviderError> {
        let kind = location.kind;
        self.with_node(location, true, |node, definitions| {
            if !forceful {
                match definitions.get(&feature_id) {
                    None => {
                        return Err(ProviderError::Activation(format!(
                            "Feature definition {} is not installed",
                            feature_id
                        )));
                    }
                    Some(def) if def.scope != kind => {
                        return Err(ProviderError::Activation(format!(
                            "{} is a {} feature and cannot be activated on a {}",
                            def.name, def.scope, kind
                        )));
                    }
                    Some(_) => {}
                }
            }
            node.features.insert(feature_id);
            Ok(())
        })?;
        self.mark_changed();
        Ok(())
    }

    fn deactivate(
        &self,
        location: &Location,
        feature_id: Uuid,
        forceful: bool,
    ) -> Result<(), ProviderError> {
        self.with_node(location, true, |node, _| {
            if !node.features.remove(&feature_id) && !forceful {
                return Err(ProviderError::Activation(format!(
                    "Feature {} is not active",
                    feature_id
                )));
            }
            Ok(())
        })?;
        self.mark_changed();
        Ok(())
    }

    fn remove_activation(
        &self,
        location: &Location,
        feature_id: Uuid,
        _forceful: bool,
    ) -> Result<RemoveStatus, ProviderError> {
        let status = self.with_node(location, true, |node, _| {
            Ok(if node.features.remove(&feature_id) {
                RemoveStatus::Removed
            } else {
                RemoveStatus::Absent
            })
        })?;
        if status == RemoveStatus::Removed {
            self.mark_changed();
        }
        Ok(status)
    }
}

impl FeatureCatalog for MemoryFarm {
    fn resolve(&self, feature_id: Uuid) -> Result<FeatureDefinition, NotFoundError> {
        self.state
            .lock()
            .unwrap()
            .definitions
            .get(&feature_id)
            .cloned()
            .ok_or(NotFoundError(feature_id))
    }

    fn definitions(&self) -> Result<Vec<(Uuid, FeatureDefinition)>, ProviderError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .definitions
            .iter()
            .map(|(id, def)| (*id, def.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(children: Vec<NodeSpec>) -> NodeSpec {
        NodeSpec {
            id: Uuid::new_v4(),
            url: String::new(),
            name: String::new(),
            features: Vec::new(),
            broken: false,
            locked: false,
            children,
        }
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let web_app = node(vec![]);
        let snapshot = FarmSnapshot {
            farm: node(vec![web_app.clone(), web_app]),
            definitions: vec![],
        };
        let err = MemoryFarm::from_snapshot(&snapshot).unwrap_err();
        assert!(err.to_string().starts_with("Duplicate node id"));
    }

    #[test]
    fn test_rejects_children_below_web() {
        let too_deep = node(vec![node(vec![node(vec![node(vec![node(vec![])])])])]);
        let snapshot = FarmSnapshot {
            farm: too_deep,
            definitions: vec![],
        };
        let err = MemoryFarm::from_snapshot(&snapshot).unwrap_err();
        assert!(err.to_string().contains("cannot have children"));
    }

    #[test]
    fn test_activation_checks_scope_unless_forced() {
        let feature = Uuid::new_v4();
        let web_app = node(vec![]);
        let web_app_id = web_app.id;
        let snapshot = FarmSnapshot {
            farm: node(vec![web_app]),
            definitions: vec![DefinitionSpec {
                id: feature,
                name: "SiteThing".to_string(),
                scope: ScopeLevel::SiteCollection,
                compatibility_level: None,
            }],
        };
        let farm = MemoryFarm::from_snapshot(&snapshot).unwrap();
        let loc = farm.location(web_app_id).unwrap();

        assert!(farm.activate(&loc, feature, false).is_err());
        assert!(!farm.is_changed());
        farm.activate(&loc, feature, true).unwrap();
        assert!(farm.is_active(web_app_id, feature));
        assert!(farm.is_changed());
    }

    #[test]
    fn test_snapshot_survives_mutation() {
        let feature = Uuid::new_v4();
        let mut web_app = node(vec![]);
        web_app.features.push(feature);
        let web_app_id = web_app.id;
        let farm = MemoryFarm::from_snapshot(&FarmSnapshot {
            farm: node(vec![web_app]),
            definitions: vec![],
        })
        .unwrap();
        let loc = farm.location(web_app_id).unwrap();

        assert_eq!(
            farm.remove_activation(&loc, feature, true).unwrap(),
            RemoveStatus::Removed
        );
        let saved = farm.to_snapshot();
        assert!(saved.farm.children[0].features.is_empty());
        assert_eq!(saved.farm.children[0].id, web_app_id);
    }
}
