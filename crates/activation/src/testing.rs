// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus

//! In-memory hierarchy used by the unit tests of this crate.

use crate::error::{NotFoundError, ProviderError};
use crate::model::{FeatureDefinition, Location, ScopeLevel};
use crate::provider::{FeatureCatalog, HierarchyProvider, RemoveStatus};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use uuid::Uuid;

struct Node {
    location: Location,
    children: Vec<Uuid>,
    active: BTreeSet<Uuid>,
}

pub(crate) struct TestFarm {
    root: Uuid,
    nodes: RefCell<BTreeMap<Uuid, Node>>,
    definitions: BTreeMap<Uuid, FeatureDefinition>,
    broken: HashSet<Uuid>,
    locked: HashSet<Uuid>,
    pub(crate) mutations: Cell<usize>,
}

impl TestFarm {
    pub(crate) fn new() -> Self {
        let root = Uuid::new_v4();
        let mut nodes = BTreeMap::new();
        nodes.insert(
            root,
            Node {
                location: Location::new(root, "", "Local Farm", ScopeLevel::Farm),
                children: Vec::new(),
                active: BTreeSet::new(),
            },
        );
        Self {
            root,
            nodes: RefCell::new(nodes),
            definitions: BTreeMap::new(),
            broken: HashSet::new(),
            locked: HashSet::new(),
            mutations: Cell::new(0),
        }
    }

    pub(crate) fn root(&self) -> Uuid {
        self.root
    }

    pub(crate) fn add(&mut self, parent: Uuid, kind: ScopeLevel, url: &str) -> Location {
        let id = Uuid::new_v4();
        let location = Location::new(id, url, url.rsplit('/').next().unwrap_or(url), kind);
        let nodes = self.nodes.get_mut();
        nodes.get_mut(&parent).unwrap().children.push(id);
        nodes.insert(
            id,
            Node {
                location: location.clone(),
                children: Vec::new(),
                active: BTreeSet::new(),
            },
        );
        location
    }

    pub(crate) fn define(&mut self, name: &str, scope: ScopeLevel) -> Uuid {
        let id = Uuid::new_v4();
        self.definitions.insert(
            id,
            FeatureDefinition {
                name: name.to_string(),
                scope,
                compatibility_level: Some(15),
            },
        );
        id
    }

    pub(crate) fn activate_raw(&mut self, node: Uuid, feature: Uuid) {
        self.nodes.get_mut().get_mut(&node).unwrap().active.insert(feature);
    }

    pub(crate) fn remove_raw(&mut self, node: Uuid, feature: Uuid) {
        self.nodes.get_mut().get_mut(&node).unwrap().active.remove(&feature);
    }

    pub(crate) fn break_node(&mut self, node: Uuid) {
        self.broken.insert(node);
    }

    pub(crate) fn lock_node(&mut self, node: Uuid) {
        self.locked.insert(node);
    }

    pub(crate) fn is_active(&self, node: Uuid, feature: Uuid) -> bool {
        self.nodes.borrow()[&node].active.contains(&feature)
    }

    fn check_readable(&self, location: &Location) -> Result<(), ProviderError> {
        if self.broken.contains(&location.id) {
            return Err(ProviderError::Corrupted(location.url.clone()));
        }
        if !self.nodes.borrow().contains_key(&location.id) {
            return Err(ProviderError::Unreachable(location.url.clone()));
        }
        Ok(())
    }

    fn check_writable(&self, location: &Location) -> Result<(), ProviderError> {
        self.check_readable(location)?;
        if self.locked.contains(&location.id) {
            return Err(ProviderError::AccessDenied(location.url.clone()));
        }
        Ok(())
    }
}

impl HierarchyProvider for TestFarm {
    fn farm(&self) -> Location {
        self.nodes.borrow()[&self.root].location.clone()
    }

    fn list_children(&self, location: &Location) -> Result<Vec<Location>, ProviderError> {
        self.check_readable(location)?;
        let nodes = self.nodes.borrow();
        Ok(nodes[&location.id]
            .children
            .iter()
            .map(|c| nodes[c].location.clone())
            .collect())
    }

    fn list_active_feature_ids(
        &self,
        location: &Location,
    ) -> Result<BTreeSet<Uuid>, ProviderError> {
        self.check_readable(location)?;
        Ok(self.nodes.borrow()[&location.id].active.clone())
    }

    fn activate(
        &self,
        location: &Location,
        feature_id: Uuid,
        forceful: bool,
    ) -> Result<(), ProviderError> {
        self.check_writable(location)?;
        if !forceful && !self.definitions.contains_key(&feature_id) {
            return Err(ProviderError::Activation(format!(
                "definition {} missing",
                feature_id
            )));
        }
        self.mutations.set(self.mutations.get() + 1);
        self.nodes
            .borrow_mut()
            .get_mut(&location.id)
            .unwrap()
            .active
            .insert(feature_id);
        Ok(())
    }

    fn deactivate(
        &self,
        location: &Location,
        feature_id: Uuid,
        _forceful: bool,
    ) -> Result<(), ProviderError> {
        self.check_writable(location)?;
        self.mutations.set(self.mutations.get() + 1);
        self.nodes
            .borrow_mut()
            .get_mut(&location.id)
            .unwrap()
            .active
            .remove(&feature_id);
        Ok(())
    }

    fn remove_activation(
        &self,
        location: &Location,
        feature_id: Uuid,
        _forceful: bool,
    ) -> Result<RemoveStatus, ProviderError> {
        self.check_writable(location)?;
        let removed = self
            .nodes
            .borrow_mut()
            .get_mut(&location.id)
            .unwrap()
            .active
            .remove(&feature_id);
        if removed {
            self.mutations.set(self.mutations.get() + 1);
            Ok(RemoveStatus::Removed)
        } else {
            Ok(RemoveStatus::Absent)
        }
    }
}

impl FeatureCatalog for TestFarm {
    fn resolve(&self, feature_id: Uuid) -> Result<FeatureDefinition, NotFoundError> {
        self.definitions
            .get(&feature_id)
            .cloned()
            .ok_or(NotFoundError(feature_id))
    }

    fn definitions(&self) -> Result<Vec<(Uuid, FeatureDefinition)>, ProviderError> {
        Ok(self
            .definitions
            .iter()
            .map(|(id, def)| (*id, def.clone()))
            .collect())
    }
}
