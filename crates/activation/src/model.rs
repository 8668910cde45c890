// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: ACTIVATION_MODEL

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A level of the administrative hierarchy.
///
/// Declaration order is the ordinal order: `Farm` is the broadest level (0) and
/// `Web` the narrowest (3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScopeLevel {
    Farm,
    WebApplication,
    SiteCollection,
    Web,
}

impl ScopeLevel {
    pub const ALL: [ScopeLevel; 4] = [
        ScopeLevel::Farm,
        ScopeLevel::WebApplication,
        ScopeLevel::SiteCollection,
        ScopeLevel::Web,
    ];

    pub fn ordinal(self) -> u8 {
        match self {
            ScopeLevel::Farm => 0,
            ScopeLevel::WebApplication => 1,
            ScopeLevel::SiteCollection => 2,
            ScopeLevel::Web => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeLevel::Farm => "farm",
            ScopeLevel::WebApplication => "web_application",
            ScopeLevel::SiteCollection => "site_collection",
            ScopeLevel::Web => "web",
        }
    }

    /// The level directly beneath this one, if any.
    pub fn child(self) -> Option<ScopeLevel> {
        match self {
            ScopeLevel::Farm => Some(ScopeLevel::WebApplication),
            ScopeLevel::WebApplication => Some(ScopeLevel::SiteCollection),
            ScopeLevel::SiteCollection => Some(ScopeLevel::Web),
            ScopeLevel::Web => None,
        }
    }

    /// Whether a selection whose broadest declared scope is `self` may be
    /// operated on with `target` as the requested scope.
    ///
    /// This is the only place the direction of the comparison is defined:
    /// the selection's lowest scope must be at or below (narrower than or equal
    /// to) the target.
    pub fn admits(self, target: ScopeLevel) -> bool {
        self >= target
    }
}

impl fmt::Display for ScopeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScopeLevel::Farm => "Farm",
            ScopeLevel::WebApplication => "WebApplication",
            ScopeLevel::SiteCollection => "SiteCollection",
            ScopeLevel::Web => "Web",
        };
        f.write_str(s)
    }
}

impl FromStr for ScopeLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "farm" => Ok(ScopeLevel::Farm),
            "webapplication" | "webapp" => Ok(ScopeLevel::WebApplication),
            "sitecollection" | "site" => Ok(ScopeLevel::SiteCollection),
            "web" => Ok(ScopeLevel::Web),
            _ => Err(format!("Unknown scope level: {}", s)),
        }
    }
}

/// A node of the hierarchy.
///
/// An empty location (nil id, empty url) means "nothing selected" and is never
/// visited by a traversal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    pub id: Uuid,
    pub url: String,
    pub name: String,
    pub kind: ScopeLevel,
}

impl Location {
    pub fn new(id: Uuid, url: impl Into<String>, name: impl Into<String>, kind: ScopeLevel) -> Self {
        Self {
            id,
            url: url.into(),
            name: name.into(),
            kind,
        }
    }

    pub fn empty() -> Self {
        Self {
            id: Uuid::nil(),
            url: String::new(),
            name: String::new(),
            kind: ScopeLevel::Farm,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_nil() && self.url.is_empty()
    }

    /// Human readable description that is safe to call on the empty sentinel.
    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "(none)".to_string();
        }
        match (self.name.is_empty(), self.url.is_empty()) {
            (false, false) => format!("{} '{}' <{}>", self.kind, self.name, self.url),
            (false, true) => format!("{} '{}'", self.kind, self.name),
            (true, false) => format!("{} <{}>", self.kind, self.url),
            (true, true) => format!("{} {}", self.kind, self.id),
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Static metadata the catalog knows about a feature id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureDefinition {
    pub name: String,
    pub scope: ScopeLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatibility_level: Option<i32>,
}

/// A feature as seen by one scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    pub id: Uuid,
    /// Absent when the definition is missing from the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_scope: Option<ScopeLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatibility_level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_count: Option<usize>,
    /// Set when metadata could not be resolved at some live activation.
    #[serde(default)]
    pub faulty: bool,
}

impl Feature {
    /// A feature known only by id, e.g. an orphaned activation.
    pub fn bare(id: Uuid) -> Self {
        Self {
            id,
            name: None,
            declared_scope: None,
            compatibility_level: None,
            activation_count: None,
            faulty: false,
        }
    }

    pub fn from_definition(id: Uuid, definition: &FeatureDefinition) -> Self {
        Self {
            id,
            name: Some(definition.name.clone()),
            declared_scope: Some(definition.scope),
            compatibility_level: definition.compatibility_level,
            activation_count: None,
            faulty: false,
        }
    }

    pub fn name_or_id(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self.id.to_string(),
        }
    }

    /// Renders `format`, replacing `{Name}`, `{Scope}` and `{Id}`.
    pub fn summary(&self, format: &str) -> String {
        let scope = self
            .declared_scope
            .map(|s| s.to_string())
            .unwrap_or_else(|| "?".to_string());
        format
            .replace("{Name}", &self.name_or_id())
            .replace("{Scope}", &scope)
            .replace("{Id}", &self.id.to_string())
    }
}

/// The features chosen for one operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    features: Vec<Feature>,
}

impl FeatureSet {
    /// Builds a selection, keeping the first occurrence of each id.
    pub fn new(features: impl IntoIterator<Item = Feature>) -> Self {
        let mut out: Vec<Feature> = Vec::new();
        for feature in features {
            if !out.iter().any(|f| f.id == feature.id) {
                out.push(feature);
            }
        }
        Self { features: out }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.features.iter().map(|f| f.id).collect()
    }

    /// Broadest declared scope among members that have one.
    pub fn lowest_scope(&self) -> Option<ScopeLevel> {
        self.features.iter().filter_map(|f| f.declared_scope).min()
    }

    /// Narrowest declared scope among members that have one.
    pub fn deepest_scope(&self) -> Option<ScopeLevel> {
        self.features.iter().filter_map(|f| f.declared_scope).max()
    }

    pub fn unscoped(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter().filter(|f| f.declared_scope.is_none())
    }

    pub fn at_scope(&self, scope: ScopeLevel) -> impl Iterator<Item = &Feature> {
        self.features
            .iter()
            .filter(move |f| f.declared_scope == Some(scope))
    }

    pub fn summaries(&self, format: &str) -> String {
        self.features.iter().map(|f| f.summary(format)).collect()
    }
}

impl<'a> IntoIterator for &'a FeatureSet {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Activate,
    Deactivate,
}

impl Action {
    pub fn verb_now(&self) -> &'static str {
        match self {
            Action::Activate => "activate",
            Action::Deactivate => "deactivate",
        }
    }

    pub fn verb_past(&self) -> &'static str {
        match self {
            Action::Activate => "activated",
            Action::Deactivate => "deactivated",
        }
    }
}

/// A node-level failure recorded during a traversal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeFailure {
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_id: Option<Uuid>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Info,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub location: Location,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

/// Cumulative result of one mutating traversal.
///
/// For activation `succeeded + failures.len() == attempted`; removal adds
/// `already_absent` to the left-hand side.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OperationOutcome {
    pub attempted: usize,
    pub succeeded: usize,
    #[serde(default)]
    pub already_absent: usize,
    pub failures: Vec<NodeFailure>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub cancelled: bool,
}

impl OperationOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    pub fn infos(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|e| e.kind == EventKind::Info)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|e| e.kind == EventKind::Error)
    }
}
