// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: SCOPED_MUTATOR

use crate::error::{AdminError, ConfigurationError};
use crate::events::{CancelToken, EventSink};
use crate::gate::ScopeGate;
use crate::model::{Action, Feature, FeatureSet, Location, OperationOutcome, ScopeLevel};
use crate::provider::HierarchyProvider;
use crate::traverse::{Run, descend, resolve_start};

/// Activates or deactivates a selection across the subtree under a start node.
///
/// Each feature is applied at every node whose level equals the feature's
/// declared scope. A node where the feature is already in the requested state
/// is left alone and not counted.
pub struct ScopedMutator<'a, P: ?Sized> {
    provider: &'a P,
    gate: ScopeGate,
    cancel: Option<CancelToken>,
}

impl<'a, P> ScopedMutator<'a, P>
where
    P: HierarchyProvider + ?Sized,
{
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            gate: ScopeGate::default(),
            cancel: None,
        }
    }

    pub fn with_gate(mut self, gate: ScopeGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Validates, then walks. Node failures end up in the outcome; only a
    /// rejected request returns `Err`, and in that case nothing was touched.
    pub fn apply(
        &self,
        action: Action,
        target: ScopeLevel,
        start: Option<&Location>,
        selection: &FeatureSet,
        forceful: bool,
        sink: &mut dyn EventSink,
    ) -> Result<OperationOutcome, AdminError> {
        self.gate.validate(selection, target, action)?;

        let root = resolve_start(self.provider, start);
        if root.kind > target {
            return Err(ConfigurationError::StartBelowTarget {
                start: root.kind,
                target,
            }
            .into());
        }

        // Validation guarantees every member has a scope.
        let depth = selection.deepest_scope().unwrap_or(target);

        log::info!(
            "{} {} feature(s) at {} starting from {}{}",
            capitalize(action.verb_now()),
            selection.len(),
            target,
            root,
            if forceful { " (forced)" } else { "" }
        );

        let mut run = Run::new(sink, self.cancel.clone());
        descend(
            self.provider,
            &root,
            depth,
            &mut run,
            &mut |node: &Location, run: &mut Run<'_>| {
                let matching: Vec<&Feature> = selection.at_scope(node.kind).collect();
                if !matching.is_empty() {
                    self.apply_at(node, action, &matching, forceful, run);
                }
            },
        );

        let outcome = run.finish();
        log::info!(
            "{} feature(s) {}, {} failed, {} attempted",
            outcome.succeeded,
            action.verb_past(),
            outcome.failures.len(),
            outcome.attempted
        );
        Ok(outcome)
    }

    fn apply_at(
        &self,
        node: &Location,
        action: Action,
        features: &[&Feature],
        forceful: bool,
        run: &mut Run<'_>,
    ) {
        let active = match self.provider.list_active_feature_ids(node) {
            Ok(ids) => ids,
            Err(e) => {
                let cause = e.to_string();
                for feature in features {
                    run.attempt();
                    run.fail(
                        node,
                        Some(feature.id),
                        &cause,
                        format!("Reading features before trying to {} {}", action.verb_now(), feature.name_or_id()),
                    );
                }
                return;
            }
        };

        for feature in features {
            let is_active = active.contains(&feature.id);
            let needed = match action {
                Action::Activate => !is_active,
                Action::Deactivate => is_active,
            };
            if !needed {
                log::debug!(
                    "{} already {} at {}",
                    feature.name_or_id(),
                    action.verb_past(),
                    node
                );
                continue;
            }

            run.attempt();
            let res = match action {
                Action::Activate => self.provider.activate(node, feature.id, forceful),
                Action::Deactivate => self.provider.deactivate(node, feature.id, forceful),
            };
            match res {
                Ok(()) => run.succeed(
                    node,
                    format!(
                        "{} feature {} ({})",
                        capitalize(action.verb_past()),
                        feature.name_or_id(),
                        feature.id
                    ),
                ),
                Err(e) => run.fail(
                    node,
                    Some(feature.id),
                    &e.to_string(),
                    format!(
                        "Trying to {} feature {} ({})",
                        action.verb_now(),
                        feature.name_or_id(),
                        feature.id
                    ),
                ),
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
