// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: FORCE_REMOVER

use crate::error::AdminError;
use crate::events::{CancelToken, EventSink};
use crate::gate::ScopeGate;
use crate::model::{Location, OperationOutcome, ScopeLevel};
use crate::provider::{HierarchyProvider, RemoveStatus};
use crate::traverse::{Run, descend, resolve_start};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Deletes activation records outright, whether or not the feature
/// definition still exists. Used to clean up faulty features.
pub struct ForceRemover<'a, P: ?Sized> {
    provider: &'a P,
    gate: ScopeGate,
    cancel: Option<CancelToken>,
}

impl<'a, P> ForceRemover<'a, P>
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

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Removes `site_features` from every site collection and `web_features`
    /// from every web under `start`. The site set is processed completely
    /// before the web set; a node whose children cannot be listed is reported
    /// once even though both passes reach it.
    pub fn remove(
        &self,
        site_features: &BTreeSet<Uuid>,
        web_features: &BTreeSet<Uuid>,
        start: Option<&Location>,
        sink: &mut dyn EventSink,
    ) -> Result<OperationOutcome, AdminError> {
        let root = resolve_start(self.provider, start);
        self.gate
            .validate_removal(site_features, web_features, root.kind)?;

        log::info!(
            "Removing {} site and {} web feature(s) starting from {}",
            site_features.len(),
            web_features.len(),
            root
        );

        let mut run = Run::new(sink, self.cancel.clone());
        for (scope, features) in [
            (ScopeLevel::SiteCollection, site_features),
            (ScopeLevel::Web, web_features),
        ] {
            if features.is_empty() {
                continue;
            }
            descend(
                self.provider,
                &root,
                scope,
                &mut run,
                &mut |node: &Location, run: &mut Run<'_>| {
                    if node.kind == scope {
                        self.remove_at(node, features.iter().copied(), run);
                    }
                },
            );
        }

        let outcome = run.finish();
        log::info!(
            "{} activation(s) removed, {} already absent, {} failed",
            outcome.succeeded,
            outcome.already_absent,
            outcome.failures.len()
        );
        Ok(outcome)
    }

    /// Removes one feature from every node of `scope` across the farm.
    ///
    /// Reports per web application how many records were removed and how many
    /// nodes were scanned, then the farm totals.
    pub fn remove_everywhere(
        &self,
        feature_id: Uuid,
        scope: ScopeLevel,
        sink: &mut dyn EventSink,
    ) -> OperationOutcome {
        let farm = self.provider.farm();
        let mut run = Run::new(sink, self.cancel.clone());

        if scope == ScopeLevel::Farm {
            self.remove_at(&farm, [feature_id], &mut run);
            return run.finish();
        }

        let web_apps = match self.provider.list_children(&farm) {
            Ok(children) => children,
            Err(e) => {
                run.attempt();
                run.fail(
                    &farm,
                    Some(feature_id),
                    &e.to_string(),
                    format!("Enumerating web applications of {}", farm),
                );
                return run.finish();
            }
        };

        let mut farm_removed = 0;
        let mut farm_scanned = 0;
        for web_app in web_apps.iter().filter(|w| !w.is_empty()) {
            let before = run.succeeded();
            let mut scanned = 0;
            descend(
                self.provider,
                web_app,
                scope,
                &mut run,
                &mut |node: &Location, run: &mut Run<'_>| {
                    if node.kind == scope {
                        scanned += 1;
                        self.remove_at(node, [feature_id], run);
                    }
                },
            );
            let removed = run.succeeded() - before;
            log::info!(
                "{} feature(s) removed in {}, {} {} node(s) scanned",
                removed,
                web_app,
                scanned,
                scope
            );
            farm_removed += removed;
            farm_scanned += scanned;
            if run.is_cancelled() {
                break;
            }
        }

        log::info!(
            "{} feature(s) removed in farm, {} {} node(s) scanned",
            farm_removed,
            farm_scanned,
            scope
        );
        run.finish()
    }

    fn remove_at(
        &self,
        node: &Location,
        features: impl IntoIterator<Item = Uuid>,
        run: &mut Run<'_>,
    ) {
        for feature_id in features {
            run.attempt();
            match self.provider.remove_activation(node, feature_id, true) {
                Ok(RemoveStatus::Removed) => {
                    run.succeed(node, format!("Removed feature {}", feature_id))
                }
                Ok(RemoveStatus::Absent) => run.absent(),
                Err(e) => run.fail(
                    node,
                    Some(feature_id),
                    &e.to_string(),
                    format!("Removing feature {}", feature_id),
                ),
            }
        }
    }
}
