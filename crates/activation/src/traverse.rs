// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: SCOPED_TRAVERSAL

use crate::events::{CancelToken, EventSink};
use crate::model::{Event, EventKind, Location, NodeFailure, OperationOutcome, ScopeLevel};
use crate::provider::HierarchyProvider;
use std::collections::HashSet;
use uuid::Uuid;

/// Bookkeeping for one mutating traversal: forwards events to the caller's
/// sink and accumulates the outcome.
pub(crate) struct Run<'s> {
    outcome: OperationOutcome,
    sink: &'s mut dyn EventSink,
    cancel: Option<CancelToken>,
    // Nodes whose children could not be listed, reported once per run.
    unlistable: HashSet<Uuid>,
}

impl<'s> Run<'s> {
    pub(crate) fn new(sink: &'s mut dyn EventSink, cancel: Option<CancelToken>) -> Self {
        Self {
            outcome: OperationOutcome::default(),
            sink,
            cancel,
            unlistable: HashSet::new(),
        }
    }

    pub(crate) fn attempt(&mut self) {
        self.outcome.attempted += 1;
    }

    pub(crate) fn succeed(&mut self, location: &Location, description: String) {
        self.outcome.succeeded += 1;
        self.info(location, description);
    }

    pub(crate) fn succeeded(&self) -> usize {
        self.outcome.succeeded
    }

    pub(crate) fn absent(&mut self) {
        self.outcome.already_absent += 1;
    }

    pub(crate) fn info(&mut self, location: &Location, description: String) {
        self.sink.info(location, &description);
        self.outcome.events.push(Event {
            kind: EventKind::Info,
            location: location.clone(),
            description,
            cause: None,
        });
    }

    pub(crate) fn fail(
        &mut self,
        location: &Location,
        feature_id: Option<Uuid>,
        cause: &str,
        description: String,
    ) {
        log::debug!("{} at {}: {}", description, location, cause);
        self.sink.error(location, cause, &description);
        self.outcome.failures.push(NodeFailure {
            location: location.clone(),
            feature_id,
            message: format!("{}: {}", description, cause),
        });
        self.outcome.events.push(Event {
            kind: EventKind::Error,
            location: location.clone(),
            description,
            cause: Some(cause.to_string()),
        });
    }

    pub(crate) fn is_cancelled(&mut self) -> bool {
        if self.outcome.cancelled {
            return true;
        }
        if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            log::warn!("Traversal cancelled; returning partial outcome");
            self.outcome.cancelled = true;
        }
        self.outcome.cancelled
    }

    pub(crate) fn finish(self) -> OperationOutcome {
        self.outcome
    }
}

/// The root node to walk from. An absent or empty start means the farm.
pub(crate) fn resolve_start<P: HierarchyProvider + ?Sized>(
    provider: &P,
    start: Option<&Location>,
) -> Location {
    match start {
        Some(loc) if !loc.is_empty() => loc.clone(),
        _ => provider.farm(),
    }
}

/// Depth-first, pre-order walk from `node` that stops descending once `depth`
/// is reached. A node whose children cannot be listed counts as one attempted,
/// failed visit per run, even when several passes walk it; its siblings are
/// still walked.
pub(crate) fn descend<P, F>(
    provider: &P,
    node: &Location,
    depth: ScopeLevel,
    run: &mut Run<'_>,
    visit: &mut F,
) where
    P: HierarchyProvider + ?Sized,
    F: FnMut(&Location, &mut Run<'_>),
{
    if run.is_cancelled() {
        return;
    }
    visit(node, run);
    if node.kind >= depth {
        return;
    }
    match provider.list_children(node) {
        Ok(children) => {
            for child in children.iter().filter(|c| !c.is_empty()) {
                descend(provider, child, depth, run, visit);
            }
        }
        Err(_) if run.unlistable.contains(&node.id) => {}
        Err(e) => {
            run.unlistable.insert(node.id);
            run.attempt();
            run.fail(
                node,
                None,
                &e.to_string(),
                format!("Enumerating children of {}", node),
            );
        }
    }
}
