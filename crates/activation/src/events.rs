// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: ACTIVATION_EVENTS

use crate::model::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Receives traversal events as they happen.
///
/// Info and error are separate channels; a sink may observe both within one
/// call when outcomes are mixed.
pub trait EventSink {
    fn info(&mut self, location: &Location, description: &str);
    fn error(&mut self, location: &Location, cause: &str, description: &str);
}

/// Discards everything. Events are still recorded in the returned outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn info(&mut self, _location: &Location, _description: &str) {}
    fn error(&mut self, _location: &Location, _cause: &str, _description: &str) {}
}

/// Two independently registered listeners.
pub struct Listeners<I, E>
where
    I: FnMut(&Location, &str),
    E: FnMut(&Location, &str, &str),
{
    on_info: I,
    on_error: E,
}

impl<I, E> Listeners<I, E>
where
    I: FnMut(&Location, &str),
    E: FnMut(&Location, &str, &str),
{
    pub fn new(on_info: I, on_error: E) -> Self {
        Self { on_info, on_error }
    }
}

impl<I, E> EventSink for Listeners<I, E>
where
    I: FnMut(&Location, &str),
    E: FnMut(&Location, &str, &str),
{
    fn info(&mut self, location: &Location, description: &str) {
        (self.on_info)(location, description)
    }

    fn error(&mut self, location: &Location, cause: &str, description: &str) {
        (self.on_error)(location, cause, description)
    }
}

/// Cooperative cancellation, checked between node visits.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScopeLevel;
    use uuid::Uuid;

    #[test]
    fn test_listeners_keep_channels_apart() {
        let mut infos = Vec::new();
        let mut errors = Vec::new();
        let loc = Location::new(Uuid::new_v4(), "http://x", "X", ScopeLevel::Web);
        {
            let mut sink = Listeners::new(
                |l: &Location, d: &str| infos.push(format!("{} at {}", d, l)),
                |_l: &Location, c: &str, d: &str| errors.push(format!("{}: {}", d, c)),
            );
            sink.info(&loc, "Activated");
            sink.error(&loc, "denied", "Activating");
        }
        assert_eq!(infos, vec!["Activated at Web 'X' <http://x>".to_string()]);
        assert_eq!(errors, vec!["Activating: denied".to_string()]);
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
