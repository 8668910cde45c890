// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: ADMIN_LOG_SINK

use activation::{EventSink, Location};
use chrono::Local;

/// Forwards traversal events to the `log` facade, one line per event.
pub struct LogSink {
    timestamp_format: String,
    lines: Option<Vec<String>>,
}

impl LogSink {
    pub fn new(timestamp_format: impl Into<String>) -> Self {
        Self {
            timestamp_format: timestamp_format.into(),
            lines: None,
        }
    }

    /// Also keeps every formatted line, e.g. for a report.
    pub fn recording(mut self) -> Self {
        self.lines = Some(Vec::new());
        self
    }

    pub fn lines(&self) -> &[String] {
        self.lines.as_deref().unwrap_or(&[])
    }

    fn stamp(&self) -> String {
        Local::now().format(&self.timestamp_format).to_string()
    }

    fn keep(&mut self, line: &str) {
        if let Some(lines) = self.lines.as_mut() {
            lines.push(line.to_string());
        }
    }
}

impl EventSink for LogSink {
    fn info(&mut self, location: &Location, description: &str) {
        let line = format!("{} {} - {}", self.stamp(), description, location.describe());
        log::info!("{}", line);
        self.keep(&line);
    }

    fn error(&mut self, location: &Location, cause: &str, description: &str) {
        let line = format!(
            "{} ERROR {} - {}: {}",
            self.stamp(),
            description,
            location.describe(),
            cause
        );
        log::error!("{}", line);
        self.keep(&line);
    }
}
