// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: FEATUREADMIN

pub mod admin_tools;
pub mod config;
pub mod log_sink;

pub use activation;
pub use farm;
