// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP surface and process wiring for the dockup deploy agent.

pub mod api;
pub mod error;
pub mod reload;
pub mod routes;
pub mod version;

pub use api::{create_app_state, create_router, AppState};
pub use error::ServerError;
pub use reload::{ReloadSummary, Reloader};
