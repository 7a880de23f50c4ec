// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{extract::State, Json};
use dockup_common_version::BuildInfo;
use serde::Serialize;

use crate::api::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
	pub version: &'static str,
	pub git_sha: &'static str,
	pub apps: usize,
	pub github_app_configured: bool,
	pub metrics_enabled: bool,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
	let info = BuildInfo::current();
	Json(HealthResponse {
		status: "ok",
		version: info.version,
		git_sha: info.git_sha,
		apps: state.registry.len().await,
		github_app_configured: state.broker.is_configured().await,
		metrics_enabled: state.metrics.is_enabled().await,
	})
}
