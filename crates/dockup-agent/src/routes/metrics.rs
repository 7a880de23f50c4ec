// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{body::Bytes, extract::State};
use serde::Deserialize;
use serde_json::Value;

use crate::{api::AppState, error::ServerError};

#[derive(Debug, Deserialize)]
struct TrackRequest {
	#[serde(default)]
	event_type: String,
	#[serde(default)]
	app_name: String,
	#[serde(default)]
	data: Value,
}

/// POST /metrics/track
///
/// Relays an event from the deploy tooling through this host's metrics
/// target, so it carries the same VPS id.
pub async fn track(State(state): State<AppState>, body: Bytes) -> Result<&'static str, ServerError> {
	let request: TrackRequest =
		serde_json::from_slice(&body).map_err(|_| ServerError::BadRequest("Invalid JSON".to_string()))?;

	if request.event_type.is_empty() {
		return Err(ServerError::BadRequest("Missing event_type".to_string()));
	}

	state
		.metrics
		.emit(&request.event_type, &request.app_name, request.data);
	Ok("Metric tracked")
}
