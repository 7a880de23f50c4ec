// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deploy triggers: GitHub push webhooks and manual requests.

use axum::{
	body::Bytes,
	extract::{Query, State},
	http::{header, HeaderMap},
};
use dockup_common_webhook::constant_time_eq;
use dockup_deploy::{events, TriggerOutcome, TriggerSource};
use dockup_github_app::verify_signature;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{api::AppState, error::ServerError};

pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

#[derive(Debug, Default, Deserialize)]
struct PushEvent {
	#[serde(default, rename = "ref")]
	git_ref: String,
	#[serde(default)]
	repository: RepositoryRef,
}

#[derive(Debug, Default, Deserialize)]
struct RepositoryRef {
	#[serde(default)]
	name: String,
}

#[derive(Debug, Deserialize)]
pub struct ManualParams {
	pub app: Option<String>,
}

fn header_str<'a>(headers: &'a HeaderMap, name: impl header::AsHeaderName) -> &'a str {
	headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("")
}

/// POST /webhook/github
pub async fn github_push(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<&'static str, ServerError> {
	let event: PushEvent =
		serde_json::from_slice(&body).map_err(|_| ServerError::BadRequest("Invalid JSON".to_string()))?;
	let app_name = event.repository.name;

	let registration = state.registry.lookup(&app_name).await.map_err(|_| {
		warn!(repo = %app_name, "webhook for unknown repo");
		ServerError::NotFound("Repo not registered".to_string())
	})?;

	let signature = header_str(&headers, SIGNATURE_HEADER);
	if !verify_signature(&body, registration.secret.expose(), signature) {
		warn!(app = %app_name, "invalid webhook signature");
		return Err(ServerError::Forbidden("Forbidden".to_string()));
	}

	let expected_ref = format!("refs/heads/{}", registration.branch);
	if event.git_ref != expected_ref {
		info!(app = %app_name, git_ref = %event.git_ref, branch = %registration.branch, "ignored push");
		return Ok("Ignored branch");
	}

	let outcome = state.coordinator.trigger(registration, TriggerSource::Github);
	state.metrics.emit(
		events::WEBHOOK_RECEIVED,
		&app_name,
		json!({ "webhook_type": TriggerSource::Github.as_str() }),
	);

	Ok(match outcome {
		TriggerOutcome::Scheduled(_) => "Deploy triggered",
		TriggerOutcome::Skipped => "Deploy already in progress",
	})
}

/// GET|POST /webhook/manual?app=<name>
pub async fn manual_trigger(
	State(state): State<AppState>,
	Query(params): Query<ManualParams>,
	headers: HeaderMap,
) -> Result<&'static str, ServerError> {
	let app_name = params
		.app
		.filter(|a| !a.is_empty())
		.ok_or_else(|| ServerError::BadRequest("Missing ?app= parameter".to_string()))?;

	let registration = state
		.registry
		.lookup(&app_name)
		.await
		.map_err(|_| ServerError::NotFound("App not found".to_string()))?;

	let expected = format!("Bearer {}", registration.secret.expose());
	let provided = header_str(&headers, header::AUTHORIZATION);
	if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
		warn!(app = %app_name, "manual trigger with bad credentials");
		return Err(ServerError::Unauthorized("Unauthorized".to_string()));
	}

	let outcome = state.coordinator.trigger(registration, TriggerSource::Manual);
	state.metrics.emit(
		events::WEBHOOK_RECEIVED,
		&app_name,
		json!({ "webhook_type": TriggerSource::Manual.as_str() }),
	);

	Ok(match outcome {
		TriggerOutcome::Scheduled(_) => "Manual deploy triggered",
		TriggerOutcome::Skipped => "Deploy already in progress",
	})
}
