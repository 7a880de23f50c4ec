// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub App helpers exposed to the deploy tooling.

use axum::{
	body::Bytes,
	extract::{Query, State},
	http::{header, StatusCode},
	response::IntoResponse,
	Json,
};
use dockup_deploy::events;
use dockup_github_app::HookOutcome;
use serde::Deserialize;
use serde_json::json;

use crate::{api::AppState, error::ServerError};

#[derive(Debug, Deserialize)]
pub struct TokenUrlParams {
	pub repo: Option<String>,
}

/// GET /github/token-url?repo=<remote url>
///
/// Returns the remote URL with an installation token embedded, for cloning
/// a private repo on this host.
pub async fn token_url(
	State(state): State<AppState>,
	Query(params): Query<TokenUrlParams>,
) -> Result<impl IntoResponse, ServerError> {
	let repo = params
		.repo
		.filter(|r| !r.is_empty())
		.ok_or_else(|| ServerError::BadRequest("Missing ?repo= parameter".to_string()))?;

	if !state.broker.is_configured().await {
		return Err(ServerError::github_app_not_configured());
	}

	let url = state
		.broker
		.get_github_token_url(&repo)
		.await
		.map_err(|e| ServerError::from_github("Failed to get token URL", e))?;

	Ok((
		[(header::CONTENT_TYPE, "text/plain")],
		url.expose().clone(),
	))
}

#[derive(Debug, Default, Deserialize)]
struct CreateWebhookRequest {
	#[serde(default)]
	repo: String,
	#[serde(default)]
	url: String,
	#[serde(default)]
	secret: String,
}

/// POST /github/create-webhook
pub async fn create_webhook(
	State(state): State<AppState>,
	body: Bytes,
) -> Result<impl IntoResponse, ServerError> {
	let request: CreateWebhookRequest =
		serde_json::from_slice(&body).map_err(|_| ServerError::BadRequest("Invalid JSON".to_string()))?;

	if request.repo.is_empty() || request.url.is_empty() || request.secret.is_empty() {
		return Err(ServerError::BadRequest(
			"Missing required fields: repo, url, secret".to_string(),
		));
	}

	if !state.broker.is_configured().await {
		return Err(ServerError::github_app_not_configured());
	}

	let outcome = state
		.broker
		.ensure_push_webhook(&request.repo, &request.url, &request.secret)
		.await
		.map_err(|e| ServerError::from_github("Failed to create webhook", e))?;

	state.metrics.emit(
		events::WEBHOOK_CREATED,
		"",
		json!({
			"repo_name": request.repo,
			"webhook_id": outcome.id(),
			"webhook_type": "github",
		}),
	);

	let status = match outcome {
		HookOutcome::Created { .. } => StatusCode::CREATED,
		HookOutcome::Exists { .. } => StatusCode::OK,
	};
	Ok((status, Json(outcome)))
}
