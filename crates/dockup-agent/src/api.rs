// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared handler state and the router.

use std::sync::Arc;

use anyhow::Context;
use axum::{
	extract::DefaultBodyLimit,
	routing::{get, post},
	Router,
};
use dockup_config::{AgentConfig, Registry};
use dockup_deploy::{CommandPipeline, CommandRunner, DeployCoordinator, MetricsSink, RegistryStore};
use dockup_github_app::CredentialBroker;
use tower_http::trace::TraceLayer;

use crate::reload::Reloader;
use crate::routes;

/// GitHub caps webhook payloads at 25 MB.
pub const MAX_WEBHOOK_BODY_BYTES: usize = 25 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
	pub registry: Arc<RegistryStore>,
	pub broker: Arc<CredentialBroker>,
	pub coordinator: Arc<DeployCoordinator>,
	pub metrics: MetricsSink,
	pub reloader: Arc<Reloader>,
}

/// Wire up every component and perform the initial load of all snapshots.
///
/// Fails when the registry cannot be loaded; the GitHub App credential and
/// the metrics target are optional.
pub async fn create_app_state(
	config: &AgentConfig,
	runner: Arc<dyn CommandRunner>,
) -> anyhow::Result<AppState> {
	let broker = Arc::new(
		CredentialBroker::new(config.github.api_base_url.clone())
			.context("failed to create GitHub API client")?,
	);
	let metrics = MetricsSink::new(config.deploy.metrics_timeout())
		.context("failed to create metrics HTTP client")?;
	let registry = Arc::new(RegistryStore::new(Registry::default()));

	let pipeline = CommandPipeline::new(runner, broker.clone());
	let coordinator = Arc::new(DeployCoordinator::new(
		pipeline,
		metrics.clone(),
		config.deploy.timeout(),
	));

	let reloader = Reloader::new(
		config.paths.clone(),
		registry.clone(),
		broker.clone(),
		metrics.clone(),
	);
	reloader.reload_all().await.with_context(|| {
		format!(
			"failed to load registry; check that {} exists and contains valid JSON",
			config.paths.registry_file.display()
		)
	})?;

	Ok(AppState {
		registry,
		broker,
		coordinator,
		metrics,
		reloader: Arc::new(reloader),
	})
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health_check))
		.route(
			"/webhook/github",
			post(routes::webhooks::github_push).layer(DefaultBodyLimit::max(MAX_WEBHOOK_BODY_BYTES)),
		)
		.route(
			"/webhook/manual",
			get(routes::webhooks::manual_trigger).post(routes::webhooks::manual_trigger),
		)
		.route("/reload", post(routes::reload::reload))
		.route("/github/token-url", get(routes::github::token_url))
		.route("/github/create-webhook", post(routes::github::create_webhook))
		.route("/metrics/track", post(routes::metrics::track))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}
