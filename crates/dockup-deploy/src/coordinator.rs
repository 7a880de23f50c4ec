// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-app deploy serialization.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use dockup_config::AppRegistration;
use serde_json::json;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};

use crate::error::DeployError;
use crate::metrics::{events, MetricsSink};
use crate::pipeline::CommandPipeline;

/// Minutes of manual work a successful deploy is counted as saving.
pub const MINUTES_SAVED_PER_DEPLOY: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerSource {
	Github,
	Manual,
}

impl TriggerSource {
	pub fn as_str(&self) -> &'static str {
		match self {
			TriggerSource::Github => "github",
			TriggerSource::Manual => "manual",
		}
	}
}

impl fmt::Display for TriggerSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
	Succeeded { duration: Duration },
	Failed { duration: Duration, error: String },
}

#[derive(Debug)]
pub enum TriggerOutcome {
	/// The lock was free; the deploy runs in the returned task.
	Scheduled(JoinHandle<DeployOutcome>),
	/// Another deploy of the same app holds the lock. Nothing was queued.
	Skipped,
}

impl TriggerOutcome {
	pub fn is_scheduled(&self) -> bool {
		matches!(self, TriggerOutcome::Scheduled(_))
	}
}

/// Runs at most one deploy per app at a time and drops triggers that
/// arrive while one is running.
pub struct DeployCoordinator {
	// Entries are created on first use and never removed.
	locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
	pipeline: CommandPipeline,
	metrics: MetricsSink,
	timeout: Option<Duration>,
}

impl DeployCoordinator {
	pub fn new(pipeline: CommandPipeline, metrics: MetricsSink, timeout: Option<Duration>) -> Self {
		Self {
			locks: Mutex::new(HashMap::new()),
			pipeline,
			metrics,
			timeout,
		}
	}

	fn lock_for(&self, app_name: &str) -> Arc<AsyncMutex<()>> {
		self
			.locks
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.entry(app_name.to_string())
			.or_default()
			.clone()
	}

	/// Schedule a deploy of `registration` without waiting for it.
	///
	/// The lock is taken before this returns, so a second call for the same
	/// app made right after a `Scheduled` result is always `Skipped`.
	pub fn trigger(&self, registration: Arc<AppRegistration>, source: TriggerSource) -> TriggerOutcome {
		let app_name = registration.name.clone();
		let Ok(guard) = self.lock_for(&app_name).try_lock_owned() else {
			warn!(app = %app_name, source = %source, "deploy already in progress, skipping");
			self.metrics.emit(
				events::DEPLOYMENT_SKIPPED,
				&app_name,
				json!({ "deployment_type": source.as_str() }),
			);
			return TriggerOutcome::Skipped;
		};

		let pipeline = self.pipeline.clone();
		let metrics = self.metrics.clone();
		let timeout = self.timeout;
		let span = info_span!("deploy", app = %app_name, source = %source);

		let handle = tokio::spawn(
			async move {
				// Held until the task ends, whatever the outcome.
				let _guard = guard;
				run_deploy(&pipeline, &metrics, &registration, source, timeout).await
			}
			.instrument(span),
		);
		TriggerOutcome::Scheduled(handle)
	}
}

async fn run_deploy(
	pipeline: &CommandPipeline,
	metrics: &MetricsSink,
	registration: &AppRegistration,
	source: TriggerSource,
	timeout: Option<Duration>,
) -> DeployOutcome {
	let app_name = registration.name.as_str();
	metrics.emit(
		events::DEPLOYMENT_STARTED,
		app_name,
		json!({ "deployment_type": source.as_str() }),
	);
	info!("starting deploy");

	let started = Instant::now();
	let result = match timeout {
		Some(limit) => tokio::time::timeout(limit, pipeline.run(registration))
			.await
			.unwrap_or(Err(DeployError::Timeout(limit))),
		None => pipeline.run(registration).await,
	};
	let duration = started.elapsed();

	match result {
		Ok(_) => {
			info!(duration_secs = duration.as_secs(), "deploy succeeded");
			metrics.emit(
				events::DEPLOYMENT_SUCCESS,
				app_name,
				json!({
					"deployment_type": source.as_str(),
					"duration_seconds": duration.as_secs(),
					"minutes_saved": MINUTES_SAVED_PER_DEPLOY,
				}),
			);
			DeployOutcome::Succeeded { duration }
		}
		Err(e) => {
			let report = e.report();
			error!(duration_secs = duration.as_secs(), error = %e, output = %report, "deploy failed");
			metrics.emit(
				events::DEPLOYMENT_FAILURE,
				app_name,
				json!({
					"deployment_type": source.as_str(),
					"duration_seconds": duration.as_secs(),
					"error_message": report,
				}),
			);
			DeployOutcome::Failed {
				duration,
				error: report,
			}
		}
	}
}
