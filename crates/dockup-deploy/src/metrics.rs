// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fire-and-forget telemetry.

use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use dockup_config::MetricsTarget;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Event names sent to the metrics endpoint.
pub mod events {
	pub const DEPLOYMENT_STARTED: &str = "deployment_started";
	pub const DEPLOYMENT_SUCCESS: &str = "deployment_success";
	pub const DEPLOYMENT_FAILURE: &str = "deployment_failure";
	pub const DEPLOYMENT_SKIPPED: &str = "deployment_skipped";
	pub const WEBHOOK_RECEIVED: &str = "webhook_received";
	pub const WEBHOOK_CREATED: &str = "webhook_created";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricEvent {
	pub event_type: String,
	pub timestamp: String,
	pub app_name: String,
	pub data: Value,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub vps_id: Option<String>,
}

impl MetricEvent {
	pub fn new(event_type: &str, app_name: &str, data: Value, vps_id: Option<String>) -> Self {
		Self {
			event_type: event_type.to_string(),
			timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
			app_name: app_name.to_string(),
			data,
			vps_id,
		}
	}
}

/// Posts [`MetricEvent`]s to the configured endpoint from background tasks.
///
/// Failures are logged and dropped. With no target configured every
/// [`MetricsSink::emit`] is a no-op.
#[derive(Clone)]
pub struct MetricsSink {
	inner: Arc<Inner>,
}

struct Inner {
	http: Client,
	target: RwLock<Option<Arc<MetricsTarget>>>,
}

impl MetricsSink {
	pub fn new(timeout: Duration) -> reqwest::Result<Self> {
		Ok(Self::with_client(dockup_common_http::new_client_with_timeout(
			timeout,
		)?))
	}

	pub fn with_client(http: Client) -> Self {
		Self {
			inner: Arc::new(Inner {
				http,
				target: RwLock::new(None),
			}),
		}
	}

	pub async fn replace_target(&self, target: Option<MetricsTarget>) {
		match &target {
			Some(t) => debug!(url = %t.webhook_url, vps_id = ?t.vps_id, "metrics enabled"),
			None => debug!("metrics disabled"),
		}
		*self.inner.target.write().await = target.map(Arc::new);
	}

	pub async fn is_enabled(&self) -> bool {
		self.inner.target.read().await.is_some()
	}

	/// Send one event in the background. The handle only matters to tests.
	pub fn emit(&self, event_type: &str, app_name: &str, data: Value) -> JoinHandle<()> {
		let inner = self.inner.clone();
		let event_type = event_type.to_string();
		let app_name = app_name.to_string();

		tokio::spawn(async move {
			let Some(target) = inner.target.read().await.clone() else {
				return;
			};
			let event = MetricEvent::new(&event_type, &app_name, data, target.vps_id.clone());
			inner.send(&target, &event).await;
		})
	}
}

impl Inner {
	async fn send(&self, target: &MetricsTarget, event: &MetricEvent) {
		let response = match self.http.post(target.webhook_url.clone()).json(event).send().await {
			Ok(response) => response,
			Err(e) => {
				warn!(event_type = %event.event_type, error = %e, "failed to send metric");
				return;
			}
		};

		let status = response.status();
		if status.is_success() {
			debug!(event_type = %event.event_type, app = %event.app_name, "metric sent");
		} else {
			let body = response.text().await.unwrap_or_default();
			warn!(
				event_type = %event.event_type,
				status = status.as_u16(),
				body = %body,
				"metrics endpoint rejected event"
			);
		}
	}
}
