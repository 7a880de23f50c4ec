// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared handle on the current registry snapshot.

use std::sync::Arc;

use dockup_config::{AppRegistration, Registry};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{DeployError, Result};

/// Readers get an `Arc` of the registration itself, so a reload never
/// changes the configuration of a deploy that is already running.
pub struct RegistryStore {
	current: RwLock<Arc<Registry>>,
}

impl RegistryStore {
	pub fn new(registry: Registry) -> Self {
		Self {
			current: RwLock::new(Arc::new(registry)),
		}
	}

	pub async fn lookup(&self, app_name: &str) -> Result<Arc<AppRegistration>> {
		self
			.current
			.read()
			.await
			.get(app_name)
			.ok_or_else(|| DeployError::UnknownApp(app_name.to_string()))
	}

	/// Atomically swap in a new snapshot.
	pub async fn replace(&self, registry: Registry) {
		let apps = registry.len();
		*self.current.write().await = Arc::new(registry);
		info!(apps, "registry replaced");
	}

	pub async fn len(&self) -> usize {
		self.current.read().await.len()
	}
}
