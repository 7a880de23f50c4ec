// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The metrics target snapshot.
//!
//! `metrics.json` names the webhook that receives metric events and the VPS
//! id stamped on each of them. Older installs wrote the URL under
//! `n8n_webhook_url`, which is still accepted.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::error::{ConfigError, Result};
use crate::vps_id::VpsIdProbe;

/// Supplies the webhook URL when the metrics file does not.
pub const METRICS_URL_ENV: &str = "DOCKUP_METRICS_URL";

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsTarget {
	pub webhook_url: Url,
	pub vps_id: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MetricsFile {
	#[serde(default, alias = "n8n_webhook_url", skip_serializing_if = "Option::is_none")]
	webhook_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	vps_id: Option<String>,
}

/// Resolve the metrics target.
///
/// Returns `Ok(None)` when no URL is configured anywhere, which disables
/// metrics. A missing VPS id is generated and written back to `path`; failing
/// to persist it only logs.
pub async fn load_metrics_target(
	path: &Path,
	env_url: Option<String>,
	probe: &VpsIdProbe,
) -> Result<Option<MetricsTarget>> {
	let file = match tokio::fs::read_to_string(path).await {
		Ok(content) => {
			serde_json::from_str::<MetricsFile>(&content).map_err(|e| ConfigError::JsonParse {
				path: path.to_path_buf(),
				source: e,
			})?
		}
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => MetricsFile::default(),
		Err(e) => {
			return Err(ConfigError::FileRead {
				path: path.to_path_buf(),
				source: e,
			})
		}
	};

	let Some(raw_url) = file
		.webhook_url
		.clone()
		.filter(|u| !u.trim().is_empty())
		.or_else(|| env_url.filter(|u| !u.trim().is_empty()))
	else {
		return Ok(None);
	};

	let webhook_url = Url::parse(raw_url.trim()).map_err(|e| ConfigError::InvalidValue {
		key: "metrics.webhook_url".to_string(),
		message: format!("'{raw_url}' is not a valid URL: {e}"),
	})?;
	if !matches!(webhook_url.scheme(), "http" | "https") {
		return Err(ConfigError::InvalidValue {
			key: "metrics.webhook_url".to_string(),
			message: format!("unsupported scheme '{}'", webhook_url.scheme()),
		});
	}

	let vps_id = match file.vps_id.clone().filter(|id| !id.trim().is_empty()) {
		Some(id) => id,
		None => {
			let id = probe.generate().await;
			let updated = MetricsFile {
				webhook_url: file.webhook_url.clone(),
				vps_id: Some(id.clone()),
			};
			match persist(path, &updated) {
				Ok(()) => info!(vps_id = %id, path = %path.display(), "saved generated vps id"),
				Err(e) => warn!(error = %e, "could not persist generated vps id"),
			}
			id
		}
	};

	Ok(Some(MetricsTarget {
		webhook_url,
		vps_id: Some(vps_id),
	}))
}

fn persist(path: &Path, file: &MetricsFile) -> Result<()> {
	let write_err = |e: std::io::Error| ConfigError::FileWrite {
		path: path.to_path_buf(),
		source: e,
	};

	let json = serde_json::to_vec_pretty(file).map_err(|e| ConfigError::JsonParse {
		path: path.to_path_buf(),
		source: e,
	})?;

	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).map_err(write_err)?;
	}

	let mut options = std::fs::OpenOptions::new();
	options.write(true).create(true).truncate(true);
	#[cfg(unix)]
	{
		use std::os::unix::fs::OpenOptionsExt;
		options.mode(0o600);
	}

	let mut out = options.open(path).map_err(write_err)?;
	// `mode` only applies on create; tighten a pre-existing file too.
	#[cfg(unix)]
	{
		use std::os::unix::fs::PermissionsExt;
		out
			.set_permissions(std::fs::Permissions::from_mode(0o600))
			.map_err(write_err)?;
	}
	out.write_all(&json).map_err(write_err)?;
	Ok(())
}
