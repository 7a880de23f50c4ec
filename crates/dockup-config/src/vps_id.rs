// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Host fingerprint attached to every metric event.
//!
//! Format: `<os>-<ram_gb>gb-<location>`, for example `ubuntu-4gb-fsn1-dc14`.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, instrument};

const METADATA_BASE: &str = "http://169.254.169.254";
const METADATA_TIMEOUT: Duration = Duration::from_secs(2);

/// Cloud metadata paths, tried in order until one answers.
const LOCATION_PATHS: &[(&str, &str)] = &[
	("hetzner", "hetzner/v1/metadata/datacenter"),
	("digitalocean", "metadata/v1/region"),
	("aws", "latest/meta-data/placement/availability-zone"),
];

/// Hostname fragments that identify a datacenter location.
const LOCATION_HINTS: &[&str] = &["fsn", "nyc", "fra"];

/// Where [`VpsIdProbe::generate`] looks for host facts.
#[derive(Debug, Clone)]
pub struct VpsIdProbe {
	pub os_release: PathBuf,
	pub meminfo: PathBuf,
	pub hostname: PathBuf,
	/// Link-local metadata service; overridden in tests.
	pub metadata_base: String,
	pub metadata_timeout: Duration,
}

impl Default for VpsIdProbe {
	fn default() -> Self {
		Self {
			os_release: PathBuf::from("/etc/os-release"),
			meminfo: PathBuf::from("/proc/meminfo"),
			hostname: PathBuf::from("/proc/sys/kernel/hostname"),
			metadata_base: METADATA_BASE.to_string(),
			metadata_timeout: METADATA_TIMEOUT,
		}
	}
}

impl VpsIdProbe {
	#[instrument(skip(self))]
	pub async fn generate(&self) -> String {
		let os = self.os_name().await;
		let ram = tokio::fs::read_to_string(&self.meminfo)
			.await
			.ok()
			.and_then(|content| parse_mem_total_gb(&content))
			.map(|gb| gb.to_string())
			.unwrap_or_else(|| "unknown".to_string());
		let location = match self.metadata_location().await {
			Some(location) => location,
			None => {
				let hostname = tokio::fs::read_to_string(&self.hostname)
					.await
					.unwrap_or_default();
				location_from_hostname(hostname.trim())
			}
		};

		let id = format!("{os}-{ram}gb-{location}");
		debug!(vps_id = %id, "generated vps id");
		id
	}

	async fn os_name(&self) -> String {
		match tokio::fs::read_to_string(&self.os_release).await {
			Ok(content) => parse_os_release_id(&content).unwrap_or_else(|| "unknown".to_string()),
			Err(_) => tokio::process::Command::new("uname")
				.arg("-s")
				.output()
				.await
				.ok()
				.filter(|out| out.status.success())
				.map(|out| String::from_utf8_lossy(&out.stdout).trim().to_lowercase())
				.filter(|s| !s.is_empty())
				.unwrap_or_else(|| "unknown".to_string()),
		}
	}

	async fn metadata_location(&self) -> Option<String> {
		let client = dockup_common_http::new_client_with_timeout(self.metadata_timeout).ok()?;

		for (provider, path) in LOCATION_PATHS {
			let url = format!("{}/{path}", self.metadata_base.trim_end_matches('/'));
			let response = match client.get(url).send().await {
				Ok(response) if response.status().is_success() => response,
				Ok(response) => {
					debug!(provider, status = %response.status(), "metadata endpoint declined");
					continue;
				}
				Err(e) => {
					debug!(provider, error = %e, "metadata endpoint unreachable");
					continue;
				}
			};
			if let Ok(body) = response.text().await {
				let location = body.trim().to_lowercase();
				if !location.is_empty() {
					return Some(location);
				}
			}
		}

		None
	}
}

/// Lower-cased `ID=` value from an os-release document.
pub fn parse_os_release_id(content: &str) -> Option<String> {
	content
		.lines()
		.find_map(|line| line.strip_prefix("ID="))
		.map(|v| v.trim().trim_matches('"').to_lowercase())
		.filter(|v| !v.is_empty())
}

/// `MemTotal` from a meminfo document, in GiB rounded up.
pub fn parse_mem_total_gb(content: &str) -> Option<u64> {
	let line = content.lines().find(|l| l.starts_with("MemTotal:"))?;
	let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
	if kb == 0 {
		return None;
	}
	const KB_PER_GB: u64 = 1024 * 1024;
	Some(kb.div_ceil(KB_PER_GB))
}

pub fn location_from_hostname(hostname: &str) -> String {
	let hostname = hostname.to_lowercase();
	if LOCATION_HINTS.iter().any(|hint| hostname.contains(hint)) {
		hostname.chars().take(4).collect()
	} else {
		"vps".to_string()
	}
}
