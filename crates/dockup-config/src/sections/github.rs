// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub API endpoint configuration.

use std::net::IpAddr;

use serde::Deserialize;
use url::{Host, Url};

use crate::error::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GithubConfigLayer {
	#[serde(default)]
	pub api_base_url: Option<String>,
}

impl GithubConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.api_base_url.is_some() {
			self.api_base_url = other.api_base_url;
		}
	}

	pub fn finalize(self) -> Result<GithubConfig, ConfigError> {
		let raw = self
			.api_base_url
			.unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
		let api_base_url = validate_api_base_url(&raw)?;
		Ok(GithubConfig { api_base_url })
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct GithubConfig {
	pub api_base_url: Url,
}

/// The API base must be HTTPS and must not point back at this host.
fn validate_api_base_url(raw: &str) -> Result<Url, ConfigError> {
	let url = Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
		key: "github.api_base_url".to_string(),
		message: format!("'{raw}' is not a valid URL: {e}"),
	})?;

	if url.scheme() != "https" {
		return Err(ConfigError::Validation(format!(
			"github.api_base_url must use HTTPS, got: {raw}"
		)));
	}

	let loopback = match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => true,
	};
	if loopback {
		return Err(ConfigError::Validation(
			"github.api_base_url must not be a loopback address".to_string(),
		));
	}

	Ok(url)
}
