// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub REST payloads.

use chrono::{DateTime, Utc};
use dockup_common_secret::SecretString;
use serde::{Deserialize, Serialize};

/// Response of `POST /app/installations/{id}/access_tokens`.
#[derive(Debug, Deserialize)]
pub(crate) struct AccessTokenResponse {
	pub token: SecretString,
	pub expires_at: DateTime<Utc>,
}

/// Body of `POST /repos/{owner}/{repo}/hooks`.
#[derive(Debug, Serialize)]
pub(crate) struct CreateHookRequest<'a> {
	pub name: &'static str,
	pub active: bool,
	pub events: [&'static str; 1],
	pub config: CreateHookConfig<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateHookConfig<'a> {
	pub url: &'a str,
	pub content_type: &'static str,
	/// Sent in clear; GitHub needs the secret to sign deliveries.
	pub secret: &'a str,
	pub insecure_ssl: &'static str,
}

impl<'a> CreateHookRequest<'a> {
	pub fn push(url: &'a str, secret: &'a str) -> Self {
		Self {
			name: "web",
			active: true,
			events: ["push"],
			config: CreateHookConfig {
				url,
				content_type: "json",
				secret,
				insecure_ssl: "0",
			},
		}
	}
}

#[derive(Debug, Deserialize)]
pub(crate) struct Hook {
	pub id: u64,
	#[serde(default)]
	pub config: HookConfigView,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HookConfigView {
	#[serde(default)]
	pub url: Option<String>,
}

/// Result of [`crate::CredentialBroker::ensure_push_webhook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HookOutcome {
	Created { id: u64 },
	Exists { id: u64 },
}

impl HookOutcome {
	pub fn id(&self) -> u64 {
		match self {
			HookOutcome::Created { id } | HookOutcome::Exists { id } => *id,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn create_hook_body_matches_github_schema() {
		let body = serde_json::to_value(CreateHookRequest::push(
			"https://deploy.example.com/webhook/github",
			"s3cret",
		))
		.unwrap();
		assert_eq!(
			body,
			serde_json::json!({
				"name": "web",
				"active": true,
				"events": ["push"],
				"config": {
					"url": "https://deploy.example.com/webhook/github",
					"content_type": "json",
					"secret": "s3cret",
					"insecure_ssl": "0"
				}
			})
		);
	}

	#[test]
	fn outcome_serializes_with_status_tag() {
		let json = serde_json::to_value(HookOutcome::Exists { id: 12 }).unwrap();
		assert_eq!(json, serde_json::json!({"status": "exists", "id": 12}));
	}

	#[test]
	fn access_token_response_parses_github_timestamps() {
		let parsed: AccessTokenResponse = serde_json::from_str(
			r#"{"token":"ghs_abc","expires_at":"2016-07-11T22:14:10Z","permissions":{}}"#,
		)
		.unwrap();
		assert_eq!(parsed.token.expose(), "ghs_abc");
		assert_eq!(parsed.expires_at.to_rfc3339(), "2016-07-11T22:14:10+00:00");
	}
}
