// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Push webhook provisioning on a repository.

use reqwest::StatusCode;
use tracing::{info, instrument, warn};

use crate::broker::{CredentialBroker, GITHUB_ACCEPT, GITHUB_API_VERSION};
use crate::error::{GithubAppError, Result};
use crate::types::{CreateHookRequest, Hook, HookOutcome};

/// `owner/name`, each part non-empty and free of path tricks.
pub fn validate_repo(repo: &str) -> Result<()> {
	let valid_part = |part: &str| {
		!part.is_empty()
			&& part != "."
			&& part != ".."
			&& part
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
	};
	match repo.split_once('/') {
		Some((owner, name)) if valid_part(owner) && valid_part(name) => Ok(()),
		_ => Err(GithubAppError::InvalidRepo(repo.to_string())),
	}
}

impl CredentialBroker {
	/// Make sure `repo` has a push webhook delivering to `hook_url`.
	///
	/// GitHub answers 422 (sometimes 400) when an identical hook already
	/// exists; the existing hook is then found by listing hooks and matching
	/// on the delivery URL.
	#[instrument(skip(self, secret))]
	pub async fn ensure_push_webhook(
		&self,
		repo: &str,
		hook_url: &str,
		secret: &str,
	) -> Result<HookOutcome> {
		validate_repo(repo)?;
		let token = self.get_installation_token().await?;
		let url = self.api_url(&format!("repos/{repo}/hooks"))?;

		let response = self
			.http()
			.post(url.clone())
			.bearer_auth(token.expose())
			.header("Accept", GITHUB_ACCEPT)
			.header("X-GitHub-Api-Version", GITHUB_API_VERSION)
			.json(&CreateHookRequest::push(hook_url, secret))
			.send()
			.await
			.map_err(GithubAppError::from_transport)?;

		let status = response.status();
		let body = response.text().await.unwrap_or_default();

		if status == StatusCode::CREATED {
			let hook: Hook = serde_json::from_str(&body)
				.map_err(|e| GithubAppError::InvalidResponse(format!("create hook response: {e}")))?;
			info!(repo, hook_id = hook.id, "webhook created");
			return Ok(HookOutcome::Created { id: hook.id });
		}

		if matches!(
			status,
			StatusCode::UNPROCESSABLE_ENTITY | StatusCode::BAD_REQUEST
		) {
			if let Some(id) = self.find_hook(url, token.expose(), hook_url).await {
				info!(repo, hook_id = id, "webhook already exists");
				return Ok(HookOutcome::Exists { id });
			}
		}

		warn!(repo, status = status.as_u16(), body = %body, "failed to create webhook");
		Err(GithubAppError::Api {
			status: status.as_u16(),
			body,
		})
	}

	/// Id of the hook delivering to `hook_url`, if listing succeeds and one
	/// matches.
	async fn find_hook(&self, url: url::Url, token: &str, hook_url: &str) -> Option<u64> {
		let response = match self
			.http()
			.get(url)
			.bearer_auth(token)
			.header("Accept", GITHUB_ACCEPT)
			.header("X-GitHub-Api-Version", GITHUB_API_VERSION)
			.send()
			.await
		{
			Ok(response) if response.status().is_success() => response,
			Ok(response) => {
				warn!(status = response.status().as_u16(), "listing hooks failed");
				return None;
			}
			Err(e) => {
				warn!(error = %e, "listing hooks failed");
				return None;
			}
		};

		let hooks: Vec<Hook> = response.json().await.ok()?;
		hooks
			.into_iter()
			.find(|hook| hook.config.url.as_deref() == Some(hook_url))
			.map(|hook| hook.id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::broker::test_support::{configured_broker, token_body};
	use wiremock::matchers::{body_partial_json, header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	const HOOK_URL: &str = "https://deploy.example.com/webhook/github";

	async fn server_with_token() -> MockServer {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/app/installations/4242/access_tokens"))
			.respond_with(
				ResponseTemplate::new(201).set_body_json(token_body("ghs_hooks", chrono::Duration::hours(1))),
			)
			.mount(&server)
			.await;
		server
	}

	#[test]
	fn repo_validation() {
		assert!(validate_repo("acme/shop").is_ok());
		assert!(validate_repo("acme/shop.web_2").is_ok());
		for bad in ["acme", "acme/", "/shop", "acme/shop/extra", "../x", "acme/..", "a b/c"] {
			assert!(validate_repo(bad).is_err(), "{bad} should be rejected");
		}
	}

	#[tokio::test]
	async fn creates_push_hook() {
		let server = server_with_token().await;
		Mock::given(method("POST"))
			.and(path("/repos/acme/shop/hooks"))
			.and(header("authorization", "Bearer ghs_hooks"))
			.and(body_partial_json(serde_json::json!({
				"name": "web",
				"events": ["push"],
				"config": {"url": HOOK_URL, "secret": "s3cret", "content_type": "json"}
			})))
			.respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 77})))
			.expect(1)
			.mount(&server)
			.await;

		let broker = configured_broker(&server.uri()).await;
		let outcome = broker
			.ensure_push_webhook("acme/shop", HOOK_URL, "s3cret")
			.await
			.unwrap();
		assert_eq!(outcome, HookOutcome::Created { id: 77 });
	}

	#[tokio::test]
	async fn existing_hook_is_found_by_url() {
		let server = server_with_token().await;
		Mock::given(method("POST"))
			.and(path("/repos/acme/shop/hooks"))
			.respond_with(ResponseTemplate::new(422).set_body_string("Hook already exists on this repository"))
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path("/repos/acme/shop/hooks"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
				{"id": 1, "config": {"url": "https://other.example.com/hook"}},
				{"id": 2, "config": {"url": HOOK_URL}}
			])))
			.mount(&server)
			.await;

		let broker = configured_broker(&server.uri()).await;
		let outcome = broker
			.ensure_push_webhook("acme/shop", HOOK_URL, "s3cret")
			.await
			.unwrap();
		assert_eq!(outcome, HookOutcome::Exists { id: 2 });
	}

	#[tokio::test]
	async fn unprocessable_without_match_surfaces_github_error() {
		let server = server_with_token().await;
		Mock::given(method("POST"))
			.and(path("/repos/acme/shop/hooks"))
			.respond_with(ResponseTemplate::new(422).set_body_string("Validation Failed"))
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path("/repos/acme/shop/hooks"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
			.mount(&server)
			.await;

		let broker = configured_broker(&server.uri()).await;
		match broker
			.ensure_push_webhook("acme/shop", HOOK_URL, "s3cret")
			.await
			.unwrap_err()
		{
			GithubAppError::Api { status, body } => {
				assert_eq!(status, 422);
				assert_eq!(body, "Validation Failed");
			}
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[tokio::test]
	async fn not_found_repo_is_reported_without_listing() {
		let server = server_with_token().await;
		Mock::given(method("POST"))
			.and(path("/repos/acme/missing/hooks"))
			.respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(200))
			.expect(0)
			.mount(&server)
			.await;

		let broker = configured_broker(&server.uri()).await;
		assert!(matches!(
			broker.ensure_push_webhook("acme/missing", HOOK_URL, "s").await,
			Err(GithubAppError::Api { status: 404, .. })
		));
	}
}
