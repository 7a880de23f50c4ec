// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Outbound HTTP client with a consistent `User-Agent`.
//!
//! Every outbound call the agent makes (GitHub API, metrics webhook, cloud
//! metadata probes) goes through a client built here so requests are
//! identifiable as `dockup/{platform}/{git_sha}`.

use std::time::Duration;

use dockup_common_version::BuildInfo;
use reqwest::{Client, ClientBuilder};

/// Client builder preloaded with the dockup `User-Agent`.
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

pub fn new_client() -> reqwest::Result<Client> {
	builder().build()
}

/// Client whose requests fail once `timeout` elapses (connect through body).
pub fn new_client_with_timeout(timeout: Duration) -> reqwest::Result<Client> {
	builder().timeout(timeout).build()
}

/// Format: `dockup/{platform}/{git_sha}`
pub fn user_agent() -> String {
	let info = BuildInfo::current();
	format!("dockup/{}/{}", info.platform, info.git_sha)
}

#[cfg(test)]
mod tests {
	use super::*;
	use wiremock::matchers::{header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	#[test]
	fn user_agent_has_correct_format() {
		let ua = user_agent();
		let parts: Vec<&str> = ua.split('/').collect();
		assert_eq!(parts.len(), 3);
		assert_eq!(parts[0], "dockup");
	}

	#[tokio::test]
	async fn requests_carry_user_agent() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/ping"))
			.and(header("user-agent", user_agent().as_str()))
			.respond_with(ResponseTemplate::new(204))
			.expect(1)
			.mount(&server)
			.await;

		let client = new_client().unwrap();
		let response = client
			.get(format!("{}/ping", server.uri()))
			.send()
			.await
			.unwrap();
		assert_eq!(response.status().as_u16(), 204);
	}

	#[tokio::test]
	async fn timeout_client_gives_up() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
			.mount(&server)
			.await;

		let client = new_client_with_timeout(Duration::from_millis(50)).unwrap();
		let err = client.get(server.uri()).send().await.unwrap_err();
		assert!(err.is_timeout());
	}
}
