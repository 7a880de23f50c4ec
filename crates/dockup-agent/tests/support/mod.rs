// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use axum::{body::Body, Router};
use dockup_agent::{create_app_state, create_router, AppState};
use dockup_config::{AgentConfig, DeployConfig, GithubConfig, HttpConfig, LoggingConfig, PathsConfig};
use dockup_deploy::{CommandRunner, Step, StepOutput};
use http::{Request, StatusCode};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SHOP_SECRET: &str = "shop-secret";
pub const INSTALLATION_TOKEN: &str = "ghs_router_test";

pub const REGISTRY: &str = r#"{
	"shop": {"path": "/srv/shop", "branch": "main", "secret": "shop-secret"},
	"blog": {"path": "/srv/blog", "branch": "production", "secret": "blog-secret", "compose_file": "compose.prod.yml"}
}"#;

/// Pretends every step succeeds and records what it was asked to run.
#[derive(Default)]
pub struct RecordingRunner {
	calls: Mutex<Vec<String>>,
	fetch_delay: Duration,
}

impl RecordingRunner {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_fetch_delay(delay: Duration) -> Self {
		Self {
			fetch_delay: delay,
			..Default::default()
		}
	}

	pub fn calls(&self) -> Vec<String> {
		self.calls.lock().unwrap().clone()
	}

	/// Poll until a recorded call equals `step`.
	pub async fn wait_for(&self, step: &str) -> bool {
		for _ in 0..100 {
			if self.calls().iter().any(|c| c == step) {
				return true;
			}
			tokio::time::sleep(Duration::from_millis(20)).await;
		}
		false
	}
}

#[async_trait]
impl CommandRunner for RecordingRunner {
	async fn run(&self, step: &Step, cwd: &Path) -> dockup_deploy::Result<StepOutput> {
		let line = format!("[{}] {step}", cwd.display());
		self.calls.lock().unwrap().push(line);

		if step.to_string() == "git config --get remote.origin.url" {
			return Ok(StepOutput {
				exit_code: Some(0),
				stdout: "git@github.com:acme/shop.git\n".to_string(),
				stderr: String::new(),
			});
		}
		if step.program == "git" && step.argv().next() == Some("fetch") {
			tokio::time::sleep(self.fetch_delay).await;
		}
		Ok(StepOutput {
			exit_code: Some(0),
			..Default::default()
		})
	}
}

pub fn private_key_pem() -> &'static str {
	use rsa::pkcs1::EncodeRsaPrivateKey;
	use rsa::pkcs8::LineEnding;

	static KEY: OnceLock<String> = OnceLock::new();
	KEY.get_or_init(|| {
		let key = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
		key.to_pkcs1_pem(LineEnding::LF).unwrap().to_string()
	})
}

/// Answer installation token requests for installation 4242.
pub async fn mount_token_mint(server: &MockServer) {
	Mock::given(method("POST"))
		.and(path("/app/installations/4242/access_tokens"))
		.respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
			"token": INSTALLATION_TOKEN,
			"expires_at": (chrono::Utc::now() + chrono::Duration::hours(1)).to_rfc3339(),
		})))
		.mount(server)
		.await;
}

pub struct TestApp {
	pub dir: tempfile::TempDir,
	pub router: Router,
	pub state: AppState,
	pub runner: Arc<RecordingRunner>,
}

impl TestApp {
	/// Agent with [`REGISTRY`] and no GitHub App.
	pub async fn new() -> Self {
		Self::build(REGISTRY, None, RecordingRunner::new()).await
	}

	/// Agent with [`REGISTRY`] and a GitHub App whose API is `github`.
	pub async fn with_github(github: &MockServer) -> Self {
		Self::build(REGISTRY, Some(github), RecordingRunner::new()).await
	}

	pub async fn build(registry: &str, github: Option<&MockServer>, runner: RecordingRunner) -> Self {
		let dir = tempfile::tempdir().unwrap();
		let paths = PathsConfig {
			registry_file: dir.path().join("registry.json"),
			github_app_file: dir.path().join("github-app.json"),
			metrics_file: dir.path().join("metrics.json"),
		};
		std::fs::write(&paths.registry_file, registry).unwrap();

		let api_base_url = match github {
			Some(server) => {
				let credential = serde_json::json!({
					"app_id": "101",
					"installation_id": 4242,
					"private_key": private_key_pem(),
				});
				std::fs::write(&paths.github_app_file, credential.to_string()).unwrap();
				url::Url::parse(&server.uri()).unwrap()
			}
			None => url::Url::parse("https://api.github.com").unwrap(),
		};

		let config = AgentConfig {
			http: HttpConfig::default(),
			paths,
			logging: LoggingConfig::default(),
			github: GithubConfig { api_base_url },
			deploy: DeployConfig::default(),
		};

		let runner = Arc::new(runner);
		let state = create_app_state(&config, runner.clone()).await.unwrap();
		Self {
			dir,
			router: create_router(state.clone()),
			state,
			runner,
		}
	}

	pub fn registry_path(&self) -> std::path::PathBuf {
		self.dir.path().join("registry.json")
	}

	pub async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
		let response = self.router.clone().oneshot(request).await.unwrap();
		let status = response.status();
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		(status, String::from_utf8(bytes.to_vec()).unwrap())
	}

	pub async fn get(&self, uri: &str) -> (StatusCode, String) {
		self
			.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
			.await
	}

	pub async fn post_json(&self, uri: &str, body: &str) -> (StatusCode, String) {
		self
			.send(
				Request::builder()
					.method("POST")
					.uri(uri)
					.header("content-type", "application/json")
					.body(Body::from(body.to_string()))
					.unwrap(),
			)
			.await
	}
}

pub fn push_payload(repo: &str, git_ref: &str) -> String {
	serde_json::json!({
		"ref": git_ref,
		"repository": { "name": repo, "full_name": format!("acme/{repo}") },
		"head_commit": { "id": "4f1c0de" },
	})
	.to_string()
}

pub fn github_push(payload: &str, signature: &str) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri("/webhook/github")
		.header("content-type", "application/json")
		.header("X-GitHub-Event", "push")
		.header("X-Hub-Signature-256", signature)
		.body(Body::from(payload.to_string()))
		.unwrap()
}

pub fn sign(secret: &str, payload: &str) -> String {
	dockup_common_webhook::signature_header(secret.as_bytes(), payload.as_bytes())
}
