// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Health, reload and metrics relay routes.

mod support;

use http::StatusCode;
use serde_json::{json, Value};
use support::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn health_reports_state() {
	let app = TestApp::new().await;

	let (status, body) = app.get("/health").await;

	assert_eq!(status, StatusCode::OK);
	let body: Value = serde_json::from_str(&body).unwrap();
	assert_eq!(body["status"], "ok");
	assert_eq!(body["apps"], 2);
	assert_eq!(body["github_app_configured"], false);
	assert_eq!(body["metrics_enabled"], false);
	assert!(body["version"].as_str().is_some_and(|v| !v.is_empty()));
}

#[tokio::test]
async fn health_sees_github_app() {
	let github = MockServer::start().await;
	let app = TestApp::with_github(&github).await;

	let (_, body) = app.get("/health").await;

	let body: Value = serde_json::from_str(&body).unwrap();
	assert_eq!(body["github_app_configured"], true);
}

#[tokio::test]
async fn reload_picks_up_new_registry() {
	let app = TestApp::new().await;
	std::fs::write(
		app.registry_path(),
		r#"{"docs": {"path": "/srv/docs", "branch": "main", "secret": "d"}}"#,
	)
	.unwrap();

	let (status, body) = app.post_json("/reload", "").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, "Registry reloaded. Now watching 1 apps");
	assert!(app.state.registry.lookup("docs").await.is_ok());
	assert!(app.state.registry.lookup("shop").await.is_err());
}

#[tokio::test]
async fn failed_reload_keeps_registry() {
	let app = TestApp::new().await;
	std::fs::write(app.registry_path(), r#"{"docs": {"path": "/srv/docs"}}"#).unwrap();

	let (status, body) = app.post_json("/reload", "").await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert!(body.starts_with("Failed to reload"));
	assert_eq!(app.state.registry.len().await, 2);
}

#[tokio::test]
async fn reload_is_post_only() {
	let app = TestApp::new().await;
	let (status, _) = app.get("/reload").await;
	assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn metrics_track_relays_event() {
	let metrics = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/collect"))
		.respond_with(ResponseTemplate::new(200))
		.mount(&metrics)
		.await;

	let app = TestApp::new().await;
	std::fs::write(
		app.dir.path().join("metrics.json"),
		json!({"webhook_url": format!("{}/collect", metrics.uri()), "vps_id": "debian-2gb-fsn1"}).to_string(),
	)
	.unwrap();
	let (status, _) = app.post_json("/reload", "").await;
	assert_eq!(status, StatusCode::OK);

	let (status, body) = app
		.post_json(
			"/metrics/track",
			r#"{"event_type": "cli_install", "app_name": "shop", "data": {"os": "linux"}}"#,
		)
		.await;
	assert_eq!((status, body.as_str()), (StatusCode::OK, "Metric tracked"));

	let mut received = Vec::new();
	for _ in 0..100 {
		received = metrics.received_requests().await.unwrap();
		if !received.is_empty() {
			break;
		}
		tokio::time::sleep(std::time::Duration::from_millis(20)).await;
	}
	let event: Value = serde_json::from_slice(&received[0].body).unwrap();
	assert_eq!(event["event_type"], "cli_install");
	assert_eq!(event["app_name"], "shop");
	assert_eq!(event["data"]["os"], "linux");
	assert_eq!(event["vps_id"], "debian-2gb-fsn1");
}

#[tokio::test]
async fn metrics_track_requires_event_type() {
	let app = TestApp::new().await;

	let (status, body) = app.post_json("/metrics/track", r#"{"app_name": "shop"}"#).await;
	assert_eq!((status, body.as_str()), (StatusCode::BAD_REQUEST, "Missing event_type"));

	let (status, body) = app.post_json("/metrics/track", "[").await;
	assert_eq!((status, body.as_str()), (StatusCode::BAD_REQUEST, "Invalid JSON"));
}
