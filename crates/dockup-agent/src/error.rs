// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
};
use dockup_github_app::GithubAppError;

/// Handler errors. Bodies are short plain-text messages.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("{0}")]
	BadRequest(String),

	/// Manual trigger with a missing or wrong bearer secret.
	#[error("{0}")]
	Unauthorized(String),

	/// Webhook signature did not verify.
	#[error("{0}")]
	Forbidden(String),

	#[error("{0}")]
	NotFound(String),

	/// GitHub App not configured.
	#[error("{0}")]
	ServiceUnavailable(String),

	#[error("{0}")]
	Upstream(String),

	/// GitHub answered with an error status that is passed through.
	#[error("GitHub API error (status {status}): {body}")]
	GithubApi { status: u16, body: String },

	#[error("{0}")]
	Internal(String),
}

impl ServerError {
	pub fn status(&self) -> StatusCode {
		match self {
			ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
			ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
			ServerError::Forbidden(_) => StatusCode::FORBIDDEN,
			ServerError::NotFound(_) => StatusCode::NOT_FOUND,
			ServerError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
			ServerError::Upstream(_) => StatusCode::BAD_GATEWAY,
			ServerError::GithubApi { status, .. } => {
				StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
			}
			ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	pub fn github_app_not_configured() -> Self {
		ServerError::ServiceUnavailable("GitHub App not configured".to_string())
	}

	/// Map a GitHub App failure, prefixing upstream failures with `context`.
	pub fn from_github(context: &str, error: GithubAppError) -> Self {
		match error {
			GithubAppError::NotConfigured => Self::github_app_not_configured(),
			GithubAppError::UnsupportedUrl(_) | GithubAppError::InvalidRepo(_) => {
				ServerError::BadRequest(error.to_string())
			}
			GithubAppError::Api { status, body } => ServerError::GithubApi { status, body },
			other => ServerError::Upstream(format!("{context}: {other}")),
		}
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let status = self.status();
		if status.is_server_error() {
			tracing::error!(status = status.as_u16(), error = %self, "request failed");
		} else {
			tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
		}
		(status, self.to_string()).into_response()
	}
}
