// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the GitHub App integration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GithubAppError {
	/// No GitHub App credential is loaded.
	#[error("GitHub App not configured")]
	NotConfigured,

	/// The private key is not a PKCS#1 or PKCS#8 RSA key.
	#[error("Invalid GitHub App private key: {0}")]
	KeyParse(String),

	#[error("JWT error: {0}")]
	Jwt(String),

	/// The installation-token endpoint answered with something other than 201.
	#[error("GitHub rejected the installation token request (status {status}): {body}")]
	UpstreamAuth { status: u16, body: String },

	#[error("Unsupported repository URL format: {0}")]
	UnsupportedUrl(String),

	#[error("Invalid repository name '{0}', expected owner/name")]
	InvalidRepo(String),

	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),

	#[error("Request timed out")]
	Timeout,

	#[error("Invalid response from GitHub: {0}")]
	InvalidResponse(String),

	#[error("GitHub API error: {status} - {body}")]
	Api { status: u16, body: String },

	#[error("Configuration error: {0}")]
	Config(String),
}

pub type Result<T> = std::result::Result<T, GithubAppError>;

impl GithubAppError {
	/// Map a transport failure, separating timeouts from other network errors.
	pub(crate) fn from_transport(e: reqwest::Error) -> Self {
		if e.is_timeout() {
			GithubAppError::Timeout
		} else {
			GithubAppError::Network(e)
		}
	}
}
