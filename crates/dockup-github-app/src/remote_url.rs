// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rewriting GitHub remote URLs to carry an installation token.

use crate::error::{GithubAppError, Result};

/// Userinfo prefix of a token-bearing URL.
pub const TOKEN_MARKER: &str = "x-access-token:";

const HTTPS_GITHUB: &str = "https://github.com/";

/// True when `url` already carries an installation token.
pub fn has_embedded_token(url: &str) -> bool {
	url.contains(TOKEN_MARKER)
}

/// Reduce any supported GitHub remote to `https://github.com/<owner>/<repo>`.
///
/// Accepted shapes:
/// - `git@github.com:owner/repo(.git)`
/// - `ssh://git@github.com/owner/repo(.git)`
/// - `https://github.com/owner/repo(.git)`, with or without `user[:pass]@`
/// - `http://github.com/owner/repo(.git)`, upgraded to https
pub fn normalize_github_url(raw: &str) -> Result<String> {
	let raw = raw.trim();

	let rest = if let Some(path) = raw.strip_prefix("git@github.com:") {
		path
	} else if let Some(path) = raw.strip_prefix("ssh://git@github.com/") {
		path
	} else if let Some(after_scheme) = raw
		.strip_prefix("https://")
		.or_else(|| raw.strip_prefix("http://"))
	{
		let host_and_path = match after_scheme.split_once("@github.com") {
			Some((_credentials, path)) => {
				let Some(path) = path.strip_prefix('/') else {
					return Err(unsupported(raw));
				};
				return finish(path, raw);
			}
			None => after_scheme,
		};
		match host_and_path.strip_prefix("github.com/") {
			Some(path) => path,
			None => return Err(unsupported(raw)),
		}
	} else {
		return Err(unsupported(raw));
	};

	finish(rest, raw)
}

fn finish(path: &str, raw: &str) -> Result<String> {
	if path.is_empty() {
		return Err(unsupported(raw));
	}
	Ok(format!("{HTTPS_GITHUB}{path}"))
}

/// Splice `x-access-token:<token>@` into a normalized URL.
pub fn embed_token(normalized: &str, token: &str) -> Result<String> {
	let path = normalized
		.strip_prefix(HTTPS_GITHUB)
		.ok_or_else(|| unsupported(normalized))?;
	Ok(format!("https://{TOKEN_MARKER}{token}@github.com/{path}"))
}

/// Error for an unusable URL, without any credentials it may contain.
fn unsupported(raw: &str) -> GithubAppError {
	let shown = match raw.rsplit_once('@') {
		Some((_, host_and_path)) => host_and_path,
		None => raw,
	};
	GithubAppError::UnsupportedUrl(shown.to_string())
}
