// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! App JWT minting.
//!
//! GitHub authenticates the App itself with a short-lived RS256 JWT. The JWT
//! is only ever used to request an installation token, so it is minted fresh
//! for every token request and never cached.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{GithubAppError, Result};

/// Backdating of `iat` to tolerate clock skew between this host and GitHub.
const CLOCK_SKEW_SECS: i64 = 60;
const JWT_LIFETIME_SECS: i64 = 10 * 60;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
	pub iat: i64,
	pub exp: i64,
	pub iss: String,
}

/// Parse a PEM private key. PKCS#1 (`RSA PRIVATE KEY`) and PKCS#8
/// (`PRIVATE KEY`) are both accepted; anything that is not RSA is rejected.
pub fn parse_private_key(private_key_pem: &str) -> Result<EncodingKey> {
	EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
		.map_err(|e| GithubAppError::KeyParse(e.to_string()))
}

/// Mint an App JWT: `iat = now - 60s`, `exp = now + 10min`, `iss = app_id`.
#[instrument(skip(private_key_pem))]
pub fn generate_app_jwt(app_id: &str, private_key_pem: &str) -> Result<String> {
	let key = parse_private_key(private_key_pem)?;

	let now = Utc::now().timestamp();
	let claims = Claims {
		iat: now - CLOCK_SKEW_SECS,
		exp: now + JWT_LIFETIME_SECS,
		iss: app_id.to_string(),
	};

	let token = encode(&Header::new(Algorithm::RS256), &claims, &key).map_err(|e| {
		match e.kind() {
			// ring only inspects the DER structure when signing.
			ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
				GithubAppError::KeyParse(e.to_string())
			}
			_ => GithubAppError::Jwt(format!("Failed to encode JWT: {e}")),
		}
	})?;

	debug!(app_id, exp = claims.exp, "minted GitHub App JWT");
	Ok(token)
}
