// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Push webhook signature verification.

use dockup_common_webhook::{constant_time_eq, signature_header, SHA256_PREFIX};
use tracing::debug;

/// Check an `X-Hub-Signature-256` header against the raw request body.
///
/// The header must be exactly `sha256=` followed by the lower-case hex
/// HMAC-SHA256 of `payload` keyed with `secret`. The comparison covers the
/// whole header value and runs in constant time.
pub fn verify(payload: &[u8], secret: &str, header: &str) -> bool {
	if !header.starts_with(SHA256_PREFIX) {
		debug!("signature header missing sha256= prefix");
		return false;
	}

	let expected = signature_header(secret.as_bytes(), payload);
	constant_time_eq(header.as_bytes(), expected.as_bytes())
}
