// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HMAC-SHA256 signature primitives shared by inbound webhook checks and
//! test fixtures that need to sign payloads.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Prefix GitHub puts in front of the hex digest in `X-Hub-Signature-256`.
pub const SHA256_PREFIX: &str = "sha256=";

/// Hex-encoded HMAC-SHA256 of `payload`, without any prefix.
pub fn compute_hmac_sha256(secret: &[u8], payload: &[u8]) -> String {
	let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
	mac.update(payload);
	hex::encode(mac.finalize().into_bytes())
}

/// Header value in the `sha256=<hex>` form.
pub fn signature_header(secret: &[u8], payload: &[u8]) -> String {
	format!("{SHA256_PREFIX}{}", compute_hmac_sha256(secret, payload))
}

/// Byte comparison whose running time does not depend on where the inputs
/// first differ. Length mismatches return early.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
	a.ct_eq(b).into()
}
