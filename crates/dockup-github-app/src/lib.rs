// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub side of the dockup agent.
//!
//! - [`webhook::verify`] checks `X-Hub-Signature-256` on push deliveries
//! - [`CredentialBroker`] turns a GitHub App credential into installation
//!   tokens and token-bearing remote URLs
//! - [`CredentialBroker::ensure_push_webhook`] provisions repository webhooks

pub mod broker;
pub mod config;
pub mod error;
pub mod hooks;
pub mod jwt;
pub mod remote_url;
pub mod types;
pub mod webhook;

pub use broker::{BrokerState, CredentialBroker};
pub use config::GithubAppCredential;
pub use error::{GithubAppError, Result};
pub use hooks::validate_repo;
pub use types::HookOutcome;
pub use remote_url::{embed_token, has_embedded_token, normalize_github_url, TOKEN_MARKER};
pub use webhook::verify as verify_signature;
