// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The git + compose command sequence for one deploy.
//!
//! Steps run one at a time in the app checkout and the first failing step
//! aborts the rest. When a GitHub App token is available the remote is
//! pointed at a token-bearing URL for the fetch and pointed back afterwards.
//! If `git fetch` or `git reset` fails, the restore step never runs and the
//! token URL stays in `.git/config` until the next successful deploy.

use std::path::Path;
use std::sync::Arc;

use dockup_common_secret::{SecretString, REDACTED};
use dockup_config::AppRegistration;
use dockup_github_app::{CredentialBroker, TOKEN_MARKER};
use tracing::{debug, info, instrument, warn};

use crate::error::{DeployError, Result};
use crate::runner::{CommandRunner, Step, StepArg, StepOutput};

pub const REMOTE: &str = "origin";

fn set_remote_url(url: StepArg) -> Step {
	let mut step = Step::new("git").args(["remote", "set-url", REMOTE]);
	step.args.push(url);
	step
}

fn compose(file: &str) -> Step {
	Step::new("docker").args(["compose", "-f", file])
}

/// Build the ordered step list.
///
/// With a token URL the git steps are: point the remote at the token URL,
/// fetch, hard reset, restore the original URL. Without one they are just
/// fetch and hard reset. Container steps follow in both cases.
pub fn plan(registration: &AppRegistration, original_url: &str, token_url: Option<SecretString>) -> Vec<Step> {
	let branch = &registration.branch;
	let fetch = Step::new("git").args(["fetch", REMOTE, branch.as_str()]);
	let reset = Step::new("git").args(["reset", "--hard"]).arg(format!("{REMOTE}/{branch}"));

	let mut steps = match token_url {
		Some(token_url) => vec![
			set_remote_url(StepArg::Secret(token_url)),
			fetch,
			reset,
			set_remote_url(StepArg::Plain(original_url.to_string())),
		],
		None => vec![fetch, reset],
	};

	let file = registration.compose_file.as_str();
	steps.push(compose(file).args(["build", "--pull"]));
	steps.push(compose(file).args(["up", "-d", "--remove-orphans"]));
	steps.push(Step::new("docker").args(["system", "prune", "-f"]));
	steps
}

/// Runs [`plan`] for one app through a [`CommandRunner`].
#[derive(Clone)]
pub struct CommandPipeline {
	runner: Arc<dyn CommandRunner>,
	broker: Arc<CredentialBroker>,
}

impl CommandPipeline {
	pub fn new(runner: Arc<dyn CommandRunner>, broker: Arc<CredentialBroker>) -> Self {
		Self { runner, broker }
	}

	/// Execute the full sequence and return the transcript on success.
	#[instrument(skip(self, registration), fields(app = %registration.name, path = %registration.path.display()))]
	pub async fn run(&self, registration: &AppRegistration) -> Result<String> {
		let cwd = registration.path.as_path();
		let original_url = self.remote_url(cwd).await?;
		let token_url = self.token_url(&registration.name, &original_url).await;

		let steps = plan(registration, &original_url, token_url);
		let secrets = secret_fragments(&steps);
		let mut transcript = String::new();

		for step in &steps {
			info!(step = %step, "running step");
			let output = match self.runner.run(step, cwd).await {
				Ok(output) => output,
				Err(e) => StepOutput {
					exit_code: None,
					stdout: String::new(),
					stderr: format!("{e}\n"),
				},
			};

			transcript.push_str(&format!("$ {step}\n"));
			transcript.push_str(&scrub(&output.combined(), &secrets));
			if !transcript.ends_with('\n') {
				transcript.push('\n');
			}

			if !output.success() {
				return Err(DeployError::Pipeline {
					step: step.to_string(),
					exit_code: output.exit_code,
					output: transcript,
				});
			}
		}

		debug!(steps = steps.len(), "all steps succeeded");
		Ok(transcript)
	}

	async fn remote_url(&self, cwd: &Path) -> Result<String> {
		let step = Step::new("git").args(["config", "--get"]).arg(format!("remote.{REMOTE}.url"));
		let lookup_failed = |message: String| DeployError::RemoteLookup {
			path: cwd.to_path_buf(),
			message,
		};

		let output = self.runner.run(&step, cwd).await.map_err(|e| lookup_failed(e.to_string()))?;
		if !output.success() {
			let stderr = output.stderr.trim();
			return Err(lookup_failed(if stderr.is_empty() {
				format!("`{step}` exited with {:?}", output.exit_code)
			} else {
				stderr.to_string()
			}));
		}

		let url = output.stdout.trim();
		if url.is_empty() {
			return Err(lookup_failed(format!("no URL configured for remote {REMOTE}")));
		}
		Ok(url.to_string())
	}

	/// `None` falls back to whatever credentials the checkout already has.
	async fn token_url(&self, app: &str, original_url: &str) -> Option<SecretString> {
		if !self.broker.is_configured().await {
			return None;
		}
		match self.broker.get_github_token_url(original_url).await {
			Ok(url) => Some(url),
			Err(e) => {
				warn!(app, error = %e, "failed to get GitHub token URL; falling back to existing git credentials");
				None
			}
		}
	}
}

/// Secret argument values, plus the bare token inside token-bearing URLs.
fn secret_fragments(steps: &[Step]) -> Vec<String> {
	let mut fragments = Vec::new();
	for arg in steps.iter().flat_map(|s| &s.args) {
		if let StepArg::Secret(secret) = arg {
			let value = secret.expose();
			if let Some((_, rest)) = value.split_once(TOKEN_MARKER) {
				if let Some((token, _)) = rest.split_once('@') {
					if !token.is_empty() {
						fragments.push(token.to_string());
					}
				}
			}
			fragments.push(value.to_string());
		}
	}
	// Longest first so a URL is replaced whole before its token.
	fragments.sort_by_key(|f| std::cmp::Reverse(f.len()));
	fragments
}

fn scrub(text: &str, secrets: &[String]) -> String {
	secrets
		.iter()
		.fold(text.to_string(), |acc, secret| acc.replace(secret.as_str(), REDACTED))
}
