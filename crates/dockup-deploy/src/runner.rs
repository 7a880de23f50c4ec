// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process execution for pipeline steps.

use std::fmt;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use dockup_common_secret::{SecretString, REDACTED};
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::error::{DeployError, Result};

#[derive(Clone, PartialEq)]
pub enum StepArg {
	Plain(String),
	/// Rendered as `[REDACTED]` everywhere except the actual process argv.
	Secret(SecretString),
}

impl StepArg {
	fn expose(&self) -> &str {
		match self {
			StepArg::Plain(s) => s,
			StepArg::Secret(s) => s.expose(),
		}
	}
}

impl fmt::Display for StepArg {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			StepArg::Plain(s) => f.write_str(s),
			StepArg::Secret(_) => f.write_str(REDACTED),
		}
	}
}

/// One command in the deploy sequence.
#[derive(Clone, PartialEq)]
pub struct Step {
	pub program: String,
	pub args: Vec<StepArg>,
}

impl Step {
	pub fn new(program: impl Into<String>) -> Self {
		Self {
			program: program.into(),
			args: Vec::new(),
		}
	}

	pub fn arg(mut self, arg: impl Into<String>) -> Self {
		self.args.push(StepArg::Plain(arg.into()));
		self
	}

	pub fn args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args.extend(args.into_iter().map(|a| StepArg::Plain(a.into())));
		self
	}

	pub fn secret_arg(mut self, arg: SecretString) -> Self {
		self.args.push(StepArg::Secret(arg));
		self
	}

	/// Arguments as passed to the process.
	pub fn argv(&self) -> impl Iterator<Item = &str> {
		self.args.iter().map(StepArg::expose)
	}
}

impl fmt::Display for Step {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.program)?;
		for arg in &self.args {
			write!(f, " {arg}")?;
		}
		Ok(())
	}
}

impl fmt::Debug for Step {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Step({self})")
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutput {
	/// `None` when the process was killed by a signal.
	pub exit_code: Option<i32>,
	pub stdout: String,
	pub stderr: String,
}

impl StepOutput {
	pub fn success(&self) -> bool {
		self.exit_code == Some(0)
	}

	/// stdout followed by stderr.
	pub fn combined(&self) -> String {
		let mut out = self.stdout.clone();
		if !out.is_empty() && !out.ends_with('\n') && !self.stderr.is_empty() {
			out.push('\n');
		}
		out.push_str(&self.stderr);
		out
	}
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
	/// Run one step to completion in `cwd`. A non-zero exit is a normal
	/// `Ok` result; only failing to start the process is an error.
	async fn run(&self, step: &Step, cwd: &Path) -> Result<StepOutput>;
}

/// Runs steps as child processes. Dropping the future kills the child.
#[derive(Debug, Clone, Default)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
	#[instrument(skip(self, step), fields(step = %step, cwd = %cwd.display()))]
	async fn run(&self, step: &Step, cwd: &Path) -> Result<StepOutput> {
		let output = Command::new(&step.program)
			.args(step.argv())
			.current_dir(cwd)
			// Never block on an interactive credential prompt.
			.env("GIT_TERMINAL_PROMPT", "0")
			.stdin(Stdio::null())
			.kill_on_drop(true)
			.output()
			.await
			.map_err(|e| DeployError::Spawn {
				program: step.program.clone(),
				source: e,
			})?;

		let result = StepOutput {
			exit_code: output.status.code(),
			stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
			stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
		};
		debug!(exit_code = ?result.exit_code, "step finished");
		Ok(result)
	}
}
