// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! dockup-agent: receives deploy triggers and redeploys compose apps on this host.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dockup_agent::{create_app_state, create_router, version};
use dockup_config::{
	AgentConfig, AgentConfigLayer, HttpConfigLayer, LoadOptions, LogFormat, PathsConfigLayer,
};
use dockup_deploy::TokioCommandRunner;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// dockup agent - continuous deployment for docker compose apps.
#[derive(Parser, Debug)]
#[command(name = "dockup-agent", about = "dockup deploy agent", disable_version_flag = true)]
struct Args {
	#[command(subcommand)]
	command: Option<Command>,

	/// Port to listen on
	#[arg(long)]
	port: Option<u16>,

	/// Path to the app registry (registry.json)
	#[arg(long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Agent settings file; defaults to /etc/dockup/agent.toml when present
	#[arg(long, value_name = "PATH")]
	settings: Option<PathBuf>,

	/// Show version and build information
	#[arg(short = 'V', long)]
	version: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version and build information
	Version,
}

impl Args {
	fn load_options(&self) -> LoadOptions {
		let mut cli = AgentConfigLayer::default();
		if self.port.is_some() {
			cli.http = Some(HttpConfigLayer {
				port: self.port,
				..Default::default()
			});
		}
		if self.config.is_some() {
			cli.paths = Some(PathsConfigLayer {
				registry_file: self.config.clone(),
				..Default::default()
			});
		}
		LoadOptions {
			settings_file: self.settings.clone(),
			cli,
		}
	}
}

/// Plain subscriber used while the settings that configure logging are
/// still being loaded.
fn bootstrap_subscriber<W>(filter: EnvFilter, writer: W) -> impl tracing::Subscriber + Send + Sync
where
	W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(writer)
		.finish()
}

fn load_settings(args: &Args) -> anyhow::Result<AgentConfig> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let _bootstrap = bootstrap_subscriber(filter, std::io::stderr).set_default();
	dockup_config::load_config(args.load_options()).context("invalid agent settings")
}

fn init_tracing(level: &str, format: LogFormat) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
	let registry = tracing_subscriber::registry().with(filter);
	match format {
		LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
		LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
	}
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "failed to listen for Ctrl-C");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut sigterm) => {
				sigterm.recv().await;
			}
			Err(e) => {
				tracing::error!(error = %e, "failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
	tracing::info!("received shutdown signal");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	if args.version || matches!(args.command, Some(Command::Version)) {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = load_settings(&args)?;
	init_tracing(&config.logging.level, config.logging.format);

	let state = create_app_state(&config, Arc::new(TokioCommandRunner::new())).await?;

	let info = version::BuildInfo::current();
	let apps = state.registry.len().await;
	tracing::info!(
		version = info.version,
		git_sha = info.git_sha,
		addr = %config.socket_addr(),
		apps,
		"starting dockup-agent"
	);
	if !state.broker.is_configured().await {
		tracing::warn!(
			path = %config.paths.github_app_file.display(),
			"GitHub App not configured; private repositories may fail to fetch"
		);
	}

	let listener = tokio::net::TcpListener::bind(config.socket_addr())
		.await
		.with_context(|| format!("failed to bind {}", config.socket_addr()))?;

	axum::serve(listener, create_router(state))
		.with_graceful_shutdown(shutdown_signal())
		.await
		.context("server error")?;

	tracing::info!("server shutdown complete");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn flags_become_the_command_line_layer() {
		let args = Args::parse_from([
			"dockup-agent",
			"--port",
			"9090",
			"--config",
			"/tmp/registry.json",
		]);
		let options = args.load_options();

		assert_eq!(options.cli.http.unwrap().port, Some(9090));
		assert_eq!(
			options.cli.paths.unwrap().registry_file,
			Some(PathBuf::from("/tmp/registry.json"))
		);
		assert!(options.settings_file.is_none());
	}

	#[test]
	fn no_flags_leave_layers_empty() {
		let options = Args::parse_from(["dockup-agent"]).load_options();
		assert!(options.cli.http.is_none());
		assert!(options.cli.paths.is_none());
	}

	#[test]
	fn version_flag_and_subcommand_parse() {
		assert!(Args::parse_from(["dockup-agent", "--version"]).version);
		assert!(matches!(
			Args::parse_from(["dockup-agent", "version"]).command,
			Some(Command::Version)
		));
	}

	#[derive(Clone, Default)]
	struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

	impl std::io::Write for Captured {
		fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
			self.0.lock().unwrap().extend_from_slice(buf);
			Ok(buf.len())
		}

		fn flush(&mut self) -> std::io::Result<()> {
			Ok(())
		}
	}

	#[test]
	fn settings_load_is_logged_before_tracing_init() {
		let dir = tempfile::tempdir().unwrap();
		let settings = dir.path().join("agent.toml");
		std::fs::write(&settings, "[http]\nport = 9191\n").unwrap();

		let captured = Captured::default();
		let writer = captured.clone();
		let subscriber = bootstrap_subscriber(EnvFilter::new("info"), move || writer.clone());
		let config = tracing::subscriber::with_default(subscriber, || {
			dockup_config::load_config(LoadOptions {
				settings_file: Some(settings.clone()),
				cli: AgentConfigLayer::default(),
			})
		})
		.unwrap();

		assert_eq!(config.http.port, 9191);
		let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
		assert!(logs.contains("agent configuration loaded"), "logs: {logs}");
	}
}
