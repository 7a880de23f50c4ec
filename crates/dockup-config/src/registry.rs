// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The app registry snapshot.
//!
//! The registry file maps app names to deployment records:
//!
//! ```json
//! {
//!   "shop": {
//!     "path": "/srv/shop",
//!     "branch": "main",
//!     "secret": "…",
//!     "compose_file": "docker-compose.prod.yml"
//!   }
//! }
//! ```
//!
//! A snapshot is parsed and validated as a whole. Either every record is
//! valid and a new [`Registry`] comes back, or the load fails and the caller
//! keeps whatever snapshot it already had.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dockup_common_secret::SecretString;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ConfigError, Result};

pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";

/// Deployment configuration for one app.
#[derive(Debug, Clone, PartialEq)]
pub struct AppRegistration {
	pub name: String,
	/// Local git checkout the deploy runs in.
	pub path: PathBuf,
	/// Watched branch; pushes to other refs are ignored.
	pub branch: String,
	/// Shared key for webhook signatures and manual-trigger bearer auth.
	pub secret: SecretString,
	pub compose_file: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AppRecord {
	path: PathBuf,
	branch: String,
	secret: SecretString,
	#[serde(default)]
	compose_file: Option<String>,
}

impl AppRecord {
	fn into_registration(self, name: &str) -> Result<AppRegistration> {
		let invalid = |field: &str, message: &str| ConfigError::InvalidValue {
			key: format!("{name}.{field}"),
			message: message.to_string(),
		};

		if name.trim().is_empty() {
			return Err(ConfigError::Validation(
				"app names cannot be empty".to_string(),
			));
		}
		if self.path.as_os_str().is_empty() {
			return Err(invalid("path", "cannot be empty"));
		}
		if self.branch.trim().is_empty() {
			return Err(invalid("branch", "cannot be empty"));
		}
		if self.secret.is_blank() {
			return Err(invalid("secret", "cannot be empty"));
		}

		let compose_file = match self.compose_file {
			Some(file) if file.trim().is_empty() => {
				return Err(invalid("compose_file", "cannot be empty when set"))
			}
			Some(file) => file,
			None => DEFAULT_COMPOSE_FILE.to_string(),
		};

		Ok(AppRegistration {
			name: name.to_string(),
			path: self.path,
			branch: self.branch,
			secret: self.secret,
			compose_file,
		})
	}
}

/// Immutable snapshot of every registered app.
#[derive(Debug, Clone, Default)]
pub struct Registry {
	apps: BTreeMap<String, Arc<AppRegistration>>,
}

impl Registry {
	pub fn load(path: &Path) -> Result<Self> {
		debug!(path = %path.display(), "loading app registry");
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
			path: path.to_path_buf(),
			source: e,
		})?;
		Self::parse(&content).map_err(|e| match e {
			ConfigError::JsonParse { source, .. } => ConfigError::JsonParse {
				path: path.to_path_buf(),
				source,
			},
			other => other,
		})
	}

	/// Parse a registry document. `null` and `{}` both yield an empty registry.
	pub fn parse(json: &str) -> Result<Self> {
		let records: Option<BTreeMap<String, AppRecord>> =
			serde_json::from_str(json).map_err(|e| ConfigError::JsonParse {
				path: PathBuf::new(),
				source: e,
			})?;

		let mut apps = BTreeMap::new();
		for (name, record) in records.unwrap_or_default() {
			let registration = record.into_registration(&name)?;
			apps.insert(name, Arc::new(registration));
		}

		Ok(Self { apps })
	}

	pub fn get(&self, name: &str) -> Option<Arc<AppRegistration>> {
		self.apps.get(name).cloned()
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.apps.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.apps.len()
	}

	pub fn is_empty(&self) -> bool {
		self.apps.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	const TWO_APPS: &str = r#"{
		"shop": {"path": "/srv/shop", "branch": "main", "secret": "s1"},
		"blog": {"path": "/srv/blog", "branch": "release", "secret": "s2", "compose_file": "compose.prod.yml"}
	}"#;

	#[test]
	fn parses_records_and_defaults_compose_file() {
		let registry = Registry::parse(TWO_APPS).unwrap();
		assert_eq!(registry.len(), 2);

		let shop = registry.get("shop").unwrap();
		assert_eq!(shop.name, "shop");
		assert_eq!(shop.path, PathBuf::from("/srv/shop"));
		assert_eq!(shop.branch, "main");
		assert_eq!(shop.secret.expose(), "s1");
		assert_eq!(shop.compose_file, DEFAULT_COMPOSE_FILE);

		let blog = registry.get("blog").unwrap();
		assert_eq!(blog.compose_file, "compose.prod.yml");
	}

	#[test]
	fn null_and_empty_object_are_empty_registries() {
		assert!(Registry::parse("null").unwrap().is_empty());
		assert!(Registry::parse("{}").unwrap().is_empty());
	}

	#[test]
	fn unknown_app_is_none() {
		let registry = Registry::parse(TWO_APPS).unwrap();
		assert!(registry.get("missing").is_none());
	}

	#[test]
	fn rejects_missing_required_field() {
		let result = Registry::parse(r#"{"shop": {"path": "/srv/shop", "secret": "s"}}"#);
		assert!(matches!(result, Err(ConfigError::JsonParse { .. })));
	}

	#[test]
	fn rejects_unknown_fields() {
		let result = Registry::parse(
			r#"{"shop": {"path": "/srv/shop", "branch": "main", "secret": "s", "compose": "x"}}"#,
		);
		assert!(result.is_err());
	}

	#[test]
	fn rejects_blank_secret() {
		let err =
			Registry::parse(r#"{"shop": {"path": "/srv/shop", "branch": "main", "secret": " "}}"#)
				.unwrap_err();
		match err {
			ConfigError::InvalidValue { key, .. } => assert_eq!(key, "shop.secret"),
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[test]
	fn rejects_empty_branch() {
		let result =
			Registry::parse(r#"{"shop": {"path": "/srv/shop", "branch": "", "secret": "s"}}"#);
		assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
	}

	#[test]
	fn debug_output_hides_secrets() {
		let registry = Registry::parse(TWO_APPS).unwrap();
		let debug = format!("{registry:?}");
		assert!(!debug.contains("\"s1\""));
		assert!(debug.contains("[REDACTED]"));
	}

	#[test]
	fn load_reports_file_path_on_parse_error() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, "{{not json").unwrap();

		match Registry::load(file.path()).unwrap_err() {
			ConfigError::JsonParse { path, .. } => assert_eq!(path, file.path()),
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[test]
	fn load_missing_file_fails() {
		let result = Registry::load(Path::new("/nonexistent/registry.json"));
		assert!(matches!(result, Err(ConfigError::FileRead { .. })));
	}

	#[test]
	fn names_are_sorted() {
		let registry = Registry::parse(TWO_APPS).unwrap();
		assert_eq!(registry.names().collect::<Vec<_>>(), vec!["blog", "shop"]);
	}
}
