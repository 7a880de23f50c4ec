// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for the agent settings file.

pub mod deploy;
pub mod github;
pub mod http;
pub mod logging;
pub mod paths;

pub use deploy::{DeployConfig, DeployConfigLayer};
pub use github::{GithubConfig, GithubConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use paths::{PathsConfig, PathsConfigLayer};
