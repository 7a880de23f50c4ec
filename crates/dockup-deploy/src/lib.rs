// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deploy execution for dockup: the registry snapshot, the git and compose
//! command pipeline, per-app locking and deploy metrics.

pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod registry;
pub mod runner;

pub use coordinator::{DeployCoordinator, DeployOutcome, TriggerOutcome, TriggerSource, MINUTES_SAVED_PER_DEPLOY};
pub use error::{DeployError, Result};
pub use metrics::{events, MetricEvent, MetricsSink};
pub use pipeline::{plan, CommandPipeline};
pub use registry::RegistryStore;
pub use runner::{CommandRunner, Step, StepArg, StepOutput, TokioCommandRunner};
