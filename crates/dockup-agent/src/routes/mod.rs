// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP route handlers.

pub mod github;
pub mod health;
pub mod metrics;
pub mod reload;
pub mod webhooks;
