// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::extract::State;

use crate::{api::AppState, error::ServerError};

/// POST /reload
pub async fn reload(State(state): State<AppState>) -> Result<String, ServerError> {
	let summary = state
		.reloader
		.reload_all()
		.await
		.map_err(|e| ServerError::Internal(format!("Failed to reload: {e}")))?;

	Ok(format!("Registry reloaded. Now watching {} apps", summary.apps))
}
