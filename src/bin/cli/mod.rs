//! CLI module for the Enrollment CLI tool
//!
//! Command handlers plus the shared workspace bootstrap and output helpers.

pub mod commands;

use std::sync::Arc;

use anyhow::Context;
use enrollment_core::{ClientConfig, EnrollmentApiClient, EnrollmentApiConfig, EnrollmentWorkspace};
use serde::Serialize;

use crate::OutputFormat;

pub use commands::{handle_reassign_command, handle_roster_command};

/// Build a workspace against the configured API and load the roster
pub async fn load_workspace(
    config: &ClientConfig,
) -> anyhow::Result<EnrollmentWorkspace<EnrollmentApiClient>> {
    let client = EnrollmentApiClient::new(EnrollmentApiConfig::from(&config.api))?;
    let workspace = EnrollmentWorkspace::with_config(Arc::new(client), config);
    workspace
        .refresh()
        .await
        .context("Failed to load roster from the enrollment API")?;
    Ok(workspace)
}

/// Print `value` as pretty JSON when requested; returns whether it printed
pub fn print_json<T: Serialize>(format: OutputFormat, value: &T) -> anyhow::Result<bool> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(value)?);
        return Ok(true);
    }
    Ok(false)
}
