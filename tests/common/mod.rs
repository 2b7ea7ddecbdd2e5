#![allow(dead_code)] // Each test binary uses a different subset

pub mod builders;
pub mod strategies;

pub use builders::*;

use std::sync::Arc;

use enrollment_core::test_helpers::{fixtures, InMemoryGateway};
use enrollment_core::EnrollmentWorkspace;

/// Workspace over the shared fixture gateway, already refreshed
pub async fn loaded_workspace() -> (Arc<InMemoryGateway>, EnrollmentWorkspace<InMemoryGateway>) {
    loaded_workspace_with(fixtures::sample_gateway()).await
}

/// Workspace over `gateway`, already refreshed
pub async fn loaded_workspace_with(
    gateway: InMemoryGateway,
) -> (Arc<InMemoryGateway>, EnrollmentWorkspace<InMemoryGateway>) {
    let gateway = Arc::new(gateway);
    let workspace = EnrollmentWorkspace::new(gateway.clone());
    workspace
        .refresh()
        .await
        .expect("fixture gateway refresh should succeed");
    (gateway, workspace)
}
