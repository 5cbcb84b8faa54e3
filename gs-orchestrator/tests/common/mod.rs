//! Shared fixtures for orchestrator integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use gs_orchestrator::{OrchestratorSettings, WorkspaceOrchestrator};
use gs_platform::memory::MemoryPlatform;
use gs_platform::{Container, Resource, Snowflake};

pub const ADMIN_ROLE: Snowflake = Snowflake(900_000_000_000_000_001);
pub const MEMBERS_ROLE: Snowflake = Snowflake(900_000_000_000_000_002);

pub fn settings() -> OrchestratorSettings {
    OrchestratorSettings {
        admin_principals: vec![ADMIN_ROLE, MEMBERS_ROLE],
        ..OrchestratorSettings::default()
    }
}

/// An orchestrator over a fresh in-memory platform.
pub fn setup() -> (Arc<MemoryPlatform>, WorkspaceOrchestrator) {
    let platform = Arc::new(MemoryPlatform::new());
    let orchestrator = WorkspaceOrchestrator::new(platform.clone(), settings());
    (platform, orchestrator)
}

pub async fn container(platform: &MemoryPlatform, label: &str) -> Option<Container> {
    platform
        .containers()
        .await
        .into_iter()
        .find(|c| c.label == label)
}

pub async fn resources_in(platform: &MemoryPlatform, container_id: Snowflake) -> Vec<Resource> {
    platform
        .resources()
        .await
        .into_iter()
        .filter(|r| r.container_id == Some(container_id))
        .collect()
}
