use gs_platform::{Container, PlatformClient};
use tracing::{debug, info};

use crate::error::{OrchestratorError, Result};
use crate::permissions::{LifecycleState, MatrixKind, PermissionMatrix};

/// Finds or creates a grouping container by label.
pub struct CategoryResolver<'a> {
    platform: &'a dyn PlatformClient,
    matrix: &'a PermissionMatrix,
}

impl<'a> CategoryResolver<'a> {
    pub fn new(platform: &'a dyn PlatformClient, matrix: &'a PermissionMatrix) -> Self {
        Self { platform, matrix }
    }

    /// Resolve the container named `label` and (re)apply its baseline matrix
    /// for `state`, even when it already existed.
    pub async fn resolve(&self, label: &str, state: LifecycleState) -> Result<Container> {
        let containers = self
            .platform
            .list_containers()
            .await
            .map_err(|e| OrchestratorError::bootstrap("list containers", e))?;

        let container = match containers.into_iter().find(|c| c.label == label) {
            Some(existing) => existing,
            None => {
                info!(label, "Creating container");
                self.platform
                    .create_container(label)
                    .await
                    .map_err(|e| OrchestratorError::bootstrap(format!("create container {label}"), e))?
            }
        };

        let access = self.matrix.compute(MatrixKind::Container, state, None);
        self.platform
            .set_container_access(container.id, &access)
            .await
            .map_err(|e| {
                OrchestratorError::bootstrap(format!("apply access to container {label}"), e)
            })?;

        debug!(label, id = %container.id, ?state, "Container resolved");
        Ok(container)
    }
}
