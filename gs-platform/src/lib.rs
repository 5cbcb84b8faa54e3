//! Platform client abstraction.
//!
//! The orchestrator never talks to the collaboration service directly. It
//! goes through the [`PlatformClient`] trait defined here, which exposes the
//! registries of groups, containers and resources plus the handful of
//! mutations the workspace lifecycle needs. A REST implementation lives in
//! [`discord`]; an in-memory one for tests lives in `memory` behind the
//! `test-helpers` feature.

use async_trait::async_trait;

pub mod discord;
pub mod error;
pub mod model;
pub mod permissions;

// When the `test-helpers` feature is enabled, include the in-memory platform.
#[cfg(feature = "test-helpers")]
pub mod memory;

pub use error::{PlatformError, Result};
pub use model::{
    Container, Group, GroupSpec, Resource, ResourceKind, Snowflake, TextResourceSpec,
    VoiceResourceSpec,
};
pub use permissions::{Overwrite, Permissions, PrincipalKind};

/// The capabilities the workspace lifecycle requires from the platform.
///
/// Every call may fail with a transport or permission error. Callers decide
/// whether a failure is fatal; implementations never retry on their own.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Short name of the backing implementation (e.g. "discord", "memory").
    fn name(&self) -> &'static str;

    /// The principal every member of the space belongs to.
    fn everyone_id(&self) -> Snowflake;

    /// The identity the service itself acts as.
    fn service_id(&self) -> Snowflake;

    async fn create_group(&self, spec: &GroupSpec) -> Result<Group>;

    async fn delete_group(&self, id: Snowflake) -> Result<()>;

    async fn list_groups(&self) -> Result<Vec<Group>>;

    async fn create_container(&self, label: &str) -> Result<Container>;

    async fn list_containers(&self) -> Result<Vec<Container>>;

    /// Replace the full overwrite set of a container.
    async fn set_container_access(&self, id: Snowflake, access: &[Overwrite]) -> Result<()>;

    async fn create_text_resource(&self, spec: &TextResourceSpec) -> Result<Resource>;

    async fn create_voice_resource(&self, spec: &VoiceResourceSpec) -> Result<Resource>;

    /// All text and voice resources, regardless of container.
    async fn list_resources(&self) -> Result<Vec<Resource>>;

    async fn move_resource(&self, id: Snowflake, container_id: Snowflake) -> Result<()>;

    async fn delete_resource(&self, id: Snowflake) -> Result<()>;

    /// Replace the full overwrite set of a resource.
    async fn set_resource_access(&self, id: Snowflake, access: &[Overwrite]) -> Result<()>;

    async fn set_resource_metadata_tag(&self, id: Snowflake, tag: &str) -> Result<()>;
}
