//! In-memory platform used by tests.
//!
//! Keeps groups, containers, resources and their access matrices in a
//! mutex-guarded state and supports injecting failures per operation,
//! optionally scoped to a target label and a number of occurrences.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{PlatformError, Result};
use crate::model::{
    Container, Group, GroupSpec, Resource, ResourceKind, Snowflake, TextResourceSpec,
    VoiceResourceSpec,
};
use crate::permissions::Overwrite;
use crate::PlatformClient;

pub const EVERYONE_ID: Snowflake = Snowflake(1_100_000_000_000_000_001);
pub const SERVICE_ID: Snowflake = Snowflake(1_100_000_000_000_000_002);

const FIRST_ID: u64 = 1_200_000_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateGroup,
    DeleteGroup,
    ListGroups,
    CreateContainer,
    ListContainers,
    SetContainerAccess,
    CreateText,
    CreateVoice,
    ListResources,
    MoveResource,
    DeleteResource,
    SetResourceAccess,
    SetMetadataTag,
}

#[derive(Debug, Clone)]
struct FailureRule {
    op: Operation,
    label: Option<String>,
    remaining: Option<usize>,
}

impl FailureRule {
    fn matches(&self, op: Operation, label: Option<&str>) -> bool {
        self.op == op && self.label.as_deref().map_or(true, |l| Some(l) == label)
    }
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    groups: Vec<Group>,
    containers: Vec<Container>,
    resources: Vec<Resource>,
    access: HashMap<Snowflake, Vec<Overwrite>>,
    failures: Vec<FailureRule>,
    calls: Vec<Operation>,
}

impl State {
    fn mint(&mut self) -> Snowflake {
        if self.next_id == 0 {
            self.next_id = FIRST_ID;
        }
        self.next_id += 1;
        Snowflake(self.next_id)
    }

    fn check(&mut self, op: Operation, label: Option<&str>) -> Result<()> {
        self.calls.push(op);

        let Some(idx) = self.failures.iter().position(|rule| rule.matches(op, label)) else {
            return Ok(());
        };

        let rule = &mut self.failures[idx];
        if let Some(remaining) = rule.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                self.failures.remove(idx);
            }
        }

        Err(PlatformError::Rejected(format!(
            "injected failure: {op:?}{}",
            label.map(|l| format!(" on {l}")).unwrap_or_default()
        )))
    }

    fn resource_label(&self, id: Snowflake) -> Option<String> {
        self.resources
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.label.clone())
    }

    fn resource_mut(&mut self, id: Snowflake) -> Result<&mut Resource> {
        self.resources
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| PlatformError::not_found("resource", id))
    }
}

#[derive(Debug)]
pub struct MemoryPlatform {
    everyone: Snowflake,
    service: Snowflake,
    state: Mutex<State>,
}

impl Default for MemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self {
            everyone: EVERYONE_ID,
            service: SERVICE_ID,
            state: Mutex::new(State::default()),
        }
    }

    /// Fail every call of `op` from now on.
    pub async fn fail_always(&self, op: Operation) {
        self.push_rule(op, None, None).await;
    }

    /// Fail the next `times` calls of `op`.
    pub async fn fail_times(&self, op: Operation, times: usize) {
        self.push_rule(op, None, Some(times)).await;
    }

    /// Fail every call of `op` whose target carries `label`.
    pub async fn fail_for_label(&self, op: Operation, label: impl Into<String>) {
        self.push_rule(op, Some(label.into()), None).await;
    }

    async fn push_rule(&self, op: Operation, label: Option<String>, remaining: Option<usize>) {
        self.state.lock().await.failures.push(FailureRule {
            op,
            label,
            remaining,
        });
    }

    /// Seed a group that exists before any workflow runs.
    pub async fn insert_group(&self, label: &str, color: u32) -> Group {
        let mut state = self.state.lock().await;
        let group = Group {
            id: state.mint(),
            label: label.to_string(),
            color,
            mentionable: false,
            hoisted: false,
        };
        state.groups.push(group.clone());
        group
    }

    /// Seed a resource, e.g. one written by an older revision of the tagging.
    pub async fn insert_resource(
        &self,
        kind: ResourceKind,
        label: &str,
        container_id: Option<Snowflake>,
        metadata_tag: Option<&str>,
    ) -> Resource {
        let mut state = self.state.lock().await;
        let resource = Resource {
            id: state.mint(),
            kind,
            container_id,
            label: label.to_string(),
            metadata_tag: metadata_tag.map(str::to_string),
        };
        state.resources.push(resource.clone());
        resource
    }

    pub async fn groups(&self) -> Vec<Group> {
        self.state.lock().await.groups.clone()
    }

    pub async fn containers(&self) -> Vec<Container> {
        self.state.lock().await.containers.clone()
    }

    pub async fn resources(&self) -> Vec<Resource> {
        self.state.lock().await.resources.clone()
    }

    pub async fn access_of(&self, id: Snowflake) -> Option<Vec<Overwrite>> {
        self.state.lock().await.access.get(&id).cloned()
    }

    pub async fn call_count(&self, op: Operation) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|&&call| call == op)
            .count()
    }
}

#[async_trait]
impl PlatformClient for MemoryPlatform {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn everyone_id(&self) -> Snowflake {
        self.everyone
    }

    fn service_id(&self) -> Snowflake {
        self.service
    }

    async fn create_group(&self, spec: &GroupSpec) -> Result<Group> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.check(Operation::CreateGroup, Some(&spec.label))?;
        let group = Group {
            id: state.mint(),
            label: spec.label.clone(),
            color: spec.color,
            mentionable: spec.mentionable,
            hoisted: spec.hoisted,
        };
        state.groups.push(group.clone());
        Ok(group)
    }

    async fn delete_group(&self, id: Snowflake) -> Result<()> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        let label = state
            .groups
            .iter()
            .find(|g| g.id == id)
            .map(|g| g.label.clone());
        state.check(Operation::DeleteGroup, label.as_deref())?;
        let before = state.groups.len();
        state.groups.retain(|g| g.id != id);
        if state.groups.len() == before {
            return Err(PlatformError::not_found("group", id));
        }
        Ok(())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.check(Operation::ListGroups, None)?;
        Ok(state.groups.clone())
    }

    async fn create_container(&self, label: &str) -> Result<Container> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.check(Operation::CreateContainer, Some(label))?;
        let container = Container {
            id: state.mint(),
            label: label.to_string(),
        };
        state.containers.push(container.clone());
        Ok(container)
    }

    async fn list_containers(&self) -> Result<Vec<Container>> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.check(Operation::ListContainers, None)?;
        Ok(state.containers.clone())
    }

    async fn set_container_access(&self, id: Snowflake, access: &[Overwrite]) -> Result<()> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        let label = state
            .containers
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.label.clone());
        state.check(Operation::SetContainerAccess, label.as_deref())?;
        if label.is_none() {
            return Err(PlatformError::not_found("container", id));
        }
        state.access.insert(id, access.to_vec());
        Ok(())
    }

    async fn create_text_resource(&self, spec: &TextResourceSpec) -> Result<Resource> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.check(Operation::CreateText, Some(&spec.label))?;
        if !state.containers.iter().any(|c| c.id == spec.container_id) {
            return Err(PlatformError::not_found("container", spec.container_id));
        }
        let resource = Resource {
            id: state.mint(),
            kind: ResourceKind::Text,
            container_id: Some(spec.container_id),
            label: spec.label.clone(),
            metadata_tag: Some(spec.metadata_tag.clone()),
        };
        state.access.insert(resource.id, spec.access.clone());
        state.resources.push(resource.clone());
        Ok(resource)
    }

    async fn create_voice_resource(&self, spec: &VoiceResourceSpec) -> Result<Resource> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.check(Operation::CreateVoice, Some(&spec.label))?;
        if !state.containers.iter().any(|c| c.id == spec.container_id) {
            return Err(PlatformError::not_found("container", spec.container_id));
        }
        let resource = Resource {
            id: state.mint(),
            kind: ResourceKind::Voice,
            container_id: Some(spec.container_id),
            label: spec.label.clone(),
            metadata_tag: None,
        };
        state.access.insert(resource.id, spec.access.clone());
        state.resources.push(resource.clone());
        Ok(resource)
    }

    async fn list_resources(&self) -> Result<Vec<Resource>> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.check(Operation::ListResources, None)?;
        Ok(state.resources.clone())
    }

    async fn move_resource(&self, id: Snowflake, container_id: Snowflake) -> Result<()> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        let label = state.resource_label(id);
        state.check(Operation::MoveResource, label.as_deref())?;
        if !state.containers.iter().any(|c| c.id == container_id) {
            return Err(PlatformError::not_found("container", container_id));
        }
        state.resource_mut(id)?.container_id = Some(container_id);
        match state.access.get(&container_id).cloned() {
            Some(inherited) => state.access.insert(id, inherited),
            None => state.access.remove(&id),
        };
        Ok(())
    }

    async fn delete_resource(&self, id: Snowflake) -> Result<()> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        let label = state.resource_label(id);
        state.check(Operation::DeleteResource, label.as_deref())?;
        if label.is_none() {
            return Err(PlatformError::not_found("resource", id));
        }
        state.resources.retain(|r| r.id != id);
        state.access.remove(&id);
        Ok(())
    }

    async fn set_resource_access(&self, id: Snowflake, access: &[Overwrite]) -> Result<()> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        let label = state.resource_label(id);
        state.check(Operation::SetResourceAccess, label.as_deref())?;
        state.resource_mut(id)?;
        state.access.insert(id, access.to_vec());
        Ok(())
    }

    async fn set_resource_metadata_tag(&self, id: Snowflake, tag: &str) -> Result<()> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        let label = state.resource_label(id);
        state.check(Operation::SetMetadataTag, label.as_deref())?;
        state.resource_mut(id)?.metadata_tag = Some(tag.to_string());
        Ok(())
    }
}
