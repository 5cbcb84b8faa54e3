use std::sync::Arc;

use gs_platform::{
    Group, GroupSpec, PlatformClient, Resource, Snowflake, TextResourceSpec, VoiceResourceSpec,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::category::CategoryResolver;
use crate::color::{allocate_color, used_colors};
use crate::discovery::ResourceDiscovery;
use crate::error::{OrchestratorError, Result};
use crate::limiter::{run_bounded, DEFAULT_CONCURRENCY};
use crate::locks::IdentityLocks;
use crate::naming::{WorkspaceNaming, BANNER_TAG};
use crate::permissions::{LifecycleState, MatrixKind, PermissionMatrix};
use crate::report::{
    ArchiveReport, CreateReport, DeleteReport, OperationInfo, StepAction, StepOutcome,
    UnarchiveReport,
};
use crate::slug::Identity;
use crate::tag::TagCodec;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Label of the container holding active workspaces.
    pub active_container: String,
    /// Label of the container holding archived workspaces.
    pub archive_container: String,
    /// Principals granted read access on both containers.
    pub admin_principals: Vec<Snowflake>,
    /// Upper bound on concurrent resource creations.
    pub create_concurrency: usize,
    pub naming: WorkspaceNaming,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            active_container: "Projets".to_string(),
            archive_container: "Archives".to_string(),
            admin_principals: Vec::new(),
            create_concurrency: DEFAULT_CONCURRENCY,
            naming: WorkspaceNaming::default(),
        }
    }
}

/// A resource `create` is about to issue.
enum Planned {
    Text(TextResourceSpec),
    Voice(VoiceResourceSpec),
}

impl Planned {
    fn label(&self) -> &str {
        match self {
            Planned::Text(spec) => &spec.label,
            Planned::Voice(spec) => &spec.label,
        }
    }

    fn action(&self) -> StepAction {
        match self {
            Planned::Text(_) => StepAction::CreateText,
            Planned::Voice(_) => StepAction::CreateVoice,
        }
    }
}

/// Drives the create / archive / unarchive / delete lifecycle of workspaces.
///
/// Holds no workspace state of its own: every call re-reads the platform's
/// registries. Calls on the same identity are serialized across clones.
#[derive(Clone)]
pub struct WorkspaceOrchestrator {
    platform: Arc<dyn PlatformClient>,
    settings: Arc<OrchestratorSettings>,
    matrix: PermissionMatrix,
    codec: TagCodec,
    locks: IdentityLocks,
}

impl WorkspaceOrchestrator {
    pub fn new(platform: Arc<dyn PlatformClient>, settings: OrchestratorSettings) -> Self {
        let matrix = PermissionMatrix::new(
            platform.everyone_id(),
            platform.service_id(),
            settings.admin_principals.clone(),
        );
        let codec = TagCodec::new(settings.naming.known_roles());

        Self {
            platform,
            settings: Arc::new(settings),
            matrix,
            codec,
            locks: IdentityLocks::new(),
        }
    }

    pub fn platform(&self) -> &Arc<dyn PlatformClient> {
        &self.platform
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn matrix(&self) -> &PermissionMatrix {
        &self.matrix
    }

    pub fn codec(&self) -> &TagCodec {
        &self.codec
    }

    pub fn discovery(&self) -> ResourceDiscovery<'_> {
        ResourceDiscovery::new(self.platform.as_ref(), &self.codec, &self.settings.naming)
    }

    fn categories(&self) -> CategoryResolver<'_> {
        CategoryResolver::new(self.platform.as_ref(), &self.matrix)
    }

    fn identity_for(display_name: &str) -> Result<Identity> {
        let identity = Identity::derive(display_name);
        if identity.is_empty() {
            return Err(OrchestratorError::InvalidInput(format!(
                "'{display_name}' does not contain any letter or digit"
            )));
        }
        Ok(identity)
    }

    /// Create a workspace: access group, banner, standard texts and voice.
    ///
    /// Fails without creating anything if resources tagged with the same
    /// identity already exist, active or archived.
    #[instrument(skip(self), fields(identity = tracing::field::Empty))]
    pub async fn create_workspace(&self, display_name: &str) -> Result<CreateReport> {
        let display_name = display_name.trim();
        let identity = Self::identity_for(display_name)?;
        tracing::Span::current().record("identity", identity.as_str());

        let _guard = self.locks.acquire(&identity).await;
        let info = OperationInfo::start(display_name, &identity);

        let existing = self.discovery().find_text_resources(&identity).await?;
        if !existing.is_empty() {
            return Err(OrchestratorError::AlreadyExists(identity.to_string()));
        }

        let active = self
            .categories()
            .resolve(&self.settings.active_container, LifecycleState::Active)
            .await?;
        let group = self.create_group(display_name).await?;
        info!(group_id = %group.id, "Access group created");

        let planned = self.plan_resources(display_name, &identity, active.id, group.id);
        let platform = self.platform.as_ref();
        let tasks: Vec<_> = planned
            .iter()
            .map(|item| move || async move {
                match item {
                    Planned::Text(spec) => platform.create_text_resource(spec).await,
                    Planned::Voice(spec) => platform.create_voice_resource(spec).await,
                }
            })
            .collect();

        let results = run_bounded(tasks, self.settings.create_concurrency).await;

        let steps: Vec<StepOutcome> = planned
            .iter()
            .zip(results)
            .map(|(item, result)| match result {
                Ok(resource) => StepOutcome::ok(item.action(), item.label(), Some(resource.id)),
                Err(e) => {
                    warn!(label = item.label(), error = %e, "Failed to create resource");
                    StepOutcome::failed(item.action(), item.label(), None, e)
                }
            })
            .collect();

        let created = steps.iter().filter(|s| s.succeeded()).count();
        let failed = steps.len() - created;
        info!(created, failed, "Workspace created");

        Ok(CreateReport {
            info: info.finish(),
            group_id: group.id,
            created,
            failed,
            steps,
        })
    }

    /// Move a workspace's texts to the archive container and drop its voice
    /// resource and access group.
    #[instrument(skip(self), fields(identity = tracing::field::Empty))]
    pub async fn archive_workspace(&self, display_name: &str) -> Result<ArchiveReport> {
        let display_name = display_name.trim();
        let identity = Self::identity_for(display_name)?;
        tracing::Span::current().record("identity", identity.as_str());

        let _guard = self.locks.acquire(&identity).await;
        let info = OperationInfo::start(display_name, &identity);

        let categories = self.categories();
        categories
            .resolve(&self.settings.active_container, LifecycleState::Active)
            .await?;
        let archive = categories
            .resolve(&self.settings.archive_container, LifecycleState::Archived)
            .await?;

        let texts = self.discovery().find_text_resources(&identity).await?;
        let mut steps = Vec::new();
        let mut moved = 0;

        for resource in &texts {
            if resource.container_id == Some(archive.id) {
                debug!(id = %resource.id, label = %resource.label, "Already archived");
                moved += 1;
                continue;
            }
            let result = self.platform.move_resource(resource.id, archive.id).await;
            if record(&mut steps, StepAction::Move, resource, result) {
                moved += 1;
            }
        }

        let voice_deleted = self.delete_voice(&identity, &mut steps).await;
        let group_deleted = self.delete_group(&texts, display_name, &mut steps).await;

        info!(moved, voice_deleted, group_deleted, "Workspace archived");
        Ok(ArchiveReport {
            info: info.finish(),
            moved,
            voice_deleted,
            group_deleted,
            steps,
        })
    }

    /// Bring an archived workspace back under a freshly minted access group.
    ///
    /// A group still alive from an earlier activation is deleted first, so
    /// the workspace never holds two groups.
    #[instrument(skip(self), fields(identity = tracing::field::Empty))]
    pub async fn unarchive_workspace(&self, display_name: &str) -> Result<UnarchiveReport> {
        let display_name = display_name.trim();
        let identity = Self::identity_for(display_name)?;
        tracing::Span::current().record("identity", identity.as_str());

        let _guard = self.locks.acquire(&identity).await;
        let info = OperationInfo::start(display_name, &identity);

        let categories = self.categories();
        categories
            .resolve(&self.settings.archive_container, LifecycleState::Archived)
            .await?;
        let active = categories
            .resolve(&self.settings.active_container, LifecycleState::Active)
            .await?;

        let texts = self.discovery().find_text_resources(&identity).await?;
        if texts.is_empty() {
            return Err(OrchestratorError::NotFound(identity.to_string()));
        }

        let mut steps = Vec::new();
        self.retire_group(&texts, display_name, &mut steps).await?;

        let group = self.create_group(display_name).await?;
        info!(group_id = %group.id, "Access group recreated");

        let text_access = self
            .matrix
            .compute(MatrixKind::Text, LifecycleState::Active, Some(group.id));
        let mut moved = 0;

        for resource in &texts {
            let in_place = if resource.container_id == Some(active.id) {
                true
            } else {
                let result = self.platform.move_resource(resource.id, active.id).await;
                record(&mut steps, StepAction::Move, resource, result)
            };
            if in_place {
                moved += 1;
            }

            let result = self
                .platform
                .set_resource_access(resource.id, &text_access)
                .await;
            record(&mut steps, StepAction::SetAccess, resource, result);

            let role = resource
                .metadata_tag
                .as_deref()
                .and_then(|tag| self.codec.extract_tag(tag));
            let tag = self.codec.encode(&identity, Some(group.id), role.as_deref());
            let result = self
                .platform
                .set_resource_metadata_tag(resource.id, &tag)
                .await;
            record(&mut steps, StepAction::SetTag, resource, result);
        }

        let voice_created = self
            .restore_voice(&identity, active.id, group.id, &mut steps)
            .await;

        info!(moved, voice_created, "Workspace unarchived");
        Ok(UnarchiveReport {
            info: info.finish(),
            group_id: group.id,
            moved,
            voice_created,
            steps,
        })
    }

    /// Remove every resource and the access group of a workspace, wherever
    /// its resources currently live.
    #[instrument(skip(self), fields(identity = tracing::field::Empty))]
    pub async fn delete_workspace(&self, display_name: &str) -> Result<DeleteReport> {
        let display_name = display_name.trim();
        let identity = Self::identity_for(display_name)?;
        tracing::Span::current().record("identity", identity.as_str());

        let _guard = self.locks.acquire(&identity).await;
        let info = OperationInfo::start(display_name, &identity);

        let texts = self.discovery().find_text_resources(&identity).await?;
        let mut steps = Vec::new();
        let mut text_deleted = 0;

        for resource in &texts {
            let result = self.platform.delete_resource(resource.id).await;
            if record(&mut steps, StepAction::DeleteText, resource, result) {
                text_deleted += 1;
            }
        }

        let voice_deleted = self.delete_voice(&identity, &mut steps).await;
        let group_deleted = self.delete_group(&texts, display_name, &mut steps).await;

        info!(text_deleted, voice_deleted, group_deleted, "Workspace deleted");
        Ok(DeleteReport {
            info: info.finish(),
            text_deleted,
            voice_deleted,
            group_deleted,
            steps,
        })
    }

    async fn create_group(&self, display_name: &str) -> Result<Group> {
        let label = self.settings.naming.group_label(display_name);
        let groups = self
            .platform
            .list_groups()
            .await
            .map_err(|e| OrchestratorError::bootstrap("list groups", e))?;

        let color = {
            let mut rng = rand::rng();
            allocate_color(&used_colors(&groups), &mut rng)
        };

        let spec = GroupSpec {
            label: label.clone(),
            color,
            mentionable: true,
            hoisted: true,
        };
        self.platform
            .create_group(&spec)
            .await
            .map_err(|e| OrchestratorError::bootstrap(format!("create group {label}"), e))
    }

    fn plan_resources(
        &self,
        display_name: &str,
        identity: &Identity,
        container_id: Snowflake,
        group_id: Snowflake,
    ) -> Vec<Planned> {
        let naming = &self.settings.naming;
        let text_access = self
            .matrix
            .compute(MatrixKind::Text, LifecycleState::Active, Some(group_id));
        let emoji = {
            let mut rng = rand::rng();
            naming.pick_emoji(&mut rng).to_string()
        };

        let mut planned = Vec::with_capacity(naming.text_count() + 1);
        planned.push(Planned::Text(TextResourceSpec {
            label: naming.banner_label(display_name, &emoji),
            container_id,
            metadata_tag: self.codec.encode(identity, Some(group_id), Some(BANNER_TAG)),
            access: text_access.clone(),
        }));

        for label in &naming.standard_texts {
            let role = WorkspaceNaming::role_tag(label);
            planned.push(Planned::Text(TextResourceSpec {
                label: label.clone(),
                container_id,
                metadata_tag: self.codec.encode(identity, Some(group_id), Some(&role)),
                access: text_access.clone(),
            }));
        }

        planned.push(Planned::Voice(VoiceResourceSpec {
            label: naming.voice_label(identity),
            container_id,
            access: self
                .matrix
                .compute(MatrixKind::Voice, LifecycleState::Active, Some(group_id)),
        }));

        planned
    }

    async fn delete_voice(&self, identity: &Identity, steps: &mut Vec<StepOutcome>) -> usize {
        match self.discovery().find_voice_resource(identity).await {
            Ok(Some(voice)) => {
                let result = self.platform.delete_resource(voice.id).await;
                usize::from(record(steps, StepAction::DeleteVoice, &voice, result))
            }
            Ok(None) => 0,
            Err(e) => {
                let label = self.settings.naming.voice_label(identity);
                warn!(label = %label, error = %e, "Failed to look up voice resource");
                steps.push(StepOutcome::failed(StepAction::FindVoice, label, None, e));
                0
            }
        }
    }

    async fn delete_group(
        &self,
        texts: &[Resource],
        display_name: &str,
        steps: &mut Vec<StepOutcome>,
    ) -> bool {
        let label = self.settings.naming.group_label(display_name);
        match self.discovery().find_group(texts, display_name).await {
            Ok(Some(group)) => match self.platform.delete_group(group.id).await {
                Ok(()) => {
                    steps.push(StepOutcome::ok(StepAction::DeleteGroup, group.label, Some(group.id)));
                    true
                }
                Err(e) => {
                    warn!(group_id = %group.id, error = %e, "Failed to delete access group");
                    steps.push(StepOutcome::failed(
                        StepAction::DeleteGroup,
                        group.label,
                        Some(group.id),
                        e,
                    ));
                    false
                }
            },
            Ok(None) => {
                debug!(label = %label, "No access group to delete");
                false
            }
            Err(e) => {
                warn!(label = %label, error = %e, "Failed to look up access group");
                steps.push(StepOutcome::failed(StepAction::FindGroup, label, None, e));
                false
            }
        }
    }

    /// Delete a group left over from an earlier activation. Failing to do so
    /// aborts the workflow before a second group is minted.
    async fn retire_group(
        &self,
        texts: &[Resource],
        display_name: &str,
        steps: &mut Vec<StepOutcome>,
    ) -> Result<()> {
        let stale = self
            .discovery()
            .find_group(texts, display_name)
            .await
            .map_err(|e| OrchestratorError::bootstrap("look up access group", e))?;
        let Some(stale) = stale else {
            return Ok(());
        };

        self.platform
            .delete_group(stale.id)
            .await
            .map_err(|e| OrchestratorError::bootstrap(format!("delete group {}", stale.label), e))?;
        info!(group_id = %stale.id, "Retired live access group");
        steps.push(StepOutcome::ok(StepAction::DeleteGroup, stale.label, Some(stale.id)));
        Ok(())
    }

    /// Recreate the voice resource, or move back and re-grant a leftover one.
    async fn restore_voice(
        &self,
        identity: &Identity,
        container_id: Snowflake,
        group_id: Snowflake,
        steps: &mut Vec<StepOutcome>,
    ) -> bool {
        let label = self.settings.naming.voice_label(identity);
        let access = self
            .matrix
            .compute(MatrixKind::Voice, LifecycleState::Active, Some(group_id));

        match self.discovery().find_voice_resource(identity).await {
            Ok(Some(voice)) => {
                debug!(id = %voice.id, "Reusing existing voice resource");
                let moved = if voice.container_id == Some(container_id) {
                    true
                } else {
                    let result = self.platform.move_resource(voice.id, container_id).await;
                    record(steps, StepAction::Move, &voice, result)
                };
                let result = self.platform.set_resource_access(voice.id, &access).await;
                let granted = record(steps, StepAction::SetAccess, &voice, result);
                moved && granted
            }
            Ok(None) => {
                let spec = VoiceResourceSpec {
                    label: label.clone(),
                    container_id,
                    access,
                };
                match self.platform.create_voice_resource(&spec).await {
                    Ok(voice) => {
                        steps.push(StepOutcome::ok(StepAction::CreateVoice, label, Some(voice.id)));
                        true
                    }
                    Err(e) => {
                        warn!(label = %label, error = %e, "Failed to create voice resource");
                        steps.push(StepOutcome::failed(StepAction::CreateVoice, label, None, e));
                        false
                    }
                }
            }
            Err(e) => {
                warn!(label = %label, error = %e, "Failed to look up voice resource");
                steps.push(StepOutcome::failed(StepAction::FindVoice, label, None, e));
                false
            }
        }
    }
}

/// Push the outcome of a per-resource step, returning whether it succeeded.
fn record(
    steps: &mut Vec<StepOutcome>,
    action: StepAction,
    resource: &Resource,
    result: gs_platform::Result<()>,
) -> bool {
    match result {
        Ok(()) => {
            steps.push(StepOutcome::ok(action, &resource.label, Some(resource.id)));
            true
        }
        Err(e) => {
            warn!(
                ?action,
                id = %resource.id,
                label = %resource.label,
                error = %e,
                "Resource step failed"
            );
            steps.push(StepOutcome::failed(action, &resource.label, Some(resource.id), e));
            false
        }
    }
}
