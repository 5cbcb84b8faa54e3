//! Locating the resources and group that belong to a workspace.
//!
//! Text resources are found by their metadata marker wherever they live, so
//! active and archived workspaces are discovered the same way. The voice
//! resource is found by its deterministic label. The group id comes from
//! the metadata tags first and from the group label as a fallback, since
//! tags may be missing or stale on older resources.

use gs_platform::{Group, PlatformClient, Resource, Result, Snowflake};

use crate::naming::WorkspaceNaming;
use crate::slug::Identity;
use crate::tag::TagCodec;

pub struct ResourceDiscovery<'a> {
    platform: &'a dyn PlatformClient,
    codec: &'a TagCodec,
    naming: &'a WorkspaceNaming,
}

impl<'a> ResourceDiscovery<'a> {
    pub fn new(
        platform: &'a dyn PlatformClient,
        codec: &'a TagCodec,
        naming: &'a WorkspaceNaming,
    ) -> Self {
        Self {
            platform,
            codec,
            naming,
        }
    }

    pub async fn find_text_resources(&self, identity: &Identity) -> Result<Vec<Resource>> {
        let resources = self.platform.list_resources().await?;
        Ok(resources
            .into_iter()
            .filter(|r| r.is_text())
            .filter(|r| {
                r.metadata_tag
                    .as_deref()
                    .is_some_and(|tag| self.codec.has_workspace(tag, identity))
            })
            .collect())
    }

    pub async fn find_voice_resource(&self, identity: &Identity) -> Result<Option<Resource>> {
        let label = self.naming.voice_label(identity);
        let resources = self.platform.list_resources().await?;
        Ok(resources
            .into_iter()
            .find(|r| r.is_voice() && r.label == label))
    }

    /// The live group of a workspace, if any.
    pub async fn find_group(&self, resources: &[Resource], display_name: &str) -> Result<Option<Group>> {
        let groups = self.platform.list_groups().await?;
        let label = self.naming.group_label(display_name);
        let id = resolve_group_id(self.codec, resources, &groups, &label);
        Ok(id.and_then(|id| groups.into_iter().find(|g| g.id == id)))
    }
}

/// Group id of a workspace from its text resources' tags, falling back to
/// the group carrying `group_label`.
///
/// A tagged id that no longer names a live group counts as stale and also
/// falls through to the label match.
pub fn resolve_group_id(
    codec: &TagCodec,
    resources: &[Resource],
    groups: &[Group],
    group_label: &str,
) -> Option<Snowflake> {
    let tagged = resources
        .iter()
        .filter_map(|r| r.metadata_tag.as_deref())
        .find_map(|tag| codec.extract_group_id(tag));

    match tagged {
        Some(id) if groups.iter().any(|g| g.id == id) => Some(id),
        _ => groups.iter().find(|g| g.label == group_label).map(|g| g.id),
    }
}
