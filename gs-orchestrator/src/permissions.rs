//! Access matrices per resource kind and lifecycle state.
//!
//! The model is closed by default: `everyone` loses visibility first, then
//! the workspace group (or, on containers, the administrative principals)
//! gets read access, interactive rights only while active, and the service
//! identity keeps management rights in every state.

use gs_platform::{Overwrite, Permissions, Snowflake};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatrixKind {
    Container,
    Text,
    Voice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Active,
    Archived,
}

pub const READ: Permissions = Permissions::VIEW_CHANNEL.union(Permissions::READ_MESSAGE_HISTORY);

pub const TEXT_INTERACTIVE: Permissions = Permissions::SEND_MESSAGES
    .union(Permissions::ATTACH_FILES)
    .union(Permissions::ADD_REACTIONS);

pub const VOICE_INTERACTIVE: Permissions = Permissions::CONNECT
    .union(Permissions::SPEAK)
    .union(Permissions::STREAM);

/// Denied to members and administrators while archived.
pub const ARCHIVE_DENY: Permissions = Permissions::SEND_MESSAGES
    .union(Permissions::SEND_MESSAGES_IN_THREADS)
    .union(Permissions::CREATE_PUBLIC_THREADS)
    .union(Permissions::CREATE_PRIVATE_THREADS)
    .union(Permissions::EMBED_LINKS)
    .union(Permissions::ATTACH_FILES)
    .union(Permissions::ADD_REACTIONS)
    .union(Permissions::CREATE_INSTANT_INVITE)
    .union(Permissions::CONNECT)
    .union(Permissions::SPEAK)
    .union(Permissions::STREAM);

/// Always granted to the service identity.
pub const SERVICE_GRANT: Permissions = Permissions::VIEW_CHANNEL
    .union(Permissions::MANAGE_CHANNELS)
    .union(Permissions::MANAGE_ROLES)
    .union(Permissions::MANAGE_THREADS)
    .union(Permissions::MOVE_MEMBERS)
    .union(Permissions::READ_MESSAGE_HISTORY)
    .union(Permissions::SEND_MESSAGES)
    .union(Permissions::EMBED_LINKS)
    .union(Permissions::ATTACH_FILES)
    .union(Permissions::ADD_REACTIONS)
    .union(Permissions::CONNECT)
    .union(Permissions::SPEAK)
    .union(Permissions::STREAM);

fn interactive(kind: MatrixKind) -> Permissions {
    match kind {
        MatrixKind::Container => Permissions::NONE,
        MatrixKind::Text => TEXT_INTERACTIVE,
        MatrixKind::Voice => VOICE_INTERACTIVE,
    }
}

/// Principals that appear in every matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionMatrix {
    pub everyone: Snowflake,
    pub service: Snowflake,
    pub admins: Vec<Snowflake>,
}

impl PermissionMatrix {
    pub fn new(everyone: Snowflake, service: Snowflake, admins: Vec<Snowflake>) -> Self {
        Self {
            everyone,
            service,
            admins,
        }
    }

    /// Full overwrite set for `kind` in `state`.
    ///
    /// `group` is the workspace's access group and is ignored for
    /// containers, which are shared across workspaces.
    pub fn compute(
        &self,
        kind: MatrixKind,
        state: LifecycleState,
        group: Option<Snowflake>,
    ) -> Vec<Overwrite> {
        let members: Vec<Snowflake> = match kind {
            MatrixKind::Container => self.admins.clone(),
            MatrixKind::Text | MatrixKind::Voice => group.into_iter().collect(),
        };

        let (allow, deny) = match state {
            LifecycleState::Active => (READ | interactive(kind), Permissions::NONE),
            LifecycleState::Archived => (READ, ARCHIVE_DENY),
        };

        let mut matrix = Vec::with_capacity(members.len() + 2);
        matrix.push(Overwrite::role(
            self.everyone,
            Permissions::NONE,
            Permissions::VIEW_CHANNEL,
        ));
        matrix.extend(
            members
                .into_iter()
                .map(|principal| Overwrite::role(principal, allow, deny)),
        );
        matrix.push(Overwrite::member(self.service, SERVICE_GRANT, Permissions::NONE));
        matrix
    }
}
