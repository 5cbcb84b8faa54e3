//! Result records returned by the lifecycle workflows.

use chrono::{DateTime, Utc};
use gs_platform::Snowflake;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slug::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    CreateText,
    CreateVoice,
    Move,
    SetAccess,
    SetTag,
    DeleteText,
    DeleteVoice,
    DeleteGroup,
    FindVoice,
    FindGroup,
}

/// Outcome of a single per-resource step, in the order it was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub action: StepAction,
    /// Label of the resource or group the step targeted.
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<Snowflake>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepOutcome {
    pub fn ok(action: StepAction, target: impl Into<String>, resource_id: Option<Snowflake>) -> Self {
        Self {
            action,
            target: target.into(),
            resource_id,
            error: None,
        }
    }

    pub fn failed(
        action: StepAction,
        target: impl Into<String>,
        resource_id: Option<Snowflake>,
        error: impl ToString,
    ) -> Self {
        Self {
            action,
            target: target.into(),
            resource_id,
            error: Some(error.to_string()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Common header of every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationInfo {
    pub operation_id: Uuid,
    pub display_name: String,
    pub identity: Identity,

    #[serde(serialize_with = "serialize_datetime")]
    pub started_at: DateTime<Utc>,

    #[serde(serialize_with = "serialize_datetime")]
    pub finished_at: DateTime<Utc>,
}

impl OperationInfo {
    pub(crate) fn start(display_name: &str, identity: &Identity) -> Self {
        let now = Utc::now();
        Self {
            operation_id: Uuid::new_v4(),
            display_name: display_name.to_string(),
            identity: identity.clone(),
            started_at: now,
            finished_at: now,
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReport {
    #[serde(flatten)]
    pub info: OperationInfo,
    pub group_id: Snowflake,
    /// Resources successfully created (banner, standard texts, voice).
    pub created: usize,
    pub failed: usize,
    pub steps: Vec<StepOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveReport {
    #[serde(flatten)]
    pub info: OperationInfo,
    /// Text resources now held by the archive container.
    pub moved: usize,
    pub voice_deleted: usize,
    pub group_deleted: bool,
    pub steps: Vec<StepOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnarchiveReport {
    #[serde(flatten)]
    pub info: OperationInfo,
    /// The freshly minted access group.
    pub group_id: Snowflake,
    pub moved: usize,
    pub voice_created: bool,
    pub steps: Vec<StepOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    #[serde(flatten)]
    pub info: OperationInfo,
    pub text_deleted: usize,
    pub voice_deleted: usize,
    pub group_deleted: bool,
    pub steps: Vec<StepOutcome>,
}

/// Failed steps of any report.
pub fn failures(steps: &[StepOutcome]) -> impl Iterator<Item = &StepOutcome> {
    steps.iter().filter(|s| !s.succeeded())
}

fn serialize_datetime<S>(dt: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&dt.to_rfc3339())
}
