//! Integration tests for gs-orchestrator
//!
//! Drives the four lifecycle workflows against the in-memory platform,
//! including injected per-resource and bootstrap failures.

mod common;

use std::collections::HashSet;

use common::{container, resources_in, setup, ADMIN_ROLE};
use gs_orchestrator::{
    Identity, LifecycleState, MatrixKind, OrchestratorError, StepAction, WorkspaceNaming,
};
use gs_platform::memory::Operation;
use gs_platform::{PrincipalKind, ResourceKind};

fn expected_texts() -> usize {
    WorkspaceNaming::default().text_count()
}

#[tokio::test]
async fn test_create_workspace() {
    let (platform, orchestrator) = setup();

    let report = orchestrator
        .create_workspace("Atlas Migration")
        .await
        .expect("Failed to create workspace");

    assert_eq!(report.info.identity.as_str(), "atlas-migration");
    assert_eq!(report.created, expected_texts() + 1);
    assert_eq!(report.failed, 0);

    let groups = platform.groups().await;
    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.id, report.group_id);
    assert_eq!(group.label, "PROJET — Atlas Migration");
    assert!(group.mentionable && group.hoisted);
    assert_ne!(group.color, 0);

    let active = container(&platform, "Projets").await.expect("active container");
    let resources = resources_in(&platform, active.id).await;
    assert_eq!(resources.len(), expected_texts() + 1);

    let banner = resources
        .iter()
        .find(|r| r.label.contains("═════ Atlas Migration ═════"))
        .expect("banner");
    assert!(banner.metadata_tag.as_deref().unwrap().ends_with("| BANNER"));

    let voice = resources.iter().find(|r| r.is_voice()).expect("voice");
    assert_eq!(voice.label, "vocal – réunion・p-atlas-migration");

    let identity = Identity::derive("Atlas Migration");
    for text in resources.iter().filter(|r| r.is_text()) {
        let tag = text.metadata_tag.as_deref().unwrap();
        assert!(orchestrator.codec().has_workspace(tag, &identity));
        assert_eq!(orchestrator.codec().extract_group_id(tag), Some(group.id));
        assert_eq!(
            platform.access_of(text.id).await.unwrap(),
            orchestrator
                .matrix()
                .compute(MatrixKind::Text, LifecycleState::Active, Some(group.id))
        );
    }
}

#[tokio::test]
async fn test_create_applies_container_baseline() {
    let (platform, orchestrator) = setup();
    orchestrator.create_workspace("Atlas").await.unwrap();

    let active = container(&platform, "Projets").await.unwrap();
    let access = platform.access_of(active.id).await.unwrap();
    assert_eq!(
        access,
        orchestrator
            .matrix()
            .compute(MatrixKind::Container, LifecycleState::Active, None)
    );
    assert!(access.iter().any(|o| o.principal == ADMIN_ROLE));
    assert_eq!(access.last().map(|o| o.kind), Some(PrincipalKind::Member));
}

#[tokio::test]
async fn test_create_then_archive() {
    let (platform, orchestrator) = setup();
    orchestrator.create_workspace("Atlas Migration").await.unwrap();

    let report = orchestrator
        .archive_workspace("Atlas Migration")
        .await
        .expect("Failed to archive workspace");

    assert_eq!(report.moved, expected_texts());
    assert_eq!(report.voice_deleted, 1);
    assert!(report.group_deleted);
    assert!(report.steps.iter().all(|s| s.succeeded()));

    let archive = container(&platform, "Archives").await.expect("archive container");
    let archived = resources_in(&platform, archive.id).await;
    assert_eq!(archived.len(), expected_texts());
    assert!(archived.iter().all(|r| r.kind == ResourceKind::Text));

    assert!(platform.groups().await.is_empty());
    assert!(platform.resources().await.iter().all(|r| !r.is_voice()));
    assert_eq!(
        platform.access_of(archive.id).await.unwrap(),
        orchestrator
            .matrix()
            .compute(MatrixKind::Container, LifecycleState::Archived, None)
    );
}

#[tokio::test]
async fn test_archived_texts_take_archive_baseline() {
    let (platform, orchestrator) = setup();
    let created = orchestrator.create_workspace("Atlas").await.unwrap();
    orchestrator.archive_workspace("Atlas").await.unwrap();

    let baseline = orchestrator
        .matrix()
        .compute(MatrixKind::Container, LifecycleState::Archived, None);
    let archive = container(&platform, "Archives").await.unwrap();
    for text in resources_in(&platform, archive.id).await {
        let access = platform.access_of(text.id).await.unwrap();
        assert_eq!(access, baseline, "{}", text.label);
        assert!(access.iter().all(|o| o.principal != created.group_id));

        let admin = access.iter().find(|o| o.principal == ADMIN_ROLE).unwrap();
        assert!(admin.allow.contains(gs_orchestrator::permissions::READ));
        assert!(admin.deny.contains(gs_platform::Permissions::SEND_MESSAGES));
    }
}

#[tokio::test]
async fn test_archive_missing_workspace_reports_zero() {
    let (_platform, orchestrator) = setup();

    let report = orchestrator.archive_workspace("Nowhere").await.unwrap();

    assert_eq!(report.moved, 0);
    assert_eq!(report.voice_deleted, 0);
    assert!(!report.group_deleted);
    assert!(report.steps.is_empty());
}

#[tokio::test]
async fn test_archive_twice_counts_already_archived() {
    let (_platform, orchestrator) = setup();
    orchestrator.create_workspace("Atlas").await.unwrap();
    orchestrator.archive_workspace("Atlas").await.unwrap();

    let again = orchestrator.archive_workspace("Atlas").await.unwrap();
    assert_eq!(again.moved, expected_texts());
    assert_eq!(again.voice_deleted, 0);
    assert!(!again.group_deleted);
    assert!(again.steps.iter().all(|s| s.action != StepAction::Move));
}

#[tokio::test]
async fn test_unarchive_mints_new_group() {
    let (platform, orchestrator) = setup();
    let created = orchestrator.create_workspace("Atlas").await.unwrap();
    orchestrator.archive_workspace("Atlas").await.unwrap();

    let report = orchestrator
        .unarchive_workspace("Atlas")
        .await
        .expect("Failed to unarchive workspace");

    assert_ne!(report.group_id, created.group_id);
    assert_eq!(report.moved, expected_texts());
    assert!(report.voice_created);

    let groups = platform.groups().await;
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, report.group_id);

    let active = container(&platform, "Projets").await.unwrap();
    let resources = resources_in(&platform, active.id).await;
    assert_eq!(resources.len(), expected_texts() + 1);

    let codec = orchestrator.codec();
    let mut roles = HashSet::new();
    for text in resources.iter().filter(|r| r.is_text()) {
        let tag = text.metadata_tag.as_deref().unwrap();
        assert_eq!(codec.extract_group_id(tag), Some(report.group_id));
        roles.insert(codec.extract_tag(tag).expect("role tag preserved"));
        assert_eq!(
            platform.access_of(text.id).await.unwrap(),
            orchestrator
                .matrix()
                .compute(MatrixKind::Text, LifecycleState::Active, Some(report.group_id))
        );
    }
    let known: HashSet<String> = WorkspaceNaming::default().known_roles().into_iter().collect();
    assert_eq!(roles, known);
}

#[tokio::test]
async fn test_unarchive_active_workspace_retires_live_group() {
    let (platform, orchestrator) = setup();
    let created = orchestrator.create_workspace("Atlas").await.unwrap();

    let report = orchestrator.unarchive_workspace("Atlas").await.unwrap();

    let groups = platform.groups().await;
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, report.group_id);
    assert_ne!(report.group_id, created.group_id);
    assert!(report.voice_created);
    assert!(report.steps.iter().all(|s| s.action != StepAction::CreateVoice));
    assert!(report
        .steps
        .iter()
        .any(|s| s.action == StepAction::DeleteGroup && s.resource_id == Some(created.group_id)));

    let voices = platform.resources().await.into_iter().filter(|r| r.is_voice()).count();
    assert_eq!(voices, 1);

    orchestrator.archive_workspace("Atlas").await.unwrap();
    assert!(platform.groups().await.is_empty());
}

#[tokio::test]
async fn test_unarchive_unknown_workspace_creates_nothing() {
    let (platform, orchestrator) = setup();

    let err = orchestrator.unarchive_workspace("Ghost").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::NotFound(ref id) if id == "ghost"));
    assert!(platform.groups().await.is_empty());
    assert!(platform.resources().await.is_empty());

    orchestrator.create_workspace("Ghost").await.unwrap();
    assert_eq!(platform.groups().await.len(), 1);
    let voices = platform.resources().await.into_iter().filter(|r| r.is_voice()).count();
    assert_eq!(voices, 1);
}

#[tokio::test]
async fn test_unarchive_twice_never_reuses_group() {
    let (_platform, orchestrator) = setup();
    orchestrator.create_workspace("Atlas").await.unwrap();

    let mut seen = HashSet::new();
    for _ in 0..3 {
        orchestrator.archive_workspace("Atlas").await.unwrap();
        let report = orchestrator.unarchive_workspace("Atlas").await.unwrap();
        assert!(seen.insert(report.group_id));
    }
}

#[tokio::test]
async fn test_delete_after_create_removes_everything() {
    let (platform, orchestrator) = setup();
    orchestrator.create_workspace("Atlas").await.unwrap();

    let report = orchestrator.delete_workspace("Atlas").await.unwrap();

    assert_eq!(report.text_deleted, expected_texts());
    assert_eq!(report.voice_deleted, 1);
    assert!(report.group_deleted);

    assert!(platform.resources().await.is_empty());
    assert!(platform.groups().await.is_empty());
    let remaining = orchestrator
        .discovery()
        .find_text_resources(&Identity::derive("Atlas"))
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn test_delete_reaches_archived_resources() {
    let (platform, orchestrator) = setup();
    orchestrator.create_workspace("Atlas").await.unwrap();
    orchestrator.archive_workspace("Atlas").await.unwrap();

    let report = orchestrator.delete_workspace("Atlas").await.unwrap();

    assert_eq!(report.text_deleted, expected_texts());
    assert_eq!(report.voice_deleted, 0);
    assert!(!report.group_deleted);
    assert!(platform.resources().await.is_empty());
}

#[tokio::test]
async fn test_prefix_sharing_workspaces_stay_separate() {
    let (platform, orchestrator) = setup();
    orchestrator.create_workspace("Atlas").await.unwrap();
    orchestrator.create_workspace("Atlas Migration").await.unwrap();

    let report = orchestrator.archive_workspace("Atlas").await.unwrap();
    assert_eq!(report.moved, expected_texts());

    let active = container(&platform, "Projets").await.unwrap();
    let still_active = resources_in(&platform, active.id).await;
    assert_eq!(still_active.len(), expected_texts() + 1);
    assert_eq!(platform.groups().await.len(), 1);
    assert_eq!(platform.groups().await[0].label, "PROJET — Atlas Migration");
}

#[tokio::test]
async fn test_duplicate_identity_is_rejected() {
    let (platform, orchestrator) = setup();
    orchestrator.create_workspace("Atlas Migration").await.unwrap();
    let before = platform.resources().await.len();

    let err = orchestrator
        .create_workspace("atlas  migration!")
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::AlreadyExists(ref id) if id == "atlas-migration"));
    assert_eq!(platform.resources().await.len(), before);
    assert_eq!(platform.groups().await.len(), 1);
}

#[tokio::test]
async fn test_archived_identity_is_also_taken() {
    let (_platform, orchestrator) = setup();
    orchestrator.create_workspace("Atlas").await.unwrap();
    orchestrator.archive_workspace("Atlas").await.unwrap();

    let err = orchestrator.create_workspace("Atlas").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::AlreadyExists(_)));
}

#[tokio::test]
async fn test_concurrent_creates_are_serialized() {
    let (platform, orchestrator) = setup();
    let other = orchestrator.clone();

    let (first, second) = tokio::join!(
        orchestrator.create_workspace("Atlas"),
        other.create_workspace("Atlas"),
    );

    let outcomes = [first.is_ok(), second.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
    assert_eq!(platform.groups().await.len(), 1);
    assert_eq!(platform.resources().await.len(), expected_texts() + 1);
}

#[tokio::test]
async fn test_group_bootstrap_failure_aborts_create() {
    let (platform, orchestrator) = setup();
    platform.fail_always(Operation::CreateGroup).await;

    let err = orchestrator.create_workspace("Atlas").await.unwrap_err();

    assert!(err.is_bootstrap());
    assert!(err.to_string().contains("PROJET — Atlas"));
    assert!(platform.resources().await.is_empty());
    assert_eq!(platform.call_count(Operation::CreateText).await, 0);
}

#[tokio::test]
async fn test_container_bootstrap_failure_aborts_archive() {
    let (platform, orchestrator) = setup();
    orchestrator.create_workspace("Atlas").await.unwrap();
    platform
        .fail_for_label(Operation::CreateContainer, "Archives")
        .await;

    let err = orchestrator.archive_workspace("Atlas").await.unwrap_err();

    assert!(err.is_bootstrap());
    assert_eq!(platform.call_count(Operation::MoveResource).await, 0);
    assert_eq!(platform.groups().await.len(), 1);
}

#[tokio::test]
async fn test_failed_creation_is_isolated() {
    let (platform, orchestrator) = setup();
    platform
        .fail_for_label(Operation::CreateText, "discussion")
        .await;

    let report = orchestrator.create_workspace("Atlas").await.unwrap();

    assert_eq!(report.created, expected_texts());
    assert_eq!(report.failed, 1);
    let failed: Vec<_> = report.steps.iter().filter(|s| !s.succeeded()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].target, "discussion");
    assert_eq!(failed[0].action, StepAction::CreateText);
    assert!(platform.resources().await.iter().all(|r| r.label != "discussion"));
}

#[tokio::test]
async fn test_failed_move_does_not_stop_archive() {
    let (platform, orchestrator) = setup();
    orchestrator.create_workspace("Atlas").await.unwrap();
    platform
        .fail_for_label(Operation::MoveResource, "retours")
        .await;

    let report = orchestrator.archive_workspace("Atlas").await.unwrap();

    assert_eq!(report.moved, expected_texts() - 1);
    assert_eq!(report.voice_deleted, 1);
    assert!(report.group_deleted);

    let failed: Vec<_> = report.steps.iter().filter(|s| !s.succeeded()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].target, "retours");
}

#[tokio::test]
async fn test_failed_voice_creation_on_unarchive() {
    let (platform, orchestrator) = setup();
    orchestrator.create_workspace("Atlas").await.unwrap();
    orchestrator.archive_workspace("Atlas").await.unwrap();
    platform.fail_always(Operation::CreateVoice).await;

    let report = orchestrator.unarchive_workspace("Atlas").await.unwrap();

    assert!(!report.voice_created);
    assert_eq!(report.moved, expected_texts());
    assert!(report
        .steps
        .iter()
        .any(|s| s.action == StepAction::CreateVoice && !s.succeeded()));
}

#[tokio::test]
async fn test_legacy_tags_are_discovered() {
    let (platform, orchestrator) = setup();
    let group = platform.insert_group("PROJET — Atlas", 0x336699).await;
    let active = gs_platform::PlatformClient::create_container(platform.as_ref(), "Projets")
        .await
        .unwrap();

    for role in ["BRIEF", "RETOURS"] {
        platform
            .insert_resource(
                ResourceKind::Text,
                &role.to_lowercase(),
                Some(active.id),
                Some(&format!("PROJECT:atlas | ROLE:{} | {role}", group.id)),
            )
            .await;
    }

    let report = orchestrator.archive_workspace("Atlas").await.unwrap();
    assert_eq!(report.moved, 2);
    assert!(report.group_deleted);

    let unarchived = orchestrator.unarchive_workspace("Atlas").await.unwrap();
    for text in platform.resources().await.iter().filter(|r| r.is_text()) {
        let tag = text.metadata_tag.as_deref().unwrap();
        assert!(tag.starts_with("WORKSPACE:atlas | GROUP:"));
        assert_eq!(
            orchestrator.codec().extract_group_id(tag),
            Some(unarchived.group_id)
        );
    }
}

#[tokio::test]
async fn test_group_found_by_label_when_tags_lack_it() {
    let (platform, orchestrator) = setup();
    let group = platform.insert_group("PROJET — Atlas", 0x336699).await;
    platform
        .insert_resource(ResourceKind::Text, "brief", None, Some("WORKSPACE:atlas | BRIEF"))
        .await;

    let report = orchestrator.delete_workspace("Atlas").await.unwrap();

    assert_eq!(report.text_deleted, 1);
    assert!(report.group_deleted);
    assert!(platform.groups().await.iter().all(|g| g.id != group.id));
}

#[tokio::test]
async fn test_groups_get_distinct_colors() {
    let (platform, orchestrator) = setup();
    for name in ["Atlas", "Orion", "Vega", "Lyra"] {
        orchestrator.create_workspace(name).await.unwrap();
    }

    let colors: HashSet<u32> = platform.groups().await.iter().map(|g| g.color).collect();
    assert_eq!(colors.len(), 4);
    assert!(!colors.contains(&0));
}

#[tokio::test]
async fn test_serial_creation_limit() {
    let platform = std::sync::Arc::new(gs_platform::memory::MemoryPlatform::new());
    let settings = gs_orchestrator::OrchestratorSettings {
        create_concurrency: 1,
        ..common::settings()
    };
    let orchestrator = gs_orchestrator::WorkspaceOrchestrator::new(platform.clone(), settings);

    let report = orchestrator.create_workspace("Atlas").await.unwrap();
    assert_eq!(report.created, expected_texts() + 1);
    assert_eq!(platform.call_count(Operation::CreateText).await, expected_texts());
    assert_eq!(platform.call_count(Operation::CreateVoice).await, 1);
}
