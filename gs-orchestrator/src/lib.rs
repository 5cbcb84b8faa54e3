//! Workspace lifecycle orchestration
//!
//! This crate contains the core logic for managing project workspaces inside
//! a shared collaboration space: a bundle of text resources, one voice
//! resource and an access group, moved between an active and an archive
//! container. It talks to the outside world only through
//! [`gs_platform::PlatformClient`], so it can be driven by the CLI, a bot
//! front-end, or the in-memory platform in tests.

pub mod category;
pub mod color;
pub mod discovery;
pub mod error;
pub mod limiter;
pub mod locks;
pub mod naming;
pub mod permissions;
pub mod report;
pub mod slug;
pub mod tag;
pub mod workspace;

pub use error::{OrchestratorError, Result};
pub use limiter::{run_bounded, DEFAULT_CONCURRENCY};
pub use naming::WorkspaceNaming;
pub use permissions::{LifecycleState, MatrixKind, PermissionMatrix};
pub use report::{
    ArchiveReport, CreateReport, DeleteReport, OperationInfo, StepAction, StepOutcome,
    UnarchiveReport,
};
pub use slug::{derive_identity, Identity};
pub use tag::{TagCodec, WorkspaceTag};
pub use workspace::{OrchestratorSettings, WorkspaceOrchestrator};
