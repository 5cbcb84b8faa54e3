use gs_platform::PlatformError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// A container or group the workflow depends on could not be set up.
    #[error("Failed to {step}: {source}")]
    Bootstrap {
        step: String,
        #[source]
        source: PlatformError,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Workspace already exists: {0}")]
    AlreadyExists(String),

    #[error("No workspace found: {0}")]
    NotFound(String),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl OrchestratorError {
    pub fn bootstrap(step: impl Into<String>, source: PlatformError) -> Self {
        Self::Bootstrap {
            step: step.into(),
            source,
        }
    }

    pub fn is_bootstrap(&self) -> bool {
        matches!(self, OrchestratorError::Bootstrap { .. })
    }
}
