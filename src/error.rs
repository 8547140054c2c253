use thiserror::Error;

/// Errors surfaced by the `spread` binary and the HTTP endpoint.
///
/// The reconciliation core never produces these: sparse or empty inputs
/// degrade to default values instead. Only collaborators, configuration and
/// file/socket handling fail.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    /// A collaborator fetch failed (transport error or non-success status).
    #[error("{provider} unavailable: {message}")]
    UpstreamUnavailable { provider: String, message: String },

    /// A required credential or setting is missing or unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Bad command-line input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Export, report or socket I/O failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl AppError {
    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::InvalidInput(_) | AppError::Configuration(_) => 2,
            AppError::Io(_) => 3,
            AppError::UpstreamUnavailable { .. } => 4,
        }
    }
}
