//! Crate error types.

use thiserror::Error;

/// Errors surfaced by the workflow engine.
///
/// Two of these form the "expected" class (`Failed`, `UnknownWorkflow`):
/// a handler or dispatcher signaling that a run cannot proceed. Boundaries
/// treat those quietly: the CLI prints the bare message and exits 1, the
/// background boundaries swallow them after logging. Everything else is an
/// unexpected fault and is surfaced loudly.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A handler signaled an expected, unrecoverable failure via
    /// [`Runner::fail`](crate::runner::Runner::fail).
    #[error("{0}")]
    Failed(String),

    /// No handler is registered under the requested name.
    #[error("Unknown workflow: {0}")]
    UnknownWorkflow(String),

    /// A handler is already registered under this name.
    #[error("Handler already registered: {0}")]
    AlreadyRegistered(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WorkflowError {
    /// True for failures the boundaries treat as expected: the run is over,
    /// the message says why, and nothing below the handler is broken.
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::UnknownWorkflow(_))
    }
}
