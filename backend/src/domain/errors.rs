//! Error types surfaced by the CRA services.

/// Failure of a CRA operation that the caller must act on
#[derive(Debug, thiserror::Error)]
pub enum CraError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl CraError {
    pub fn validation(message: impl Into<String>) -> Self {
        CraError::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        CraError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        CraError::NotFound(message.into())
    }
}

/// Failure while delivering a completed CRA.
///
/// Never propagated to callers as an error; the notifier turns it into a
/// failed outcome that an administrator can retry.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("no recipient: {0}")]
    MissingRecipient(String),
    #[error("could not gather CRA data: {0}")]
    Gather(#[source] anyhow::Error),
    #[error("document rendering failed: {0}")]
    Render(#[source] anyhow::Error),
    #[error("email delivery failed: {0}")]
    Transport(#[source] anyhow::Error),
}
