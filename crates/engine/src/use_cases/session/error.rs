use kidquest_domain::DomainError;

/// Why a session command was refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// A quest operation is still in flight; try again after the next tick.
    #[error("A quest operation is already in progress")]
    Busy,

    #[error("No quest is active")]
    NoActiveQuest,

    /// Profile and quest list are not loaded yet (or failed to load).
    #[error("Session is not ready")]
    NotReady,

    #[error("Session has been disposed")]
    Disposed,

    #[error(transparent)]
    Domain(#[from] DomainError),
}
