//! Error types for port operations.

/// Backend API errors with context for debugging.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Entity not found - includes entity type and ID for actionable error messages.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The request never produced a response (connect, timeout, reset).
    #[error("Network error in {operation}: {message}")]
    Network {
        operation: &'static str,
        message: String,
    },

    /// Non-success HTTP status.
    #[error("HTTP {status} in {operation}: {message}")]
    Http {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Missing or rejected credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The backend refused the change (e.g. progress already complete).
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl ApiError {
    /// Create a NotFound error with entity type and ID context.
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Create a Network error with operation context.
    pub fn network(operation: &'static str, message: impl ToString) -> Self {
        Self::Network {
            operation,
            message: message.to_string(),
        }
    }

    /// Create an Http error with operation context.
    pub fn http(operation: &'static str, status: u16, message: impl ToString) -> Self {
        Self::Http {
            operation,
            status,
            message: message.to_string(),
        }
    }

    /// Create a Serialization error.
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    /// Create a ConstraintViolation error.
    pub fn constraint(message: impl ToString) -> Self {
        Self::ConstraintViolation(message.to_string())
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<kidquest_domain::DomainError> for ApiError {
    fn from(err: kidquest_domain::DomainError) -> Self {
        use kidquest_domain::DomainError;
        match err {
            DomainError::NotFound { entity_type, id } => Self::NotFound { entity_type, id },
            other => Self::ConstraintViolation(other.to_string()),
        }
    }
}
