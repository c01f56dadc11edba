use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// A submitted form field was rejected. `message` is shown next to `field`.
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

impl DomainError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn field(&self) -> Option<&'static str> {
        match self {
            DomainError::Validation { field, .. } => Some(field),
            DomainError::Timestamp(_) => None,
        }
    }
}
