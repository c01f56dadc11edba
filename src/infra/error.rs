use std::net::SocketAddr;

use thiserror::Error;

/// Failures while bringing the process up: seeding, logging and binding.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid seed data in {origin}: {message}")]
    Seed { origin: String, message: String },
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

impl InfraError {
    pub fn seed(origin: impl Into<String>, message: impl ToString) -> Self {
        Self::Seed {
            origin: origin.into(),
            message: message.to_string(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
