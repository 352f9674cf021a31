//! # Errors

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by the services a view model calls into.
#[derive(Clone, Debug, Deserialize, Serialize, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The request could not be sent or was rejected by the server.
    #[error("service request failed: {message}")]
    Request {
        /// Description of the failure.
        message: String,
    },

    /// The room, event or transaction the request refers to no longer exists.
    #[error("not found: {id}")]
    NotFound {
        /// Identifier that could not be resolved.
        id: String,
    },

    /// The service did not complete within the configured timeout.
    #[error("service did not respond within {seconds}s")]
    Timeout {
        /// Timeout that elapsed.
        seconds: u64,
    },
}

impl ServiceError {
    /// Convenience constructor for a failed request.
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }
}

/// Await a service call, giving up after `timeout`.
pub(crate) async fn with_timeout<T>(
    timeout: Duration, call: impl Future<Output = Result<T, ServiceError>>,
) -> Result<T, ServiceError> {
    tokio::time::timeout(timeout, call).await.map_err(|_| ServiceError::Timeout {
        seconds: timeout.as_secs(),
    })?
}
