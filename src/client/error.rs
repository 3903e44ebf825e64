//! Errors returned by the Table API client.
//!
//! Tools never hand these to their caller; they are rendered into the
//! tool's output string at the boundary.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single Table API request.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The instance answered with a non-success status.
    #[error("Error: {} - {body}", status.as_u16())]
    Status {
        status: StatusCode,
        body: String,
        /// `error.message` from the body, when the instance sent one (400s do).
        message: Option<String>,
    },

    /// The request never produced a response (connect, timeout, bad URL).
    #[error("Error: request failed - {0}")]
    Network(String),

    /// The response body was not the JSON shape we expected.
    #[error("Error: could not decode response - {0}")]
    Decode(String),
}

impl ClientError {
    /// Build a status error, pulling the structured message out of the body if present.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(String::from)
            });

        ClientError::Status {
            status,
            body,
            message,
        }
    }

    /// HTTP status code, if the failure came from the instance.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The instance's own explanation of a rejected request.
    pub fn message(&self) -> Option<&str> {
        match self {
            ClientError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else if e.is_timeout() {
            ClientError::Network(format!("timed out: {}", e))
        } else {
            ClientError::Network(e.to_string())
        }
    }
}
