// SPDX-License-Identifier: MIT

//! Error taxonomy for PowerDNS API operations.
//!
//! The reconcile cores dispatch on exactly four cases: `NotFound` maps to
//! local idempotence (delete tolerated, zone needs create, parent absent),
//! `Conflict` surfaces a backend-side duplicate the local indexes missed,
//! `Validation` quiesces the resource with the backend's message verbatim,
//! and `Transport` propagates up for the runtime's retry.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by the PowerDNS zones and records operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PdnsError {
    /// The zone or RRset does not exist on the backend (HTTP 404).
    #[error("Not Found")]
    NotFound,

    /// A zone with the same canonical name already exists (HTTP 409).
    #[error("Conflict")]
    Conflict,

    /// The backend rejected the request body (HTTP 400/422). Carries the
    /// backend's error message verbatim; it becomes the condition message.
    #[error("{0}")]
    Validation(String),

    /// Network failure, timeout, or an unexpected backend response.
    #[error("transport error: {0}")]
    Transport(String),
}

impl PdnsError {
    /// Map a non-success HTTP response to the taxonomy.
    ///
    /// The PowerDNS API reports request problems as a JSON object with an
    /// `error` field; that message is preserved for validation failures.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::NOT_FOUND => PdnsError::NotFound,
            StatusCode::CONFLICT => PdnsError::Conflict,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                PdnsError::Validation(extract_error_message(body))
            }
            _ => PdnsError::Transport(format!("unexpected status {status}: {body}")),
        }
    }

    /// True when the error only indicates that the object is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, PdnsError::NotFound)
    }
}

impl From<reqwest::Error> for PdnsError {
    fn from(err: reqwest::Error) -> Self {
        PdnsError::Transport(err.to_string())
    }
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_mapping() {
        let err = PdnsError::from_response(StatusCode::NOT_FOUND, "");
        assert_eq!(err, PdnsError::NotFound);
        assert!(err.is_not_found());
    }

    #[test]
    fn test_conflict_mapping() {
        let err = PdnsError::from_response(StatusCode::CONFLICT, r#"{"error":"Domain exists"}"#);
        assert_eq!(err, PdnsError::Conflict);
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_validation_carries_backend_message_verbatim() {
        let body = r#"{"error":"Record 0.0.0.0/AA: unknown type"}"#;
        let err = PdnsError::from_response(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(
            err,
            PdnsError::Validation("Record 0.0.0.0/AA: unknown type".to_string())
        );
        // Display is the raw message, suitable for a condition message.
        assert_eq!(err.to_string(), "Record 0.0.0.0/AA: unknown type");
    }

    #[test]
    fn test_validation_with_unparseable_body() {
        let err = PdnsError::from_response(StatusCode::BAD_REQUEST, "oops");
        assert_eq!(err, PdnsError::Validation("oops".to_string()));
    }

    #[test]
    fn test_server_error_is_transport() {
        let err = PdnsError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(err, PdnsError::Transport(_)));
    }
}
