//! Error types for the blog API client and stores.
//!
//! # Design
//! Failures fall into four classes. Transport failures (`Server`, `Network`,
//! `Request`, `Decode`) come from the HTTP round-trip. `Domain` is a
//! successful HTTP exchange whose envelope carried a non-zero code.
//! `Validation` is raised before any request is built, and `Stale` marks a
//! detail response superseded by a newer request. The `Display` strings of
//! the transport variants are user-facing and must stay stable.

use thiserror::Error;

/// Errors returned by the client, the façades, and the stores.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status. `message` is the body's
    /// `message` field, or `"unknown"`.
    #[error("server error ({status}): {message}")]
    Server {
        status: u16,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// The request went out but no response came back (refused, timed out,
    /// connection dropped).
    #[error("network error: could not reach server")]
    Network { detail: String },

    /// The request could not be built or sent.
    #[error("request error: {0}")]
    Request(String),

    /// A 2xx body that is not a valid envelope for the expected payload.
    #[error("decode error: {0}")]
    Decode(String),

    /// The envelope's code was non-zero.
    #[error("{message}")]
    Domain { code: i64, message: String },

    /// A successful envelope without the payload the operation needs.
    #[error("{0}")]
    MissingData(String),

    /// Caller input rejected before any network call.
    #[error("{0}")]
    Validation(String),

    #[error("stale response for request #{seq}, latest is #{latest}")]
    Stale { seq: u64, latest: u64 },
}

impl ApiError {
    /// Replace an empty domain message with `default`.
    pub fn with_default_message(self, default: &str) -> Self {
        match self {
            ApiError::Domain { code, message } if message.trim().is_empty() => ApiError::Domain {
                code,
                message: default.to_string(),
            },
            other => other,
        }
    }

    /// True for the transport classes: anything the HTTP layer reported.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ApiError::Server { .. }
                | ApiError::Network { .. }
                | ApiError::Request(_)
                | ApiError::Decode(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_messages_are_stable() {
        let server = ApiError::Server {
            status: 500,
            message: "unknown".to_string(),
            data: None,
        };
        assert_eq!(server.to_string(), "server error (500): unknown");

        let network = ApiError::Network {
            detail: "connection refused".to_string(),
        };
        assert_eq!(network.to_string(), "network error: could not reach server");

        let request = ApiError::Request("invalid uri".to_string());
        assert_eq!(request.to_string(), "request error: invalid uri");
    }

    #[test]
    fn default_message_only_fills_empty_domain_errors() {
        let empty = ApiError::Domain {
            code: 1,
            message: String::new(),
        };
        assert_eq!(empty.with_default_message("login failed").to_string(), "login failed");

        let filled = ApiError::Domain {
            code: 1,
            message: "bad".to_string(),
        };
        assert_eq!(filled.with_default_message("login failed").to_string(), "bad");

        let validation = ApiError::Validation("user id must be numeric".to_string());
        assert_eq!(
            validation.with_default_message("login failed").to_string(),
            "user id must be numeric"
        );
    }

    #[test]
    fn transport_classification() {
        assert!(ApiError::Decode("x".into()).is_transport());
        assert!(!ApiError::Validation("x".into()).is_transport());
        assert!(!ApiError::Domain { code: 1, message: "x".into() }.is_transport());
    }
}
