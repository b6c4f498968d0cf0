//! Client Response Error type

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The broad category of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The client was used before its configuration was complete, or the
    /// request could not be built from it.
    Configuration,
    /// Connection failure, timeout or TLS validation failure.
    Transport,
    /// The server answered with a non-2xx status.
    Protocol,
    /// The response body was not the JSON the operation expected.
    Decode,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Transport => "transport",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Decode => "decode",
        })
    }
}

/// ClientResponseError wraps and normalizes every failure returned by
/// `Client::send()` and the collection operations built on it.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub struct ClientResponseError {
    /// What went wrong.
    pub kind: ErrorKind,

    /// The URL of the request that failed, without credentials.
    #[serde(default)]
    pub url: String,

    /// HTTP status code (0 if no response was received).
    #[serde(default)]
    pub status: u16,

    /// The error body sent by the server, if any.
    #[serde(default)]
    pub response: serde_json::Value,

    /// Whether the transport gave up waiting.
    #[serde(default)]
    pub is_timeout: bool,

    /// The error message.
    #[serde(default)]
    pub message: String,
}

impl ClientResponseError {
    fn with_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: String::new(),
            status: 0,
            response: serde_json::Value::Null,
            is_timeout: false,
            message: message.into(),
        }
    }

    /// Creates a configuration error. No request has been sent.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Configuration, message)
    }

    /// Creates a protocol error from a non-2xx response.
    ///
    /// The body is kept as JSON when it parses, otherwise as a string. The
    /// message comes from the body's `message` or `error` field when present.
    pub fn from_response(url: &str, status: u16, body: &str) -> Self {
        let response = if body.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(body)
                .unwrap_or_else(|_| serde_json::Value::String(body.to_string()))
        };

        let message = ["message", "error"]
            .iter()
            .find_map(|key| response.get(key).and_then(|v| v.as_str()))
            .map(|s| s.to_string())
            .or_else(|| {
                reqwest::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .map(|s| s.to_string())
            })
            .unwrap_or_else(|| "Something went wrong.".to_string());

        Self {
            kind: ErrorKind::Protocol,
            url: url.to_string(),
            status,
            response,
            is_timeout: false,
            message,
        }
    }

    /// Creates a 404 not found error without a server round-trip.
    pub fn not_found(url: &str, message: &str) -> Self {
        Self {
            kind: ErrorKind::Protocol,
            url: url.to_string(),
            status: 404,
            response: serde_json::json!({ "message": message }),
            is_timeout: false,
            message: message.to_string(),
        }
    }

    /// Creates a decode error for a response that arrived with `status`.
    pub fn decode(url: &str, status: u16, message: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            status,
            ..Self::with_kind(ErrorKind::Decode, message)
        }
    }

    /// Whether the server reported the addressed object as missing.
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::Protocol && self.status == 404
    }
}

impl fmt::Display for ClientResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.status == 0 {
            write!(f, "{} error: {}", self.kind, self.message)
        } else {
            write!(f, "{} error {}: {}", self.kind, self.status, self.message)
        }
    }
}

impl From<reqwest::Error> for ClientResponseError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_builder() {
            ErrorKind::Configuration
        } else if err.is_decode() {
            ErrorKind::Decode
        } else {
            ErrorKind::Transport
        };

        // reqwest URLs may carry credentials in the query string.
        let url = err
            .url()
            .map(|u| {
                let mut u = u.clone();
                u.set_query(None);
                u.to_string()
            })
            .unwrap_or_default();

        let status = err.status().map(|s| s.as_u16()).unwrap_or(0);
        let is_timeout = err.is_timeout();

        Self {
            kind,
            url,
            status,
            response: serde_json::Value::Null,
            is_timeout,
            message: err.without_url().to_string(),
        }
    }
}

impl From<serde_json::Error> for ClientResponseError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_kind(ErrorKind::Decode, format!("JSON error: {}", err))
    }
}

impl From<url::ParseError> for ClientResponseError {
    fn from(err: url::ParseError) -> Self {
        Self::with_kind(ErrorKind::Configuration, format!("URL parse error: {}", err))
    }
}
