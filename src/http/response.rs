//! The result of a completed fetch.

use crate::base::neterror::NetError;
use crate::http::parser::StatusLine;
use bytes::Bytes;
use http::StatusCode;

/// Status and body of a response read to end-of-stream.
///
/// Only completed fetches produce one; a failed fetch never exposes the
/// partial body it may have read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    status: StatusLine,
    body: Bytes,
}

impl FetchResponse {
    pub(crate) fn new(status: StatusLine, body: Bytes) -> Self {
        Self { status, body }
    }

    /// The numeric status code.
    pub fn status_code(&self) -> u16 {
        self.status.code
    }

    /// The status code as a typed value.
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status.code).ok()
    }

    /// Protocol version token from the status line, e.g. `HTTP/1.1`.
    pub fn version(&self) -> &str {
        &self.status.version
    }

    pub fn reason(&self) -> &str {
        &self.status.reason
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status.code)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> Result<&str, NetError> {
        std::str::from_utf8(&self.body).map_err(|_| NetError::InvalidUtf8)
    }

    /// Body as JSON, deserializing to type T.
    #[cfg(feature = "json")]
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, NetError> {
        serde_json::from_slice(&self.body).map_err(|e| NetError::JsonParseError(e.to_string()))
    }
}
