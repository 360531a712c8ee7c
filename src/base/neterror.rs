use crate::base::loadstate::FetchState;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Coarse classification of a fetch failure.
///
/// Every [`NetError`] maps to exactly one kind; callers that only need to
/// branch on the failure class match on this instead of the full error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The host/service pair could not be resolved.
    ResolutionFailed,
    /// No resolved endpoint accepted a TCP connection.
    ConnectFailed,
    /// TLS negotiation failed or a certificate was rejected.
    HandshakeFailed,
    /// Sending the request failed.
    TransportWrite,
    /// Reading the response failed with anything other than end-of-stream.
    TransportRead,
    /// The peer sent something that is not an HTTP response.
    ProtocolViolation,
    /// The fetch was cancelled by the caller.
    Cancelled,
    /// The fetch deadline elapsed.
    TimedOut,
    /// The response exceeded a configured size limit.
    ResponseTooLarge,
    /// The request could not be built from the supplied server/path.
    InvalidRequest,
}

#[derive(Debug, Error, Clone)]
pub enum NetError {
    // Resolution
    #[error("Name not resolved: {host} ({service})")]
    NameNotResolved {
        host: String,
        service: String,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Unknown service: {0}")]
    UnknownService(String),

    // Connection
    #[error("Connection to {host} failed after {attempts} attempt(s)")]
    ConnectionFailed {
        host: String,
        attempts: usize,
        #[source]
        source: Option<Arc<io::Error>>,
    },

    // TLS
    #[error("SSL handshake with {host} failed: {reason}")]
    SslHandshakeFailed { host: String, reason: String },
    #[error("Certificate rejected: {subject} ({reason})")]
    CertificateRejected {
        host: String,
        subject: String,
        reason: String,
    },
    #[error("SSL context configuration failed: {0}")]
    SslConfiguration(String),

    // Request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Failed to write request")]
    WriteFailed(#[source] Arc<io::Error>),

    // Response
    #[error("Failed to read response")]
    ReadFailed(#[source] Arc<io::Error>),
    #[error("Empty response")]
    EmptyResponse,
    #[error("Invalid HTTP response: {0}")]
    InvalidHttpResponse(String),
    #[error("Response headers truncated")]
    ResponseHeadersTruncated,
    #[error("Response headers too big (limit {limit} bytes)")]
    ResponseHeadersTooBig { limit: usize },
    #[error("Response body too big (limit {limit} bytes)")]
    ResponseBodyTooBig { limit: usize },
    #[error("Response body is not valid UTF-8")]
    InvalidUtf8,
    #[error("Response body is not valid JSON: {0}")]
    JsonParseError(String),

    // Lifecycle
    #[error("Fetch aborted while {stage:?}")]
    Aborted { stage: FetchState },
    #[error("Fetch timed out while {stage:?}")]
    TimedOut { stage: FetchState },
}

impl NetError {
    /// Build a resolution error with the underlying cause.
    pub fn dns_failed(host: &str, service: &str, source: io::Error) -> Self {
        NetError::NameNotResolved {
            host: host.to_string(),
            service: service.to_string(),
            source: Arc::new(source),
        }
    }

    /// Build a connect error from the last failed attempt.
    pub fn connection_failed_to(host: &str, attempts: usize, source: Option<io::Error>) -> Self {
        NetError::ConnectionFailed {
            host: host.to_string(),
            attempts,
            source: source.map(Arc::new),
        }
    }

    pub fn read_failed(source: io::Error) -> Self {
        NetError::ReadFailed(Arc::new(source))
    }

    pub fn write_failed(source: io::Error) -> Self {
        NetError::WriteFailed(Arc::new(source))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            NetError::NameNotResolved { .. } | NetError::UnknownService(_) => {
                ErrorKind::ResolutionFailed
            }
            NetError::ConnectionFailed { .. } => ErrorKind::ConnectFailed,
            NetError::SslHandshakeFailed { .. }
            | NetError::CertificateRejected { .. }
            | NetError::SslConfiguration(_) => ErrorKind::HandshakeFailed,
            NetError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            NetError::WriteFailed(_) => ErrorKind::TransportWrite,
            NetError::ReadFailed(_) => ErrorKind::TransportRead,
            NetError::EmptyResponse
            | NetError::InvalidHttpResponse(_)
            | NetError::ResponseHeadersTruncated
            | NetError::InvalidUtf8
            | NetError::JsonParseError(_) => ErrorKind::ProtocolViolation,
            NetError::ResponseHeadersTooBig { .. } | NetError::ResponseBodyTooBig { .. } => {
                ErrorKind::ResponseTooLarge
            }
            NetError::Aborted { .. } => ErrorKind::Cancelled,
            NetError::TimedOut { .. } => ErrorKind::TimedOut,
        }
    }

    /// Chromium net error code for this error (see `net_error_list.h`).
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::Aborted { .. } => -3,
            NetError::TimedOut { .. } => -7,
            NetError::ReadFailed(_) => -101,
            NetError::WriteFailed(_) => -100,
            NetError::ConnectionFailed { .. } => -104,
            NetError::NameNotResolved { .. } => -105,
            NetError::SslHandshakeFailed { .. } | NetError::SslConfiguration(_) => -107,
            NetError::CertificateRejected { .. } => -202,
            NetError::InvalidRequest(_) | NetError::UnknownService(_) => -300,
            NetError::EmptyResponse => -324,
            NetError::ResponseHeadersTooBig { .. } => -325,
            NetError::ResponseBodyTooBig { .. } => -345,
            NetError::ResponseHeadersTruncated => -357,
            NetError::InvalidHttpResponse(_) => -370,
            NetError::InvalidUtf8 | NetError::JsonParseError(_) => -330,
        }
    }

    /// True for the caller-initiated terminations (cancel or deadline).
    pub fn is_interrupted(&self) -> bool {
        matches!(self.kind(), ErrorKind::Cancelled | ErrorKind::TimedOut)
    }
}
