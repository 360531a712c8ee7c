//! The fixed-shape HTTP/1.0 GET request.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use bytes::{BufMut, Bytes, BytesMut};
use http::uri::PathAndQuery;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Serialized request bytes, built once and written once.
///
/// ```text
/// GET <path> HTTP/1.0\r\n
/// Host: <server>\r\n
/// Accept: */*\r\n
/// Connection: close\r\n
/// \r\n
/// ```
///
/// `Connection: close` makes the server close the socket after the
/// response, so everything up to end-of-stream is the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    bytes: Bytes,
}

impl HttpRequest {
    pub fn get(server: &str, path: &str) -> Result<Self, NetError> {
        validate_server(server)?;
        validate_path(path)?;

        let mut buf = BytesMut::with_capacity(64 + server.len() + path.len());
        buf.put_slice(b"GET ");
        buf.put_slice(path.as_bytes());
        buf.put_slice(b" HTTP/1.0\r\n");
        buf.put_slice(b"Host: ");
        buf.put_slice(server.as_bytes());
        buf.put_slice(b"\r\n");
        buf.put_slice(b"Accept: */*\r\n");
        buf.put_slice(b"Connection: close\r\n\r\n");

        Ok(Self {
            bytes: buf.freeze(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the whole request and flush it.
    ///
    /// Returns only once every byte has been handed to the transport.
    pub async fn write_to<S>(&self, stream: &mut S) -> Result<(), NetError>
    where
        S: AsyncWrite + Unpin,
    {
        stream.write_all(&self.bytes).await.write_context()?;
        stream.flush().await.write_context()
    }
}

fn is_forbidden(b: u8) -> bool {
    b <= b' ' || b == 0x7f
}

fn validate_server(server: &str) -> Result<(), NetError> {
    if server.is_empty() {
        return Err(NetError::InvalidRequest("empty server name".into()));
    }
    if server.bytes().any(is_forbidden) {
        return Err(NetError::InvalidRequest(format!(
            "server name {server:?} contains whitespace or control characters"
        )));
    }
    Ok(())
}

fn validate_path(path: &str) -> Result<(), NetError> {
    if !path.starts_with('/') {
        return Err(NetError::InvalidRequest(format!(
            "request path {path:?} is not absolute"
        )));
    }
    // PathAndQuery silently drops fragments; a fragment never goes on the wire.
    if path.bytes().any(|b| is_forbidden(b) || b == b'#') {
        return Err(NetError::InvalidRequest(format!(
            "request path {path:?} contains forbidden characters"
        )));
    }
    path.parse::<PathAndQuery>()
        .map_err(|e| NetError::InvalidRequest(format!("request path {path:?}: {e}")))?;
    Ok(())
}
