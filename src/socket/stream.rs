//! Transport abstraction for the fetch pipeline.
//!
//! Based on Chromium's `StreamSocket` interface: the request writer and the
//! response reader only need a byte stream, whether that is TLS over TCP in
//! production or an in-memory pipe under test.

use tokio::io::{AsyncRead, AsyncWrite};

/// A connected, bidirectional byte stream.
///
/// Chromium equivalent: `net::StreamSocket`
pub trait StreamSocket: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> StreamSocket for T where T: AsyncRead + AsyncWrite + Unpin + Send {}
