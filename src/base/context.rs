//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types,
//! converting IO errors into context-rich `NetError` variants.

use crate::base::neterror::NetError;
use std::io;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add DNS resolution context to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use tlsfetch::base::context::IoResultExt;
    ///
    /// let addrs = ("example.com", 443).to_socket_addrs()
    ///     .dns_context("example.com", "https")?;
    /// // Error: "Name not resolved: example.com (https)"
    /// ```
    fn dns_context(self, host: &str, service: &str) -> Result<T, NetError>;

    /// Classify an IO error raised while sending the request.
    fn write_context(self) -> Result<T, NetError>;

    /// Classify an IO error raised while reading the response.
    fn read_context(self) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn dns_context(self, host: &str, service: &str) -> Result<T, NetError> {
        self.map_err(|e| NetError::dns_failed(host, service, e))
    }

    fn write_context(self) -> Result<T, NetError> {
        self.map_err(NetError::write_failed)
    }

    fn read_context(self) -> Result<T, NetError> {
        self.map_err(NetError::read_failed)
    }
}
