//! Socket and connection management.
//!
//! Mirrors Chromium's `net/socket/`, narrowed to one connection per fetch:
//! - [`connectjob`]: sequential TCP connect over the resolved endpoints
//! - [`tls`]: TLS configuration and handshake with BoringSSL
//! - [`stream`]: the byte-stream bound the HTTP layer is written against

pub mod connectjob;
pub mod stream;
pub mod tls;

pub use connectjob::ConnectJob;
pub use stream::StreamSocket;
pub use tls::{TlsConfig, TlsContext};
