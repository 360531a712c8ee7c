//! One-shot HTTPS GET.
//!
//! A fetch walks a fixed pipeline: resolve the host, connect to the first
//! reachable endpoint, complete a verified TLS handshake, send one
//! HTTP/1.0 GET, and read the response until the server closes the
//! connection. Every step is a [`FetchState`](crate::base::FetchState);
//! each suspension point is interruptible by cancellation or the deadline.

pub mod config;
mod job;
pub mod session;

pub use config::{FetchConfig, ResolverKind};
pub use session::{FetchSession, FetchSessionBuilder};

use crate::base::neterror::NetError;
use crate::http::pathbuilder::BuildPath;
use crate::http::response::FetchResponse;
use crate::socket::tls::TlsContext;

/// Fetch `path` from `server` on the current task.
///
/// ```rust,ignore
/// let tls = TlsConfig::default().build()?;
/// let response = tlsfetch::fetch(tls, "example.com", "/robots.txt", "https").await?;
/// println!("{}", response.text()?);
/// ```
pub async fn fetch(
    tls: TlsContext,
    server: &str,
    path: impl BuildPath,
    service: &str,
) -> Result<FetchResponse, NetError> {
    FetchSession::builder(tls, server, path)
        .service(service)
        .run()
        .await
}
