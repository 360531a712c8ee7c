//! # tlsfetch
//!
//! One-shot HTTPS GET over BoringSSL, modelled on Chromium's network stack.
//!
//! A fetch resolves the host, connects to the first reachable endpoint,
//! verifies the server's certificate chain through a pluggable hook, sends
//! a single HTTP/1.0 GET and reads the response until the server closes
//! the connection. Progress is observable at every step and the fetch can
//! be cancelled or bounded by a deadline.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tlsfetch::{FetchSession, TlsConfig};
//! use tokio::runtime::Handle;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tlsfetch::NetError> {
//!     let tls = TlsConfig::default().build()?;
//!     let mut session = FetchSession::start(&Handle::current(), tls, "example.com", "/", "https");
//!     session.wait().await;
//!     match session.result() {
//!         Some(Ok(response)) => println!("{} {}", response.status_code(), response.text()?),
//!         Some(Err(e)) => eprintln!("failed in {:?}: {e}", session.progress().stage),
//!         None => unreachable!(),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Fetch states, progress snapshots and error definitions
//! - [`dns`] - Endpoint resolution
//! - [`socket`] - TCP connect and TLS handshake
//! - [`tls`] - Certificate verification hook
//! - [`http`] - Request serialization and response parsing
//! - [`fetch`] - The fetch state machine and its session handle

pub mod base;
pub mod dns;
pub mod fetch;
pub mod http;
pub mod socket;
pub mod tls;

pub use base::{ErrorKind, FetchState, NetError, Progress};
pub use fetch::{fetch, FetchConfig, FetchSession, FetchSessionBuilder, ResolverKind};
pub use http::{BuildPath, FetchResponse, PathBuilder};
pub use socket::{TlsConfig, TlsContext};
pub use tls::{CertificateInfo, DefaultVerifier, VerifyCertificate};
