//! Endpoint resolution.
//!
//! Turns a `(host, service)` pair into the ordered socket addresses the
//! connector walks through, after Chromium's `HostResolver`:
//! - [`GaiResolver`]: the system resolver, run on the blocking pool
//! - [`HickoryResolver`]: async hickory-dns
//! - [`DnsResolverWithOverrides`]: fixed answers for chosen hosts
//!
//! ```rust,ignore
//! use tlsfetch::dns::{resolve_endpoints, GaiResolver};
//!
//! for addr in resolve_endpoints(&GaiResolver::new(), "example.com", "https").await? {
//!     println!("candidate: {addr}");
//! }
//! ```

mod gai;
mod hickory;
mod resolve;

pub use gai::{GaiResolver, SocketAddrs};
pub use hickory::HickoryResolver;
pub use resolve::{
    resolve_endpoints, service_port, Addrs, DnsResolverWithOverrides, Name, Resolve, Resolving,
};
