//! getaddrinfo on tokio's blocking pool.
//!
//! Honors the host's resolver configuration (`/etc/hosts`, nsswitch,
//! resolv.conf). This is the default resolver of a fetch.

use super::{Addrs, Name, Resolve, Resolving};
use std::io;
use std::net::{IpAddr, Ipv6Addr, SocketAddr, ToSocketAddrs};

#[derive(Clone, Copy, Debug, Default)]
pub struct GaiResolver;

impl GaiResolver {
    pub fn new() -> Self {
        Self
    }
}

fn getaddrinfo(host: &str) -> io::Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = (host, 0u16).to_socket_addrs()?.collect();
    if addrs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            "getaddrinfo returned no addresses",
        ));
    }
    Ok(addrs)
}

impl Resolve for GaiResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            let host = name.clone();
            let addrs = tokio::task::spawn_blocking(move || getaddrinfo(host.as_str()))
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "getaddrinfo task failed");
                    io::Error::other(e)
                })?
                .inspect_err(|e| tracing::debug!(host = %name, error = %e, "getaddrinfo failed"))?;

            tracing::debug!(host = %name, count = addrs.len(), "getaddrinfo complete");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

/// Endpoints for a host that is already an IP literal.
#[derive(Debug)]
pub struct SocketAddrs {
    addrs: std::vec::IntoIter<SocketAddr>,
}

impl SocketAddrs {
    pub fn new(addrs: Vec<SocketAddr>) -> Self {
        Self {
            addrs: addrs.into_iter(),
        }
    }

    /// Parse `host` as an IPv4 or IPv6 literal (IPv6 optionally in
    /// brackets); `None` means the host needs a lookup.
    pub fn try_parse(host: &str, port: u16) -> Option<Self> {
        let ip = match host.parse::<IpAddr>() {
            Ok(ip) => ip,
            Err(_) => host
                .strip_prefix('[')?
                .strip_suffix(']')?
                .parse::<Ipv6Addr>()
                .ok()?
                .into(),
        };
        Some(Self::new(vec![SocketAddr::new(ip, port)]))
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.len() == 0
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }
}

impl Iterator for SocketAddrs {
    type Item = SocketAddr;

    fn next(&mut self) -> Option<Self::Item> {
        self.addrs.next()
    }
}
