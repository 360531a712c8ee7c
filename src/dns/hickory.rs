//! Fully async lookups through hickory-dns, without a blocking thread per
//! query. Addresses come back IPv4 first, then IPv6.

use super::{Addrs, Name, Resolve, Resolving};
use hickory_resolver::config::{LookupIpStrategy, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

#[derive(Clone)]
pub struct HickoryResolver {
    inner: Arc<TokioResolver>,
}

impl HickoryResolver {
    /// Resolver configured from the system's DNS settings, shared by every
    /// instance created this way so its cache is shared too.
    pub fn new() -> Self {
        static SYSTEM: OnceLock<Arc<TokioResolver>> = OnceLock::new();
        let inner = SYSTEM.get_or_init(|| {
            let mut builder = TokioResolver::builder_tokio().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "system DNS config unreadable, using defaults");
                TokioResolver::builder_with_config(
                    ResolverConfig::default(),
                    TokioConnectionProvider::default(),
                )
            });
            builder.options_mut().ip_strategy = LookupIpStrategy::Ipv4thenIpv6;
            Arc::new(builder.build())
        });
        Self {
            inner: inner.clone(),
        }
    }

    /// Dedicated resolver for explicit upstreams (e.g. DoH or DoT).
    pub fn with_config(config: ResolverConfig) -> Self {
        let mut builder =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default());
        builder.options_mut().ip_strategy = LookupIpStrategy::Ipv4thenIpv6;
        Self {
            inner: Arc::new(builder.build()),
        }
    }
}

impl Default for HickoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HickoryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HickoryResolver").finish_non_exhaustive()
    }
}

impl Resolve for HickoryResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let inner = self.inner.clone();
        Box::pin(async move {
            let lookup = inner.lookup_ip(name.as_str()).await.map_err(|e| {
                tracing::debug!(host = %name, error = %e, "hickory lookup failed");
                io::Error::new(io::ErrorKind::NotFound, e.to_string())
            })?;

            let addrs: Vec<SocketAddr> = lookup.iter().map(|ip| SocketAddr::new(ip, 0)).collect();
            if addrs.is_empty() {
                return Err(io::Error::new(io::ErrorKind::NotFound, "empty answer"));
            }

            tracing::debug!(host = %name, count = addrs.len(), "hickory lookup complete");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}
