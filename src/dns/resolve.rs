//! Host lookup abstraction and endpoint ordering.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use std::collections::HashMap;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::{fmt, io};

/// A host name handed to a resolver.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Name(Box<str>);

impl Name {
    pub fn new(host: impl Into<Box<str>>) -> Self {
        Self(host.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(host: &str) -> Self {
        Self::new(host)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolved addresses, in the order they should be tried.
pub type Addrs = Box<dyn Iterator<Item = SocketAddr> + Send>;

pub type Resolving = Pin<Box<dyn Future<Output = io::Result<Addrs>> + Send>>;

/// Chromium's `HostResolver`, reduced to a single lookup call.
///
/// Implementations return addresses with port 0 and plain I/O errors;
/// [`resolve_endpoints`] applies the service port and error context.
pub trait Resolve: Send + Sync {
    fn resolve(&self, name: Name) -> Resolving;
}

impl<R: Resolve + ?Sized> Resolve for Arc<R> {
    fn resolve(&self, name: Name) -> Resolving {
        R::resolve(self, name)
    }
}

/// Map a service name or numeric port to a TCP port.
///
/// Accepts a decimal port (`"8443"`) or one of the well-known service
/// names `https` and `http`.
pub fn service_port(service: &str) -> Result<u16, NetError> {
    if let Ok(port) = service.parse::<u16>() {
        return Ok(port);
    }
    match service.to_ascii_lowercase().as_str() {
        "https" => Ok(443),
        "http" => Ok(80),
        _ => Err(NetError::UnknownService(service.to_string())),
    }
}

/// Resolve `(host, service)` into the ordered endpoint sequence.
///
/// IP literals bypass the resolver. The port is applied lazily, so the
/// connector consumes the resolver's order unchanged.
pub async fn resolve_endpoints(
    resolver: &dyn Resolve,
    host: &str,
    service: &str,
) -> Result<Addrs, NetError> {
    let port = service_port(service)?;

    if let Some(addrs) = super::gai::SocketAddrs::try_parse(host, port) {
        tracing::debug!(host = %host, "host is an IP literal, skipping DNS");
        return Ok(Box::new(addrs));
    }

    let addrs = resolver
        .resolve(Name::new(host))
        .await
        .dns_context(host, service)?;

    Ok(Box::new(addrs.map(move |mut addr| {
        addr.set_port(port);
        addr
    })))
}

/// Answers configured hosts from a fixed table and forwards the rest.
///
/// Host matching ignores ASCII case.
///
/// ```rust,ignore
/// use tlsfetch::dns::{DnsResolverWithOverrides, GaiResolver};
///
/// let resolver = DnsResolverWithOverrides::new(Arc::new(GaiResolver::new()))
///     .with_override("api.internal", ["10.0.0.7".parse().unwrap()]);
/// ```
pub struct DnsResolverWithOverrides {
    inner: Arc<dyn Resolve>,
    overrides: HashMap<String, Vec<IpAddr>>,
}

impl DnsResolverWithOverrides {
    pub fn new(inner: Arc<dyn Resolve>) -> Self {
        Self {
            inner,
            overrides: HashMap::new(),
        }
    }

    /// Pin `host` to `ips`, tried in the given order.
    pub fn with_override(
        mut self,
        host: impl Into<String>,
        ips: impl IntoIterator<Item = IpAddr>,
    ) -> Self {
        let mut host = host.into();
        host.make_ascii_lowercase();
        self.overrides.insert(host, ips.into_iter().collect());
        self
    }

    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

impl Resolve for DnsResolverWithOverrides {
    fn resolve(&self, name: Name) -> Resolving {
        let key = name.as_str().to_ascii_lowercase();
        match self.overrides.get(&key) {
            Some(ips) => {
                tracing::trace!(host = %name, count = ips.len(), "answered from overrides");
                let addrs: Vec<SocketAddr> =
                    ips.iter().map(|ip| SocketAddr::new(*ip, 0)).collect();
                Box::pin(std::future::ready(Ok(Box::new(addrs.into_iter()) as Addrs)))
            }
            None => self.inner.resolve(name),
        }
    }
}

impl fmt::Debug for DnsResolverWithOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsResolverWithOverrides")
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::neterror::ErrorKind;

    /// Replies with a fixed list, or fails with `NotFound` when empty.
    struct FixedResolver(Vec<IpAddr>);

    impl Resolve for FixedResolver {
        fn resolve(&self, _name: Name) -> Resolving {
            let ips = self.0.clone();
            Box::pin(async move {
                if ips.is_empty() {
                    return Err(io::Error::new(io::ErrorKind::NotFound, "nxdomain"));
                }
                let addrs: Vec<_> = ips.into_iter().map(|ip| SocketAddr::new(ip, 0)).collect();
                Ok(Box::new(addrs.into_iter()) as Addrs)
            })
        }
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_name() {
        let name = Name::from("example.com");
        assert_eq!(name.as_str(), "example.com");
        assert_eq!(name.to_string(), "example.com");
        assert_eq!(format!("{name:?}"), "Name(\"example.com\")");
    }

    #[test]
    fn test_service_port() {
        assert_eq!(service_port("https").unwrap(), 443);
        assert_eq!(service_port("HTTP").unwrap(), 80);
        assert_eq!(service_port("8443").unwrap(), 8443);

        let err = service_port("gopher").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResolutionFailed);
    }

    #[tokio::test]
    async fn test_overrides_ignore_case() {
        let resolver = DnsResolverWithOverrides::new(Arc::new(FixedResolver(vec![])))
            .with_override("Pinned.Local", [ip("10.1.1.1"), ip("10.1.1.2")]);

        let addrs: Vec<_> = resolver
            .resolve(Name::new("pinned.local"))
            .await
            .unwrap()
            .map(|a| a.ip())
            .collect();
        assert_eq!(addrs, [ip("10.1.1.1"), ip("10.1.1.2")]);
        assert_eq!(resolver.override_count(), 1);
    }

    #[tokio::test]
    async fn test_endpoints_keep_order_and_take_port() {
        let resolver = FixedResolver(vec![ip("10.0.0.1"), ip("10.0.0.2"), ip("10.0.0.3")]);

        let endpoints: Vec<_> = resolve_endpoints(&resolver, "example.com", "https")
            .await
            .unwrap()
            .collect();

        assert_eq!(
            endpoints,
            vec![
                "10.0.0.1:443".parse::<SocketAddr>().unwrap(),
                "10.0.0.2:443".parse().unwrap(),
                "10.0.0.3:443".parse().unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn test_endpoints_ip_literal_bypasses_resolver() {
        let endpoints: Vec<_> = resolve_endpoints(&FixedResolver(vec![]), "127.0.0.1", "8443")
            .await
            .unwrap()
            .collect();
        assert_eq!(endpoints, vec!["127.0.0.1:8443".parse::<SocketAddr>().unwrap()]);
    }

    #[tokio::test]
    async fn test_endpoints_resolution_failure() {
        let err = match resolve_endpoints(&FixedResolver(vec![]), "missing.example", "https").await
        {
            Err(e) => e,
            Ok(_) => panic!("resolution should fail"),
        };
        assert_eq!(err.kind(), ErrorKind::ResolutionFailed);
        match err {
            NetError::NameNotResolved { host, service, .. } => {
                assert_eq!(host, "missing.example");
                assert_eq!(service, "https");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
