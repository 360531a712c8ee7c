//! Per-certificate verification hook.
//!
//! BoringSSL walks the presented chain and, for every certificate, hands its
//! own verdict (`preverified`) to the application. The hook may confirm or
//! override that verdict. This module keeps the hook independent of the
//! BoringSSL object model: verifiers only see a [`CertificateInfo`].

use boring::x509::{X509NameRef, X509StoreContextRef};
use std::fmt;

/// Metadata about the certificate currently being verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    subject: String,
    depth: u32,
}

impl CertificateInfo {
    pub fn new(subject: impl Into<String>, depth: u32) -> Self {
        Self {
            subject: subject.into(),
            depth,
        }
    }

    /// Subject name in one-line form, e.g. `/C=US/O=Example/CN=example.com`.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Position in the chain; 0 is the leaf.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub(crate) fn from_store_context(ctx: &X509StoreContextRef) -> Self {
        let subject = ctx
            .current_cert()
            .map(|cert| oneline(cert.subject_name()))
            .unwrap_or_else(|| "<no certificate>".to_string());
        Self::new(subject, ctx.error_depth())
    }
}

impl fmt::Display for CertificateInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (depth {})", self.subject, self.depth)
    }
}

fn oneline(name: &X509NameRef) -> String {
    let mut out = String::new();
    for entry in name.entries() {
        let key = entry.object().nid().short_name().unwrap_or("UNDEF");
        out.push('/');
        out.push_str(key);
        out.push('=');
        match entry.data().as_utf8() {
            Ok(value) => out.push_str(&value),
            Err(_) => out.push('?'),
        }
    }
    out
}

/// Accept or reject one certificate of the peer's chain.
///
/// Called once per certificate during the handshake. Returning `false`
/// aborts the handshake.
pub trait VerifyCertificate: Send + Sync + 'static {
    fn verify(&self, preverified: bool, cert: &CertificateInfo) -> bool;
}

impl<F> VerifyCertificate for F
where
    F: Fn(bool, &CertificateInfo) -> bool + Send + Sync + 'static,
{
    fn verify(&self, preverified: bool, cert: &CertificateInfo) -> bool {
        self(preverified, cert)
    }
}

/// Defers entirely to BoringSSL's chain and hostname validation.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultVerifier;

impl VerifyCertificate for DefaultVerifier {
    fn verify(&self, preverified: bool, cert: &CertificateInfo) -> bool {
        tracing::debug!(
            subject = %cert.subject(),
            depth = cert.depth(),
            preverified,
            "Verifying certificate"
        );
        preverified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_verifier_returns_preverified() {
        let cert = CertificateInfo::new("/CN=example.com", 0);
        assert!(DefaultVerifier.verify(true, &cert));
        assert!(!DefaultVerifier.verify(false, &cert));
    }

    #[test]
    fn test_closure_verifier() {
        let pin_leaf = |_preverified: bool, cert: &CertificateInfo| {
            cert.depth() > 0 || cert.subject().ends_with("CN=pinned.example")
        };

        assert!(pin_leaf.verify(false, &CertificateInfo::new("/CN=pinned.example", 0)));
        assert!(!pin_leaf.verify(true, &CertificateInfo::new("/CN=other.example", 0)));
        assert!(pin_leaf.verify(true, &CertificateInfo::new("/CN=Some Root CA", 1)));
    }

    #[test]
    fn test_display() {
        let cert = CertificateInfo::new("/O=Example/CN=example.com", 1);
        assert_eq!(cert.to_string(), "/O=Example/CN=example.com (depth 1)");
    }
}
