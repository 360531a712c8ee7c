use crate::base::neterror::NetError;
use crate::tls::verify::{CertificateInfo, DefaultVerifier, VerifyCertificate};
use boring::ssl::{SslConnector, SslConnectorBuilder, SslMethod, SslVerifyMode, SslVersion};
use boring::x509::X509;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_boring::SslStream;

/// Configuration for the TLS client context.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub min_version: Option<SslVersion>,
    pub max_version: Option<SslVersion>,
    pub cipher_list: Option<String>,
    pub alpn_protos: Vec<String>,
    pub curves: Vec<String>, // Curve names like "X25519", "P-256"
    pub sigalgs: Option<String>, // OpenSSL sigalgs string
    /// Extra trust anchors, PEM encoded, added on top of the system store.
    pub root_certs_pem: Vec<Vec<u8>>,
    /// Extra trust anchors loaded from a PEM file.
    pub ca_file: Option<PathBuf>,
    pub verify_hostname: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            min_version: Some(SslVersion::TLS1_2),
            max_version: Some(SslVersion::TLS1_3),
            // TLS 1.3 suites are fixed by BoringSSL; this list governs TLS 1.2.
            cipher_list: Some(
                "ECDHE-ECDSA-AES128-GCM-SHA256:ECDHE-RSA-AES128-GCM-SHA256:\
                ECDHE-ECDSA-AES256-GCM-SHA384:ECDHE-RSA-AES256-GCM-SHA384:\
                ECDHE-ECDSA-CHACHA20-POLY1305:ECDHE-RSA-CHACHA20-POLY1305"
                    .to_string(),
            ),
            // The request is HTTP/1.0, so nothing is advertised by default.
            alpn_protos: Vec::new(),
            curves: vec!["X25519".to_string(), "P-256".to_string(), "P-384".to_string()],
            sigalgs: Some(
                "ECDSA+SHA256:RSA-PSS+SHA256:RSA+SHA256:\
                ECDSA+SHA384:RSA-PSS+SHA384:RSA+SHA384:\
                RSA-PSS+SHA512:RSA+SHA512"
                    .to_string(),
            ),
            root_certs_pem: Vec::new(),
            ca_file: None,
            verify_hostname: true,
        }
    }
}

impl TlsConfig {
    /// Trust an additional root certificate (PEM).
    pub fn with_root_certificate_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.root_certs_pem.push(pem.into());
        self
    }

    /// Trust the certificates in a PEM file.
    pub fn with_ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_file = Some(path.into());
        self
    }

    pub fn verify_hostname(mut self, verify: bool) -> Self {
        self.verify_hostname = verify;
        self
    }

    pub fn alpn_protos(mut self, protos: &[&str]) -> Self {
        self.alpn_protos = protos.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Apply this configuration to an SSL connector builder.
    pub fn apply_to_builder(&self, builder: &mut SslConnectorBuilder) -> Result<(), NetError> {
        if let Some(min) = self.min_version {
            builder
                .set_min_proto_version(Some(min))
                .map_err(ssl_config_error)?;
        }
        if let Some(max) = self.max_version {
            builder
                .set_max_proto_version(Some(max))
                .map_err(ssl_config_error)?;
        }

        if let Some(ciphers) = &self.cipher_list {
            builder.set_cipher_list(ciphers).map_err(ssl_config_error)?;
        }

        if !self.alpn_protos.is_empty() {
            let mut alpn_wire = Vec::new();
            for proto in &self.alpn_protos {
                if proto.is_empty() || proto.len() > 255 {
                    return Err(NetError::SslConfiguration(format!(
                        "invalid ALPN protocol {proto:?}"
                    )));
                }
                alpn_wire.push(proto.len() as u8);
                alpn_wire.extend_from_slice(proto.as_bytes());
            }
            builder.set_alpn_protos(&alpn_wire).map_err(ssl_config_error)?;
        }

        if let Some(sigalgs) = &self.sigalgs {
            builder.set_sigalgs_list(sigalgs).map_err(ssl_config_error)?;
        }

        if !self.curves.is_empty() {
            let curves_str = self.curves.join(":");
            builder
                .set_curves_list(&curves_str)
                .map_err(ssl_config_error)?;
        }

        for pem in &self.root_certs_pem {
            let cert = X509::from_pem(pem).map_err(ssl_config_error)?;
            builder
                .cert_store_mut()
                .add_cert(cert)
                .map_err(ssl_config_error)?;
        }

        if let Some(path) = &self.ca_file {
            builder.set_ca_file(path).map_err(|e| {
                NetError::SslConfiguration(format!("loading {}: {e}", path.display()))
            })?;
        }

        builder.set_verify(SslVerifyMode::PEER);

        Ok(())
    }

    /// Build a reusable client context with the default verifier.
    pub fn build(&self) -> Result<TlsContext, NetError> {
        let mut builder = SslConnector::builder(SslMethod::tls()).map_err(ssl_config_error)?;
        self.apply_to_builder(&mut builder)?;

        Ok(TlsContext {
            connector: builder.build(),
            verifier: Arc::new(DefaultVerifier),
            verify_hostname: self.verify_hostname,
        })
    }

    /// Check if SNI (Server Name Indication) should be set for this host.
    /// Per RFC 6066, SNI MUST NOT be set for raw IP addresses.
    pub fn should_set_sni(host: &str) -> bool {
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        host.parse::<std::net::IpAddr>().is_err()
    }
}

fn ssl_config_error(e: boring::error::ErrorStack) -> NetError {
    NetError::SslConfiguration(e.to_string())
}

/// Caller-supplied TLS context: a configured BoringSSL connector plus the
/// certificate verification hook. Cheap to clone and shareable between
/// fetches.
#[derive(Clone)]
pub struct TlsContext {
    connector: SslConnector,
    verifier: Arc<dyn VerifyCertificate>,
    verify_hostname: bool,
}

impl TlsContext {
    /// Context with [`TlsConfig::default`] and the default verifier.
    pub fn new() -> Result<Self, NetError> {
        TlsConfig::default().build()
    }

    /// Replace the certificate verification hook.
    pub fn with_verifier<V: VerifyCertificate>(mut self, verifier: V) -> Self {
        self.verifier = Arc::new(verifier);
        self
    }

    /// Upgrade `stream` to TLS, verifying the peer as `host`.
    ///
    /// The verification hook runs once per certificate in the chain; the
    /// first rejected certificate is reported in the error.
    pub async fn handshake<S>(&self, host: &str, stream: S) -> Result<SslStream<S>, NetError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + fmt::Debug,
    {
        let mut config = self.connector.configure().map_err(ssl_config_error)?;
        config.set_use_server_name_indication(TlsConfig::should_set_sni(host));
        config.set_verify_hostname(self.verify_hostname);

        let rejected: Arc<Mutex<Option<String>>> = Arc::default();
        let slot = rejected.clone();
        let verifier = self.verifier.clone();
        config.set_verify_callback(SslVerifyMode::PEER, move |preverified, ctx| {
            let cert = CertificateInfo::from_store_context(ctx);
            let accepted = verifier.verify(preverified, &cert);
            if !accepted {
                tracing::debug!(certificate = %cert, "certificate rejected");
                if let Ok(mut slot) = slot.lock() {
                    slot.get_or_insert_with(|| cert.subject().to_string());
                }
            }
            accepted
        });

        match tokio_boring::connect(config, host, stream).await {
            Ok(stream) => Ok(stream),
            Err(e) => {
                let subject = rejected.lock().ok().and_then(|mut slot| slot.take());
                tracing::debug!(host = %host, error = %e, "SSL handshake failed");
                Err(match subject {
                    Some(subject) => NetError::CertificateRejected {
                        host: host.to_string(),
                        subject,
                        reason: e.to_string(),
                    },
                    None => NetError::SslHandshakeFailed {
                        host: host.to_string(),
                        reason: e.to_string(),
                    },
                })
            }
        }
    }
}

impl fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsContext")
            .field("verify_hostname", &self.verify_hostname)
            .finish_non_exhaustive()
    }
}
