//! Loopback TLS server for end-to-end tests.
//!
//! Issues a throwaway CA and a `localhost` leaf at startup, accepts TLS
//! connections on 127.0.0.1 and answers every request with a canned
//! response followed by close_notify.

#![allow(dead_code)]

use boring::asn1::Asn1Time;
use boring::bn::{BigNum, MsbOption};
use boring::ec::{EcGroup, EcKey};
use boring::hash::MessageDigest;
use boring::nid::Nid;
use boring::pkey::{PKey, Private};
use boring::ssl::{SslAcceptor, SslMethod};
use boring::x509::extension::{BasicConstraints, SubjectAlternativeName};
use boring::x509::{X509Name, X509NameBuilder, X509};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tlsfetch::dns::{DnsResolverWithOverrides, GaiResolver, Resolve};
use tlsfetch::{TlsConfig, TlsContext};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const HOST: &str = "localhost";

fn ec_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

fn name(cn: &str) -> X509Name {
    let mut builder = X509NameBuilder::new().unwrap();
    builder.append_entry_by_nid(Nid::ORGANIZATIONNAME, "tlsfetch tests").unwrap();
    builder.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    builder.build()
}

fn serial() -> boring::asn1::Asn1Integer {
    let mut serial = BigNum::new().unwrap();
    serial.rand(63, MsbOption::MAYBE_ZERO, false).unwrap();
    serial.to_asn1_integer().unwrap()
}

/// A CA and a leaf certificate for `localhost` issued by it.
pub struct Identity {
    pub ca: X509,
    pub leaf: X509,
    pub leaf_key: PKey<Private>,
}

impl Identity {
    pub fn generate() -> Self {
        let ca_key = ec_key();
        let ca_name = name("tlsfetch test root");

        let mut ca = X509::builder().unwrap();
        ca.set_version(2).unwrap();
        ca.set_serial_number(&serial()).unwrap();
        ca.set_subject_name(&ca_name).unwrap();
        ca.set_issuer_name(&ca_name).unwrap();
        ca.set_pubkey(&ca_key).unwrap();
        ca.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
        ca.set_not_after(&Asn1Time::days_from_now(2).unwrap()).unwrap();
        ca.append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
        ca.sign(&ca_key, MessageDigest::sha256()).unwrap();
        let ca = ca.build();

        let leaf_key = ec_key();
        let mut leaf = X509::builder().unwrap();
        leaf.set_version(2).unwrap();
        leaf.set_serial_number(&serial()).unwrap();
        leaf.set_subject_name(&name(HOST)).unwrap();
        leaf.set_issuer_name(ca.subject_name()).unwrap();
        leaf.set_pubkey(&leaf_key).unwrap();
        leaf.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
        leaf.set_not_after(&Asn1Time::days_from_now(2).unwrap()).unwrap();
        let san = SubjectAlternativeName::new()
            .dns(HOST)
            .build(&leaf.x509v3_context(Some(&*ca), None))
            .unwrap();
        leaf.append_extension(san).unwrap();
        leaf.sign(&ca_key, MessageDigest::sha256()).unwrap();

        Self {
            ca,
            leaf: leaf.build(),
            leaf_key,
        }
    }

    pub fn ca_pem(&self) -> Vec<u8> {
        self.ca.to_pem().unwrap()
    }

    /// Client context that trusts this identity's CA.
    pub fn trusting_client(&self) -> TlsContext {
        TlsConfig::default()
            .with_root_certificate_pem(self.ca_pem())
            .build()
            .unwrap()
    }

    fn acceptor(&self) -> SslAcceptor {
        let mut builder = SslAcceptor::mozilla_intermediate(SslMethod::tls()).unwrap();
        builder.set_private_key(&self.leaf_key).unwrap();
        builder.set_certificate(&self.leaf).unwrap();
        builder.add_extra_chain_cert(self.ca.clone()).unwrap();
        builder.check_private_key().unwrap();
        builder.build()
    }
}

/// What the server does after reading a request.
#[derive(Clone)]
pub enum Reply {
    /// Write these bytes, then close with close_notify.
    Respond(Vec<u8>),
    /// Write these bytes, then hold the connection open until the client
    /// closes it.
    Stall(Vec<u8>),
}

impl Reply {
    pub fn ok(body: &str) -> Self {
        Reply::Respond(
            format!("HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\n{body}").into_bytes(),
        )
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    /// Raw request heads received, one per completed handshake.
    pub requests: Arc<Mutex<Vec<Vec<u8>>>>,
    /// Stalled connections the client has since closed.
    closed: Arc<AtomicUsize>,
}

impl TestServer {
    pub async fn start(identity: &Identity, reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let acceptor = Arc::new(identity.acceptor());
        let requests: Arc<Mutex<Vec<Vec<u8>>>> = Arc::default();
        let closed: Arc<AtomicUsize> = Arc::default();

        let seen = requests.clone();
        let disconnects = closed.clone();
        tokio::spawn(async move {
            loop {
                let Ok((tcp, _)) = listener.accept().await else {
                    return;
                };
                let acceptor = acceptor.clone();
                let seen = seen.clone();
                let disconnects = disconnects.clone();
                let reply = reply.clone();
                tokio::spawn(async move {
                    let Ok(mut tls) = tokio_boring::accept(&acceptor, tcp).await else {
                        return;
                    };

                    let mut head = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !head.ends_with(b"\r\n\r\n") {
                        match tls.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => head.extend_from_slice(&buf[..n]),
                        }
                    }
                    seen.lock().unwrap().push(head);

                    match reply {
                        Reply::Respond(bytes) => {
                            let _ = tls.write_all(&bytes).await;
                            let _ = tls.shutdown().await;
                        }
                        Reply::Stall(bytes) => {
                            let _ = tls.write_all(&bytes).await;
                            let _ = tls.flush().await;
                            let mut sink = [0u8; 64];
                            while let Ok(n) = tls.read(&mut sink).await {
                                if n == 0 {
                                    break;
                                }
                            }
                            disconnects.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        Self {
            addr,
            requests,
            closed,
        }
    }

    pub fn port(&self) -> String {
        self.addr.port().to_string()
    }

    /// Resolver that maps [`HOST`] to this server.
    pub fn resolver(&self) -> Arc<dyn Resolve> {
        Arc::new(
            DnsResolverWithOverrides::new(Arc::new(GaiResolver::new()))
                .with_override(HOST, [self.addr.ip()]),
        )
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn closed_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}
