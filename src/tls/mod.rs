//! Certificate verification.

pub mod verify;

pub use verify::{CertificateInfo, DefaultVerifier, VerifyCertificate};
