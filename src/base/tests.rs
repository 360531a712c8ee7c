use crate::base::loadstate::FetchState;
use crate::base::neterror::{ErrorKind, NetError};
use std::io;

#[test]
fn test_error_kinds() {
    let dns = NetError::dns_failed("example.com", "https", io::Error::other("nx"));
    assert_eq!(dns.kind(), ErrorKind::ResolutionFailed);
    assert_eq!(dns.as_i32(), -105);

    let connect = NetError::connection_failed_to("example.com", 2, None);
    assert_eq!(connect.kind(), ErrorKind::ConnectFailed);
    assert_eq!(connect.to_string(), "Connection to example.com failed after 2 attempt(s)");

    let rejected = NetError::CertificateRejected {
        host: "example.com".into(),
        subject: "CN=evil".into(),
        reason: "certificate verify failed".into(),
    };
    assert_eq!(rejected.kind(), ErrorKind::HandshakeFailed);
    assert_eq!(
        rejected.to_string(),
        "Certificate rejected: CN=evil (certificate verify failed)"
    );

    assert_eq!(NetError::EmptyResponse.kind(), ErrorKind::ProtocolViolation);
    assert_eq!(
        NetError::ResponseBodyTooBig { limit: 1 }.kind(),
        ErrorKind::ResponseTooLarge
    );
}

#[test]
fn test_interrupted() {
    let aborted = NetError::Aborted { stage: FetchState::Connecting };
    assert_eq!(aborted.kind(), ErrorKind::Cancelled);
    assert!(aborted.is_interrupted());

    let timed_out = NetError::TimedOut { stage: FetchState::ReadingBody };
    assert_eq!(timed_out.kind(), ErrorKind::TimedOut);
    assert_eq!(timed_out.as_i32(), -7);
    assert!(timed_out.is_interrupted());

    assert!(!NetError::EmptyResponse.is_interrupted());
}

#[test]
fn test_error_is_clone_with_source() {
    use std::error::Error;

    let err = NetError::read_failed(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
    let copy = err.clone();
    assert_eq!(copy.kind(), ErrorKind::TransportRead);
    assert!(copy.source().is_some());
}

#[test]
fn test_state_ordering() {
    use FetchState::*;

    assert!(Idle.can_advance_to(Resolving));
    assert!(Resolving.can_advance_to(Connecting));
    assert!(ReadingHeaders.can_advance_to(ReadingBody));
    assert!(ReadingBody.can_advance_to(Completed));

    // Monotonic: never back to an earlier stage.
    assert!(!Writing.can_advance_to(Handshaking));
    assert!(!ReadingBody.can_advance_to(ReadingBody));

    // Failed from anywhere non-terminal, nothing out of terminal states.
    assert!(Idle.can_advance_to(Failed));
    assert!(ReadingStatusLine.can_advance_to(Failed));
    assert!(!Completed.can_advance_to(Failed));
    assert!(!Failed.can_advance_to(Completed));
}
