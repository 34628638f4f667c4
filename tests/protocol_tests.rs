//! Wire convention and response assembly tests.

use paisley::protocol::*;
use paisley::response::{wants_utf8, Body, ResponseAssembler, StreamEnd};
use paisley::Error;

#[test]
fn test_protocol_constants() {
  assert_eq!(USER_AGENT, "paisley");
  assert_eq!(DEFAULT_PORT, 5984);
  assert_eq!(SESSION_WINDOW.as_secs(), 300);
  assert_eq!(KEEPALIVE_INTERVAL.as_secs(), 150);
}

#[test]
fn test_status_classification() {
  assert_eq!(classify(200, b"{}"), Outcome::Success);
  assert_eq!(classify(202, b"{}"), Outcome::Success);
  assert_eq!(classify(302, b""), Outcome::Redirect);
  assert_eq!(classify(304, b""), Outcome::Redirect);
  assert_eq!(classify(401, b"whatever"), Outcome::Unauthorized);
  assert_eq!(
    classify(404, br#"{"error":"unauthorized"}"#),
    Outcome::Unauthorized
  );
  assert_eq!(classify(404, br#"{"error":"not_found"}"#), Outcome::Failure);
  assert_eq!(classify(403, br#"{"error":"unauthorized"}"#), Outcome::Failure);
  assert_eq!(classify(503, b""), Outcome::Failure);
}

#[test]
fn test_name_quoting() {
  assert_eq!(quote_name("test"), "test");
  assert_eq!(quote_name("a/b$c"), "a%2Fb%24c");
  assert_eq!(doc_segment("_design/x"), "_design/x");
  assert_eq!(doc_segment("über/x"), "%C3%BCber%2Fx");
}

#[test]
fn test_server_version() {
  assert_eq!(ServerVersion::default(), ServerVersion::new(1, 0, 1));
  assert_eq!(ServerVersion::parse("3.3.2"), ServerVersion::new(3, 3, 2));
  assert_eq!(ServerVersion::new(1, 2, 3).to_string(), "1.2.3");

  let v = ServerVersion::parse("");
  assert_eq!(v.major, None);
}

#[test]
fn test_assemble_straddling_chunks() {
  let bytes = "Héllo".as_bytes();
  let mut asm = ResponseAssembler::new(true);
  asm.push(&bytes[..2]).unwrap();
  asm.push(&bytes[2..]).unwrap();
  asm.push(b"").unwrap();
  assert_eq!(
    asm.finish(StreamEnd::Complete).unwrap(),
    Body::Text("Héllo".to_string())
  );
}

#[test]
fn test_assemble_opaque() {
  let bytes = "Héllo".as_bytes();
  let mut asm = ResponseAssembler::new(false);
  asm.push(&bytes[..2]).unwrap();
  asm.push(&bytes[2..]).unwrap();
  let body = asm.finish(StreamEnd::Complete).unwrap();
  assert_eq!(body.as_bytes(), bytes);
  assert_eq!(body.len(), bytes.len());
  assert!(!body.is_empty());
}

#[test]
fn test_assemble_failure_propagates() {
  let asm = ResponseAssembler::new(true);
  let err = asm
    .finish(StreamEnd::Failed(Error::Decode("connection reset".to_string())))
    .unwrap_err();
  assert!(matches!(err, Error::Decode(_)));
}

#[test]
fn test_decoding_decision() {
  assert!(wants_utf8("application/json"));
  assert!(wants_utf8("text/html; charset=utf-8"));
  assert!(!wants_utf8("application/json; charset=iso-8859-1"));
  assert!(!wants_utf8("application/octet-stream"));
}
