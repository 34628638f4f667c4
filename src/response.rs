//! Assembles a streamed HTTP response body into a single payload.

use std::borrow::Cow;

use crate::error::{Error, Result};

/// How a response body stream ended
#[derive(Debug)]
pub enum StreamEnd {
  /// The body was fully received
  Complete,
  /// The connection closed without a length to check against; whatever
  /// arrived is accepted as the body
  PotentialDataLoss,
  /// The stream failed
  Failed(Error),
}

/// A fully assembled response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
  /// Decoded UTF-8 text
  Text(String),
  /// Undecoded bytes, concatenated as received
  Bytes(Vec<u8>),
}

impl Body {
  pub fn as_bytes(&self) -> &[u8] {
    match self {
      Body::Text(s) => s.as_bytes(),
      Body::Bytes(b) => b,
    }
  }

  pub fn into_bytes(self) -> Vec<u8> {
    match self {
      Body::Text(s) => s.into_bytes(),
      Body::Bytes(b) => b,
    }
  }

  /// Text view of the body; undecoded payloads are converted lossily.
  pub fn text(&self) -> Cow<'_, str> {
    match self {
      Body::Text(s) => Cow::Borrowed(s),
      Body::Bytes(b) => String::from_utf8_lossy(b),
    }
  }

  pub fn len(&self) -> usize {
    self.as_bytes().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Whether a response with this `Content-Type` should be decoded as UTF-8.
pub fn wants_utf8(content_type: &str) -> bool {
  let content_type = content_type.trim().to_ascii_lowercase();
  content_type.contains("charset=utf-8") || content_type == "application/json"
}

/// Collects the chunks of one response body.
///
/// With decoding enabled, a multi-byte sequence split across two chunks is
/// held back until the rest of it arrives. One assembler serves exactly one
/// response: `finish` consumes it.
#[derive(Debug)]
pub struct ResponseAssembler {
  decode_utf8: bool,
  text: String,
  raw: Vec<u8>,
  pending: Vec<u8>,
}

impl ResponseAssembler {
  pub fn new(decode_utf8: bool) -> Self {
    Self {
      decode_utf8,
      text: String::new(),
      raw: Vec::new(),
      pending: Vec::new(),
    }
  }

  /// Feed the next chunk of the body.
  pub fn push(&mut self, chunk: &[u8]) -> Result<()> {
    if !self.decode_utf8 {
      self.raw.extend_from_slice(chunk);
      return Ok(());
    }
    self.pending.extend_from_slice(chunk);
    self.decode(false)
  }

  /// Terminate the stream and produce the body.
  pub fn finish(mut self, end: StreamEnd) -> Result<Body> {
    match end {
      StreamEnd::Complete | StreamEnd::PotentialDataLoss => {
        if !self.decode_utf8 {
          return Ok(Body::Bytes(self.raw));
        }
        self.decode(true)?;
        Ok(Body::Text(self.text))
      }
      StreamEnd::Failed(e) => Err(e),
    }
  }

  fn decode(&mut self, last: bool) -> Result<()> {
    let valid = match std::str::from_utf8(&self.pending) {
      Ok(s) => {
        self.text.push_str(s);
        self.pending.len()
      }
      Err(e) => {
        let valid = e.valid_up_to();
        // valid_up_to is always a char boundary
        self.text.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
        if e.error_len().is_some() {
          return Err(Error::Decode(format!("invalid UTF-8 at byte {}", self.text.len())));
        }
        if last {
          return Err(Error::Decode("truncated UTF-8 sequence at end of body".to_string()));
        }
        valid
      }
    };
    self.pending.drain(..valid);
    Ok(())
  }
}
